//! Maintenance scheduling models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Repeat mode stored on an asset's scheduling sub-record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatMode {
    #[default]
    None,
    MonthlyWeekday,
}

/// Recurrence rule derived from a scheduling sub-record
///
/// Either no recurrence (the literal next date is authoritative) or the
/// K-th occurrence of a weekday in every month. The server-held rule is
/// always authoritative; rules are never merged across cache and server.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ScheduleRule {
    #[default]
    None,
    /// `week` in 1..=5, `weekday` in 0..=6 with Sunday = 0
    MonthlyWeekday { week: u8, weekday: u8 },
}

impl ScheduleRule {
    /// Whether the rule's parameters are within their documented ranges
    pub fn is_valid(&self) -> bool {
        match self {
            ScheduleRule::None => true,
            ScheduleRule::MonthlyWeekday { week, weekday } => {
                (1..=5).contains(week) && *weekday <= 6
            }
        }
    }
}

/// Maintenance scheduling sub-record of an asset
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MaintenanceSchedule {
    /// Next due date; authoritative when the repeat mode is `None`
    pub next_date: Option<NaiveDate>,
    pub repeat: RepeatMode,
    /// K-th occurrence within the month (1..=5), for `MonthlyWeekday`
    pub repeat_week: Option<u8>,
    /// Weekday (0..=6, Sunday = 0), for `MonthlyWeekday`
    pub repeat_weekday: Option<u8>,
    pub note: Option<String>,
}

impl MaintenanceSchedule {
    /// Derive the recurrence rule from the repeat mode and parameters.
    /// A `MonthlyWeekday` mode with missing parameters degrades to `None`
    /// rather than erroring.
    pub fn rule(&self) -> ScheduleRule {
        match self.repeat {
            RepeatMode::None => ScheduleRule::None,
            RepeatMode::MonthlyWeekday => match (self.repeat_week, self.repeat_weekday) {
                (Some(week), Some(weekday)) => ScheduleRule::MonthlyWeekday { week, weekday },
                _ => ScheduleRule::None,
            },
        }
    }
}

/// Verification scheduling sub-record of an asset
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VerificationSchedule {
    pub next_date: Option<NaiveDate>,
    /// Verification frequency in months
    pub frequency_months: Option<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_validity() {
        assert!(ScheduleRule::None.is_valid());
        assert!(ScheduleRule::MonthlyWeekday { week: 1, weekday: 6 }.is_valid());
        assert!(!ScheduleRule::MonthlyWeekday { week: 0, weekday: 3 }.is_valid());
        assert!(!ScheduleRule::MonthlyWeekday { week: 6, weekday: 3 }.is_valid());
        assert!(!ScheduleRule::MonthlyWeekday { week: 2, weekday: 7 }.is_valid());
    }

    #[test]
    fn test_rule_derivation() {
        let mut sched = MaintenanceSchedule {
            repeat: RepeatMode::MonthlyWeekday,
            repeat_week: Some(2),
            repeat_weekday: Some(4),
            ..Default::default()
        };
        assert_eq!(sched.rule(), ScheduleRule::MonthlyWeekday { week: 2, weekday: 4 });

        sched.repeat_weekday = None;
        assert_eq!(sched.rule(), ScheduleRule::None);
    }

    #[test]
    fn test_schedule_tolerates_missing_fields() {
        let sched: MaintenanceSchedule = serde_json::from_str("{}").unwrap();
        assert_eq!(sched.repeat, RepeatMode::None);
        assert_eq!(sched.next_date, None);
    }
}
