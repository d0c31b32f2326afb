//! Recurrence resolution
//!
//! Turns a schedule rule into concrete occurrence dates for calendars and
//! due/overdue alerts. Total over misconfigured rules: an impossible or
//! out-of-range rule yields no date, never a panic, because this runs on
//! every view refresh.

use chrono::{Datelike, Days, NaiveDate};

use crate::models::asset::AssetRecord;
use crate::models::schedule::ScheduleRule;

/// How many months ahead a monthly-weekday rule is searched before giving
/// up. An arbitrary but guaranteed-terminating bound, cheap enough to run
/// many times per calendar render.
pub const DEFAULT_SEARCH_HORIZON_MONTHS: u32 = 24;

/// Earliest occurrence of `rule` on or after `reference`.
///
/// For [`ScheduleRule::None`] the literal configured date is returned
/// unchanged, even when it lies in the past (that is what overdue
/// detection keys on).
pub fn next_occurrence(
    rule: &ScheduleRule,
    configured: Option<NaiveDate>,
    reference: NaiveDate,
    horizon_months: u32,
) -> Option<NaiveDate> {
    match rule {
        ScheduleRule::None => configured,
        ScheduleRule::MonthlyWeekday { week, weekday } => {
            if !rule.is_valid() {
                return None;
            }
            for offset in 0..horizon_months {
                let (year, month) = add_months(reference.year(), reference.month(), offset);
                if let Some(date) = nth_weekday_of_month(year, month, *week, *weekday) {
                    if date >= reference {
                        return Some(date);
                    }
                }
            }
            None
        }
    }
}

/// The K-th occurrence of a weekday within a month, or `None` when the
/// month has no K-th occurrence (e.g. a fifth Saturday)
pub fn nth_weekday_of_month(year: i32, month: u32, week: u8, weekday: u8) -> Option<NaiveDate> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let first_weekday = first.weekday().num_days_from_sunday();
    let offset = (u32::from(weekday) + 7 - first_weekday) % 7;
    let day = 1 + offset + (u32::from(week) - 1) * 7;
    // from_ymd_opt rejects day numbers past the month's end
    NaiveDate::from_ymd_opt(year, month, day)
}

fn add_months(year: i32, month: u32, delta: u32) -> (i32, u32) {
    let zero_based = (month - 1) + delta;
    (year + (zero_based / 12) as i32, zero_based % 12 + 1)
}

// ---------------------------------------------------------------------------
// Calendar materialization
// ---------------------------------------------------------------------------

/// A synthetic single-date calendar entry; recurring rules produce one per
/// occurrence without mutating the underlying rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEntry {
    pub asset_id: i64,
    pub asset_code: String,
    pub date: NaiveDate,
    pub note: Option<String>,
}

/// Enumerate every record whose rule resolves to dates inside the visible
/// grid window (both bounds inclusive), one entry per occurrence, ordered
/// by date then asset code
pub fn materialize_window(
    records: &[AssetRecord],
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> Vec<CalendarEntry> {
    let mut entries: Vec<CalendarEntry> = Vec::new();
    for record in records {
        let note = record.schedule.note.clone();
        match record.schedule.rule() {
            ScheduleRule::None => {
                if let Some(date) = record.schedule.next_date {
                    if date >= window_start && date <= window_end {
                        entries.push(CalendarEntry {
                            asset_id: record.id,
                            asset_code: record.asset_code.clone(),
                            date,
                            note,
                        });
                    }
                }
            }
            rule @ ScheduleRule::MonthlyWeekday { week, weekday } => {
                if !rule.is_valid() {
                    continue;
                }
                let mut year = window_start.year();
                let mut month = window_start.month();
                loop {
                    let month_start = match NaiveDate::from_ymd_opt(year, month, 1) {
                        Some(d) => d,
                        None => break,
                    };
                    if month_start > window_end {
                        break;
                    }
                    if let Some(date) = nth_weekday_of_month(year, month, week, weekday) {
                        if date >= window_start && date <= window_end {
                            entries.push(CalendarEntry {
                                asset_id: record.id,
                                asset_code: record.asset_code.clone(),
                                date,
                                note: note.clone(),
                            });
                        }
                    }
                    (year, month) = add_months(year, month, 1);
                }
            }
        }
    }
    entries.sort_by(|a, b| a.date.cmp(&b.date).then(a.asset_code.cmp(&b.asset_code)));
    entries
}

// ---------------------------------------------------------------------------
// Due-date classification
// ---------------------------------------------------------------------------

/// Alert classification of a record's next maintenance date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueState {
    Overdue,
    DueSoon,
    Ok,
    /// No rule and no configured date, or a rule with no occurrence within
    /// the search horizon
    Unscheduled,
}

pub fn due_state(
    record: &AssetRecord,
    today: NaiveDate,
    due_soon_days: u32,
    horizon_months: u32,
) -> DueState {
    let next = next_occurrence(
        &record.schedule.rule(),
        record.schedule.next_date,
        today,
        horizon_months,
    );
    let Some(date) = next else {
        return DueState::Unscheduled;
    };
    if date < today {
        return DueState::Overdue;
    }
    let soon_limit = today
        .checked_add_days(Days::new(u64::from(due_soon_days)))
        .unwrap_or(today);
    if date <= soon_limit {
        DueState::DueSoon
    } else {
        DueState::Ok
    }
}
