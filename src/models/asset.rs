//! Asset record model
//!
//! The unit of reconciliation. A record is addressed for merge purposes by
//! the pair of its server-assigned numeric id and its human-readable asset
//! code; the code alone is not guaranteed unique across a race between a
//! local fallback creation and a server assignment.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::photo::normalize_photo_set;
use super::schedule::{MaintenanceSchedule, VerificationSchedule};

// ---------------------------------------------------------------------------
// ListField
// ---------------------------------------------------------------------------

/// A sub-collection that distinguishes "field absent from the payload"
/// from "field present and empty".
///
/// The merge rules depend on this distinction: an omitted history list
/// means the endpoint simply does not ship history, while an explicitly
/// empty list means the server authoritatively says there is none. Plain
/// `Vec` loses that information across a serde round-trip.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ListField<T> {
    #[default]
    Omitted,
    Present(Vec<T>),
}

impl<T> ListField<T> {
    pub fn is_omitted(&self) -> bool {
        matches!(self, ListField::Omitted)
    }

    /// Entries of the list; empty slice when omitted
    pub fn as_slice(&self) -> &[T] {
        match self {
            ListField::Omitted => &[],
            ListField::Present(v) => v.as_slice(),
        }
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    /// Mutable access, promoting an omitted field to an empty present list
    pub fn to_mut(&mut self) -> &mut Vec<T> {
        if self.is_omitted() {
            *self = ListField::Present(Vec::new());
        }
        match self {
            ListField::Present(v) => v,
            ListField::Omitted => unreachable!(),
        }
    }
}

impl<T> From<Vec<T>> for ListField<T> {
    fn from(v: Vec<T>) -> Self {
        ListField::Present(v)
    }
}

impl<T: Serialize> Serialize for ListField<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ListField::Omitted => serializer.serialize_none(),
            ListField::Present(v) => v.serialize(serializer),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for ListField<T> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // null counts as absent, not as an empty list
        let opt = Option::<Vec<T>>::deserialize(deserializer)?;
        Ok(match opt {
            Some(v) => ListField::Present(v),
            None => ListField::Omitted,
        })
    }
}

// ---------------------------------------------------------------------------
// History entries
// ---------------------------------------------------------------------------

/// Common surface of the four history entry kinds, used by the merge and
/// cache-tier code
pub trait HistoryEntry: Clone {
    /// Entry identity, the merge key within its list
    fn entry_id(&self) -> i64;
    /// Embedded image reference, for the kinds that carry one
    fn photo_ref(&self) -> Option<&str> {
        None
    }
    fn set_photo_ref(&mut self, _r: Option<String>) {}
}

/// A completed or planned maintenance intervention
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MaintenanceEntry {
    pub id: i64,
    pub date: Option<NaiveDate>,
    /// Work performed or planned
    pub work: Option<String>,
    pub completed: bool,
    /// Embedded image reference (data URL or object key)
    pub photo: Option<String>,
    pub note: Option<String>,
}

/// A periodic verification check
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VerificationEntry {
    pub id: i64,
    pub date: Option<NaiveDate>,
    /// Observed condition
    pub condition: Option<String>,
    pub photo: Option<String>,
}

/// A location/assignment transfer
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransferEntry {
    pub id: i64,
    pub date: Option<NaiveDate>,
    pub from_location: Option<String>,
    pub to_location: Option<String>,
    pub note: Option<String>,
}

/// A status change
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatusEntry {
    pub id: i64,
    pub date: Option<NaiveDate>,
    pub status: AssetStatus,
    pub note: Option<String>,
}

impl HistoryEntry for MaintenanceEntry {
    fn entry_id(&self) -> i64 {
        self.id
    }
    fn photo_ref(&self) -> Option<&str> {
        self.photo.as_deref()
    }
    fn set_photo_ref(&mut self, r: Option<String>) {
        self.photo = r;
    }
}

impl HistoryEntry for VerificationEntry {
    fn entry_id(&self) -> i64 {
        self.id
    }
    fn photo_ref(&self) -> Option<&str> {
        self.photo.as_deref()
    }
    fn set_photo_ref(&mut self, r: Option<String>) {
        self.photo = r;
    }
}

impl HistoryEntry for TransferEntry {
    fn entry_id(&self) -> i64 {
        self.id
    }
}

impl HistoryEntry for StatusEntry {
    fn entry_id(&self) -> i64 {
        self.id
    }
}

// ---------------------------------------------------------------------------
// AssetRecord
// ---------------------------------------------------------------------------

/// Asset lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetStatus {
    #[default]
    InService,
    InRepair,
    InStorage,
    Retired,
    Missing,
}

/// One tracked physical item and its full lifecycle state
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssetRecord {
    /// Server-assigned numeric identity; negative for local fallback records
    pub id: i64,
    /// Business identifier (campus+category+type+sequence encoded string)
    pub asset_code: String,
    pub campus: String,
    pub category: String,
    pub asset_type: String,
    /// PC sub-type, for the computer category
    pub pc_subtype: Option<String>,
    pub location: Option<String>,
    pub assigned_to: Option<String>,
    pub status: AssetStatus,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub specs: Option<String>,
    pub notes: Option<String>,
    pub vendor: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub warranty_until: Option<NaiveDate>,
    /// Legacy single photo field; always the primary reference
    pub photo: Option<String>,
    /// Photo gallery, normalized together with `photo`
    pub gallery: Vec<String>,
    pub schedule: MaintenanceSchedule,
    pub verification: VerificationSchedule,
    #[serde(skip_serializing_if = "ListField::is_omitted")]
    pub maintenance_history: ListField<MaintenanceEntry>,
    #[serde(skip_serializing_if = "ListField::is_omitted")]
    pub verification_history: ListField<VerificationEntry>,
    #[serde(skip_serializing_if = "ListField::is_omitted")]
    pub transfer_history: ListField<TransferEntry>,
    #[serde(skip_serializing_if = "ListField::is_omitted")]
    pub status_history: ListField<StatusEntry>,
}

impl AssetRecord {
    /// Key used by the reconciliation map
    pub fn merge_key(&self) -> (String, i64) {
        (self.asset_code.clone(), self.id)
    }

    /// Normalized photo set (primary first, deduplicated, capped)
    pub fn photo_set(&self) -> Vec<String> {
        normalize_photo_set(self.photo.as_deref(), &self.gallery)
    }

    /// Whether this record was created by a local fallback write and has
    /// not yet received a server identity
    pub fn is_local_only(&self) -> bool {
        self.id < 0
    }
}

/// Create asset request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateAsset {
    pub campus: String,
    pub category: String,
    pub asset_type: String,
    pub pc_subtype: Option<String>,
    pub location: Option<String>,
    pub assigned_to: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub specs: Option<String>,
    pub notes: Option<String>,
    pub vendor: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub warranty_until: Option<NaiveDate>,
    pub photo: Option<String>,
    pub gallery: Vec<String>,
}

/// Update asset request; only supplied fields change
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateAsset {
    pub campus: Option<String>,
    pub category: Option<String>,
    pub asset_type: Option<String>,
    pub pc_subtype: Option<String>,
    pub location: Option<String>,
    pub assigned_to: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub specs: Option<String>,
    pub notes: Option<String>,
    pub vendor: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub warranty_until: Option<NaiveDate>,
    pub photo: Option<String>,
    pub gallery: Option<Vec<String>>,
    pub schedule: Option<MaintenanceSchedule>,
    pub verification: Option<VerificationSchedule>,
}

/// Create maintenance history entry request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateMaintenanceEntry {
    pub date: Option<NaiveDate>,
    pub work: Option<String>,
    pub completed: bool,
    pub photo: Option<String>,
    pub note: Option<String>,
}

/// Update maintenance history entry request; only supplied fields change
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateMaintenanceEntry {
    pub date: Option<NaiveDate>,
    pub work: Option<String>,
    pub completed: Option<bool>,
    pub photo: Option<String>,
    pub note: Option<String>,
}
