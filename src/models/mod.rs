//! Data models for the Fleetkeeper client

pub mod asset;
pub mod audit;
pub mod inventory;
pub mod photo;
pub mod schedule;

pub use asset::{
    AssetRecord, AssetStatus, CreateAsset, CreateMaintenanceEntry, HistoryEntry, ListField,
    MaintenanceEntry, StatusEntry, TransferEntry, UpdateAsset, UpdateMaintenanceEntry,
    VerificationEntry,
};
pub use audit::AuditEntry;
pub use inventory::{InventoryItem, InventoryTransaction};
pub use photo::{normalize_photo_set, promote_primary, MAX_PHOTOS};
pub use schedule::{MaintenanceSchedule, RepeatMode, ScheduleRule, VerificationSchedule};
