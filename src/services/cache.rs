//! Tiered local cache
//!
//! Persists the working record set to bounded client storage. A quota
//! failure degrades the write through progressively lighter serialization
//! tiers instead of failing outright; if even the compact form does not
//! fit, the previously stored snapshot is left untouched. The caller is
//! never blocked or failed by a quota condition.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::models::asset::{AssetRecord, HistoryEntry, ListField};
use crate::models::{AuditEntry, InventoryTransaction};
use crate::storage::{keys, LocalStore, StorageError};

/// Gallery cap applied by the compact tier
pub const COMPACT_GALLERY_CAP: usize = 2;
/// Compact-tier cap for status and transfer history lists
pub const COMPACT_STATUS_TRANSFER_CAP: usize = 30;
/// Compact-tier cap for maintenance and verification history lists
pub const COMPACT_MAINT_VERIF_CAP: usize = 80;
/// Compact-tier cap on note fields of kept entries, in characters
pub const COMPACT_NOTE_CAP: usize = 500;
/// Compact-tier cap on verification condition text, in characters
pub const COMPACT_CONDITION_CAP: usize = 250;

/// Audit log ring buffer capacity
pub const AUDIT_LOG_CAP: usize = 500;
/// Inventory transaction list capacity
pub const INVENTORY_TRANSACTIONS_CAP: usize = 5000;

/// Read the cached asset snapshot. Malformed or missing data degrades to
/// an empty collection (cold start), never to an error.
pub fn read_snapshot(store: &LocalStore) -> Vec<AssetRecord> {
    let Some(raw) = store.get(keys::ASSETS) else {
        return Vec::new();
    };
    match serde_json::from_str(&raw) {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!(error = %e, "cached asset snapshot is malformed; starting cold");
            Vec::new()
        }
    }
}

/// Write the asset snapshot, degrading through the serialization tiers on
/// quota pressure. Exactly one of tiers 0..=2 is written, or no write
/// occurs at all and the previous snapshot survives.
pub fn write_snapshot(store: &mut LocalStore, records: &[AssetRecord]) {
    for tier in 0u8..=2 {
        let mut shaped = records.to_vec();
        if tier >= 1 {
            strip_history_photos(&mut shaped);
        }
        if tier >= 2 {
            compact(&mut shaped);
        }
        let raw = match serde_json::to_string(&shaped) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "asset snapshot did not serialize; not cached");
                return;
            }
        };
        match store.set(keys::ASSETS, &raw) {
            Ok(()) => {
                if tier > 0 {
                    tracing::warn!(tier, "asset snapshot cached in degraded form");
                }
                return;
            }
            Err(StorageError::QuotaExceeded) => continue,
            Err(e) => {
                tracing::warn!(error = %e, "asset snapshot write failed; not cached");
                return;
            }
        }
    }
    // Tier 3: the newest snapshot is not cached, but nothing previously
    // stored is deleted either.
    tracing::warn!("asset snapshot not cached: storage quota exhausted at every tier");
}

/// Tier 1: blank the embedded image reference on every maintenance and
/// verification history entry
fn strip_history_photos(records: &mut [AssetRecord]) {
    for record in records {
        if let ListField::Present(entries) = &mut record.maintenance_history {
            for entry in entries {
                entry.set_photo_ref(None);
            }
        }
        if let ListField::Present(entries) = &mut record.verification_history {
            for entry in entries {
                entry.set_photo_ref(None);
            }
        }
    }
}

/// Tier 2: cap the gallery, blank the heavy free-text fields, cap each
/// history list to its most recent entries and truncate the free text on
/// the entries that are kept
fn compact(records: &mut [AssetRecord]) {
    for record in records {
        record.gallery.truncate(COMPACT_GALLERY_CAP);
        record.specs = None;
        record.notes = None;
        cap_recent(&mut record.maintenance_history, COMPACT_MAINT_VERIF_CAP);
        cap_recent(&mut record.verification_history, COMPACT_MAINT_VERIF_CAP);
        cap_recent(&mut record.transfer_history, COMPACT_STATUS_TRANSFER_CAP);
        cap_recent(&mut record.status_history, COMPACT_STATUS_TRANSFER_CAP);
        if let ListField::Present(entries) = &mut record.maintenance_history {
            for entry in entries {
                truncate_chars(&mut entry.note, COMPACT_NOTE_CAP);
                truncate_chars(&mut entry.work, COMPACT_NOTE_CAP);
            }
        }
        if let ListField::Present(entries) = &mut record.verification_history {
            for entry in entries {
                truncate_chars(&mut entry.condition, COMPACT_CONDITION_CAP);
            }
        }
        if let ListField::Present(entries) = &mut record.transfer_history {
            for entry in entries {
                truncate_chars(&mut entry.note, COMPACT_NOTE_CAP);
            }
        }
        if let ListField::Present(entries) = &mut record.status_history {
            for entry in entries {
                truncate_chars(&mut entry.note, COMPACT_NOTE_CAP);
            }
        }
    }
}

/// Keep only the most recent `cap` entries of an append-only list
fn cap_recent<T>(list: &mut ListField<T>, cap: usize) {
    if let ListField::Present(entries) = list {
        if entries.len() > cap {
            entries.drain(..entries.len() - cap);
        }
    }
}

fn truncate_chars(text: &mut Option<String>, cap: usize) {
    if let Some(s) = text {
        if s.chars().count() > cap {
            *s = s.chars().take(cap).collect();
        }
    }
}

// ---------------------------------------------------------------------------
// Plain blobs (no embedded images): these degrade only by the catch-all
// "skip the write and warn"
// ---------------------------------------------------------------------------

/// Persist a plain blob; quota or serialization trouble skips the write
/// with a background warning and never surfaces to the caller
pub fn put_blob<T: Serialize>(store: &mut LocalStore, key: &str, value: &T) {
    let raw = match serde_json::to_string(value) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(key, error = %e, "blob did not serialize; not cached");
            return;
        }
    };
    if let Err(e) = store.set(key, &raw) {
        tracing::warn!(key, error = %e, "blob write skipped");
    }
}

/// Read a plain blob; malformed or missing data degrades to the default
pub fn get_blob<T: DeserializeOwned + Default>(store: &LocalStore, key: &str) -> T {
    let Some(raw) = store.get(key) else {
        return T::default();
    };
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(key, error = %e, "cached blob is malformed; using default");
            T::default()
        }
    }
}

/// Append to the audit log ring buffer, evicting the oldest entries past
/// the cap
pub fn push_audit(store: &mut LocalStore, entry: AuditEntry) {
    let mut log: Vec<AuditEntry> = get_blob(store, keys::AUDIT_LOG);
    log.push(entry);
    if log.len() > AUDIT_LOG_CAP {
        log.drain(..log.len() - AUDIT_LOG_CAP);
    }
    put_blob(store, keys::AUDIT_LOG, &log);
}

/// Append an inventory transaction, keeping only the most recent entries
pub fn push_inventory_transaction(store: &mut LocalStore, tx: InventoryTransaction) {
    let mut list: Vec<InventoryTransaction> = get_blob(store, keys::INVENTORY_TRANSACTIONS);
    list.push(tx);
    if list.len() > INVENTORY_TRANSACTIONS_CAP {
        list.drain(..list.len() - INVENTORY_TRANSACTIONS_CAP);
    }
    put_blob(store, keys::INVENTORY_TRANSACTIONS, &list);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::asset::MaintenanceEntry;
    use crate::storage::MemoryStorage;

    fn record_with_history(photo_bytes: usize) -> AssetRecord {
        AssetRecord {
            id: 1,
            asset_code: "MAIN-IT-PC-001".into(),
            maintenance_history: vec![MaintenanceEntry {
                id: 10,
                photo: Some("x".repeat(photo_bytes)),
                note: Some("cleaned fans".into()),
                ..Default::default()
            }]
            .into(),
            ..Default::default()
        }
    }

    fn store_with_quota(bytes: usize) -> LocalStore {
        LocalStore::new(Box::new(MemoryStorage::new(Some(bytes))))
    }

    #[test]
    fn test_tier0_written_when_it_fits() {
        let mut store = LocalStore::in_memory();
        let records = vec![record_with_history(100)];
        write_snapshot(&mut store, &records);
        let back = read_snapshot(&store);
        assert_eq!(back, records);
    }

    #[test]
    fn test_tier1_strips_history_photos() {
        // Large embedded photo pushes tier 0 over quota; the stripped form fits
        let mut store = store_with_quota(4_000);
        let records = vec![record_with_history(8_000)];
        write_snapshot(&mut store, &records);
        let back = read_snapshot(&store);
        assert_eq!(back.len(), 1);
        let history = back[0].maintenance_history.as_slice();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].photo, None);
        // The rest of the entry survives
        assert_eq!(history[0].note.as_deref(), Some("cleaned fans"));
    }

    #[test]
    fn test_tier2_compacts() {
        let mut record = record_with_history(8_000);
        record.specs = Some("s".repeat(3_000));
        record.notes = Some("n".repeat(3_000));
        record.gallery = (0..5).map(|i| format!("photo-{i}")).collect();
        for i in 0..40 {
            record.status_history.to_mut().push(crate::models::StatusEntry {
                id: i,
                ..Default::default()
            });
        }
        let mut store = store_with_quota(6_000);
        write_snapshot(&mut store, &[record]);
        let back = read_snapshot(&store);
        assert_eq!(back.len(), 1);
        assert_eq!(back[0].specs, None);
        assert_eq!(back[0].notes, None);
        assert_eq!(back[0].gallery.len(), COMPACT_GALLERY_CAP);
        // Most recent status entries kept
        let status = back[0].status_history.as_slice();
        assert_eq!(status.len(), COMPACT_STATUS_TRANSFER_CAP);
        assert_eq!(status[0].id, 10);
        assert_eq!(status.last().unwrap().id, 39);
    }

    #[test]
    fn test_quota_never_destroys_previous_snapshot() {
        let mut store = store_with_quota(2_000);
        let small = vec![record_with_history(10)];
        write_snapshot(&mut store, &small);
        let stored_before = store.get(keys::ASSETS).unwrap();

        // Even the compact form of this snapshot cannot fit: the gallery
        // survives tier 2 at two entries and each entry is huge
        let mut huge = record_with_history(10);
        huge.gallery = vec!["g".repeat(5_000), "h".repeat(5_000)];
        write_snapshot(&mut store, &[huge]);

        assert_eq!(store.get(keys::ASSETS).unwrap(), stored_before);
    }

    #[test]
    fn test_malformed_snapshot_reads_empty() {
        let mut store = LocalStore::in_memory();
        store.set(keys::ASSETS, "{not json").unwrap();
        assert!(read_snapshot(&store).is_empty());
    }

    #[test]
    fn test_note_truncation() {
        let mut text = Some("a".repeat(600));
        truncate_chars(&mut text, COMPACT_NOTE_CAP);
        assert_eq!(text.unwrap().len(), COMPACT_NOTE_CAP);
    }

    #[test]
    fn test_audit_ring_buffer_cap() {
        let mut store = LocalStore::in_memory();
        for i in 0..(AUDIT_LOG_CAP + 25) {
            push_audit(
                &mut store,
                AuditEntry {
                    timestamp: chrono::Utc::now(),
                    actor: "tech".into(),
                    action: "update".into(),
                    subject: format!("asset-{i}"),
                },
            );
        }
        let log: Vec<AuditEntry> = get_blob(&store, keys::AUDIT_LOG);
        assert_eq!(log.len(), AUDIT_LOG_CAP);
        assert_eq!(log[0].subject, "asset-25");
    }

    #[test]
    fn test_inventory_transaction_cap() {
        let mut store = LocalStore::in_memory();
        let items = vec![crate::models::InventoryItem {
            id: 1,
            name: "toner".into(),
            campus: "Main".into(),
            quantity: 12,
            ..Default::default()
        }];
        put_blob(&mut store, keys::INVENTORY_ITEMS, &items);

        let full: Vec<InventoryTransaction> = (0..INVENTORY_TRANSACTIONS_CAP as i64)
            .map(|i| InventoryTransaction {
                id: i,
                item_id: 1,
                delta: -1,
                ..Default::default()
            })
            .collect();
        put_blob(&mut store, keys::INVENTORY_TRANSACTIONS, &full);
        push_inventory_transaction(
            &mut store,
            InventoryTransaction {
                id: 9999,
                item_id: 1,
                delta: 3,
                ..Default::default()
            },
        );
        let list: Vec<InventoryTransaction> = get_blob(&store, keys::INVENTORY_TRANSACTIONS);
        assert_eq!(list.len(), INVENTORY_TRANSACTIONS_CAP);
        assert_eq!(list[0].id, 1);
        assert_eq!(list.last().unwrap().id, 9999);
    }

    #[test]
    fn test_plain_blob_round_trip() {
        let mut store = LocalStore::in_memory();
        let locations = vec!["Main hall".to_string(), "Lab B".to_string()];
        put_blob(&mut store, keys::LOCATIONS, &locations);
        let back: Vec<String> = get_blob(&store, keys::LOCATIONS);
        assert_eq!(back, locations);
    }

    #[test]
    fn test_plain_blob_quota_skips_write() {
        let mut store = store_with_quota(64);
        let locations = vec!["x".repeat(500)];
        put_blob(&mut store, keys::LOCATIONS, &locations);
        let back: Vec<String> = get_blob(&store, keys::LOCATIONS);
        assert!(back.is_empty());
    }
}
