//! Reconciliation engine
//!
//! Folds an authoritative record collection (freshly fetched) into a
//! previously cached copy, healing fields the backend left empty without
//! ever overwriting authoritative data, and merging sub-collections by
//! identity rather than by blind replacement. Total over incomplete
//! input: this module never errors and never consults the clock.

use chrono::NaiveDate;
use indexmap::IndexMap;

use crate::models::asset::{AssetRecord, HistoryEntry, ListField};
use crate::models::photo::{normalize_photo_set, promote_primary};

/// Merge a freshly fetched collection with the cached one. Authoritative
/// records come first in the output; cached records the server does not
/// know about (local fallback creations) are appended in cache order.
pub fn reconcile(authoritative: &[AssetRecord], cached: &[AssetRecord]) -> Vec<AssetRecord> {
    let mut merged: IndexMap<(String, i64), AssetRecord> =
        IndexMap::with_capacity(authoritative.len() + cached.len());
    for record in authoritative.iter().chain(cached.iter()) {
        match merged.get_mut(&record.merge_key()) {
            // The earlier occupant came from the authoritative side (or an
            // earlier duplicate); it stays the base and the later record
            // only fills its gaps.
            Some(base) => {
                *base = heal_record(base, record);
            }
            None => {
                merged.insert(record.merge_key(), record.clone());
            }
        }
    }
    merged.into_values().collect()
}

/// Field-level heal: authoritative record as the base, with cached values
/// copied forward only into empty slots. The healable scalars are specs,
/// notes, brand, model, serial number, vendor and the purchase/warranty
/// dates.
fn heal_record(base: &AssetRecord, cached: &AssetRecord) -> AssetRecord {
    let mut out = base.clone();

    heal_text(&mut out.specs, &cached.specs);
    heal_text(&mut out.notes, &cached.notes);
    heal_text(&mut out.brand, &cached.brand);
    heal_text(&mut out.model, &cached.model);
    heal_text(&mut out.serial_number, &cached.serial_number);
    heal_text(&mut out.vendor, &cached.vendor);
    heal_date(&mut out.purchase_date, &cached.purchase_date);
    heal_date(&mut out.warranty_until, &cached.warranty_until);

    // Union both sides' galleries (cache entries first, then
    // authoritative), then re-promote the authoritative primary if it set
    // one.
    let mut union = cached.photo_set();
    union.extend(base.photo_set());
    let mut photos = normalize_photo_set(None, &union);
    if let Some(primary) = base.photo.as_deref().filter(|p| !p.trim().is_empty()) {
        promote_primary(&mut photos, primary);
    }
    out.photo = photos.first().cloned();
    out.gallery = photos;

    out.maintenance_history =
        merge_history(&base.maintenance_history, &cached.maintenance_history);
    out.verification_history =
        merge_history(&base.verification_history, &cached.verification_history);
    // A payload that does not mention status or transfer history parses as
    // an omitted field, so a partial update can never truncate the longer
    // cached list: the omitted arm below keeps it whole.
    out.transfer_history = merge_history(&base.transfer_history, &cached.transfer_history);
    out.status_history = merge_history(&base.status_history, &cached.status_history);

    out
}

/// Per-list merge. An omitted authoritative list means the endpoint did
/// not ship the field at all: the cached list is kept unchanged. A present
/// list (even an empty one) is authoritative: entries merge by identity,
/// with only the embedded image reference healed from the cache.
fn merge_history<T: HistoryEntry>(auth: &ListField<T>, cached: &ListField<T>) -> ListField<T> {
    match auth {
        ListField::Omitted => cached.clone(),
        ListField::Present(entries) => ListField::Present(
            entries
                .iter()
                .map(|entry| {
                    match cached
                        .as_slice()
                        .iter()
                        .find(|c| c.entry_id() == entry.entry_id())
                    {
                        Some(cached_entry) => heal_entry(entry, cached_entry),
                        None => entry.clone(),
                    }
                })
                .collect(),
        ),
    }
}

fn heal_entry<T: HistoryEntry>(auth: &T, cached: &T) -> T {
    let mut out = auth.clone();
    let auth_blank = out.photo_ref().map_or(true, |p| p.trim().is_empty());
    if auth_blank {
        if let Some(photo) = cached.photo_ref().filter(|p| !p.trim().is_empty()) {
            out.set_photo_ref(Some(photo.to_string()));
        }
    }
    out
}

fn heal_text(base: &mut Option<String>, cached: &Option<String>) {
    let base_blank = base.as_deref().map_or(true, |s| s.trim().is_empty());
    if base_blank {
        if let Some(value) = cached.as_deref().filter(|s| !s.trim().is_empty()) {
            *base = Some(value.to_string());
        }
    }
}

fn heal_date(base: &mut Option<NaiveDate>, cached: &Option<NaiveDate>) {
    if base.is_none() {
        *base = *cached;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::asset::{MaintenanceEntry, StatusEntry};

    fn record(id: i64, code: &str) -> AssetRecord {
        AssetRecord {
            id,
            asset_code: code.to_string(),
            ..Default::default()
        }
    }

    fn maint(id: i64, photo: Option<&str>) -> MaintenanceEntry {
        MaintenanceEntry {
            id,
            photo: photo.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_merge_idempotence() {
        let mut rec = record(1, "MAIN-IT-PC-001");
        rec.specs = Some("16GB RAM".into());
        rec.photo = Some("p1".into());
        rec.gallery = vec!["p1".into(), "p2".into()];
        rec.maintenance_history = vec![maint(1, Some("m1"))].into();
        rec.status_history = vec![StatusEntry::default()].into();

        let collection = vec![rec];
        let merged = reconcile(&collection, &collection);
        assert_eq!(merged, collection);
    }

    #[test]
    fn test_heal_not_overwrite() {
        let mut auth = record(1, "MAIN-IT-PC-001");
        auth.specs = Some("".into());
        let mut cached = record(1, "MAIN-IT-PC-001");
        cached.specs = Some("16GB RAM".into());

        let merged = reconcile(&[auth.clone()], &[cached.clone()]);
        assert_eq!(merged[0].specs.as_deref(), Some("16GB RAM"));

        auth.specs = Some("32GB RAM".into());
        let merged = reconcile(&[auth], &[cached]);
        assert_eq!(merged[0].specs.as_deref(), Some("32GB RAM"));
    }

    #[test]
    fn test_history_omission_vs_emptiness() {
        let mut cached = record(1, "MAIN-IT-PC-001");
        cached.maintenance_history =
            vec![maint(1, None), maint(2, None), maint(3, None)].into();

        // Field absent from the payload entirely: cached entries kept
        let auth = record(1, "MAIN-IT-PC-001");
        assert!(auth.maintenance_history.is_omitted());
        let merged = reconcile(&[auth], &[cached.clone()]);
        assert_eq!(merged[0].maintenance_history.len(), 3);

        // Field explicitly present and empty: the server says there is none
        let mut auth = record(1, "MAIN-IT-PC-001");
        auth.maintenance_history = Vec::new().into();
        let merged = reconcile(&[auth], &[cached]);
        assert!(!merged[0].maintenance_history.is_omitted());
        assert_eq!(merged[0].maintenance_history.len(), 0);
    }

    #[test]
    fn test_status_truncation_guard() {
        // A partial-update payload omits statusHistory; the longer cached
        // list must win
        let mut cached = record(1, "MAIN-IT-PC-001");
        cached.status_history = vec![
            StatusEntry { id: 1, ..Default::default() },
            StatusEntry { id: 2, ..Default::default() },
            StatusEntry { id: 3, ..Default::default() },
        ]
        .into();
        let auth = record(1, "MAIN-IT-PC-001");
        let merged = reconcile(&[auth], &[cached.clone()]);
        assert_eq!(merged[0].status_history.len(), 3);

        // Explicitly included shorter list is authoritative
        let mut auth = record(1, "MAIN-IT-PC-001");
        auth.status_history = vec![StatusEntry { id: 3, ..Default::default() }].into();
        let merged = reconcile(&[auth], &[cached]);
        assert_eq!(merged[0].status_history.len(), 1);
    }

    #[test]
    fn test_entry_photo_heal() {
        let mut auth = record(1, "MAIN-IT-PC-001");
        auth.maintenance_history = vec![maint(1, None), maint(2, Some("fresh"))].into();
        let mut cached = record(1, "MAIN-IT-PC-001");
        cached.maintenance_history = vec![maint(1, Some("stored")), maint(2, Some("stale"))].into();

        let merged = reconcile(&[auth], &[cached]);
        let history = merged[0].maintenance_history.as_slice();
        assert_eq!(history[0].photo.as_deref(), Some("stored"));
        assert_eq!(history[1].photo.as_deref(), Some("fresh"));
    }

    #[test]
    fn test_photo_union_and_primary_promotion() {
        let mut auth = record(1, "MAIN-IT-PC-001");
        auth.photo = Some("server-primary".into());
        auth.gallery = vec!["server-primary".into(), "shared".into()];
        let mut cached = record(1, "MAIN-IT-PC-001");
        cached.photo = Some("local-only".into());
        cached.gallery = vec!["local-only".into(), "shared".into()];

        let merged = reconcile(&[auth], &[cached]);
        let photos = &merged[0].gallery;
        assert_eq!(photos[0], "server-primary");
        assert!(photos.contains(&"local-only".to_string()));
        assert!(photos.contains(&"shared".to_string()));
        assert_eq!(photos.len(), 3);
        assert_eq!(merged[0].photo.as_deref(), Some("server-primary"));
    }

    #[test]
    fn test_local_only_records_survive() {
        let auth = vec![record(1, "MAIN-IT-PC-001")];
        let cached = vec![record(1, "MAIN-IT-PC-001"), record(-1, "MAIN-IT-PC-002")];
        let merged = reconcile(&auth, &cached);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].id, 1);
        assert_eq!(merged[1].id, -1);
    }

    #[test]
    fn test_same_code_different_id_not_merged() {
        // A local fallback record can share its code with a later server
        // assignment; the numeric id keeps them apart
        let auth = vec![record(42, "MAIN-IT-PC-002")];
        let cached = vec![record(-1, "MAIN-IT-PC-002")];
        let merged = reconcile(&auth, &cached);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_dates_healed_when_absent() {
        let auth = record(1, "MAIN-IT-PC-001");
        let mut cached = record(1, "MAIN-IT-PC-001");
        cached.purchase_date = NaiveDate::from_ymd_opt(2023, 5, 12);

        let merged = reconcile(&[auth], &[cached]);
        assert_eq!(
            merged[0].purchase_date,
            NaiveDate::from_ymd_opt(2023, 5, 12)
        );
    }
}
