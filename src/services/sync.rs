//! Synchronized CRUD operations
//!
//! Every write attempts the network first; only a transport failure or a
//! recognized "route not found" answer demotes the operation to a
//! local-only fallback write. A definitive application error (validation,
//! permission) surfaces to the caller untouched, so a rejected edit is
//! never presented as saved. Every write site re-reads the current cache
//! immediately before modifying it.

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::models::asset::{
    AssetRecord, AssetStatus, CreateAsset, CreateMaintenanceEntry, ListField, MaintenanceEntry,
    StatusEntry, UpdateAsset, UpdateMaintenanceEntry,
};
use crate::models::photo::normalize_photo_set;
use crate::models::AuditEntry;
use crate::services::cache;
use crate::services::endpoint::EndpointResolver;
use crate::services::reconcile::reconcile;
use crate::storage::LocalStore;

pub struct SyncService {
    resolver: EndpointResolver,
    actor: String,
}

impl SyncService {
    pub fn new(resolver: EndpointResolver) -> Self {
        Self {
            resolver,
            actor: "local".to_string(),
        }
    }

    /// Name recorded in the audit log for this client's writes
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = actor.into();
        self
    }

    pub fn resolver_mut(&mut self) -> &mut EndpointResolver {
        &mut self.resolver
    }

    // -----------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------

    /// Fetch the authoritative collection, fold it into the cache, and
    /// return the merged view. When the backend is unreachable or lacks
    /// the route, the cached snapshot is served instead so the client
    /// keeps working.
    pub async fn refresh_assets(&self, store: &mut LocalStore) -> AppResult<Vec<AssetRecord>> {
        match self.resolver.get("/api/assets").await {
            Ok(body) => {
                let fetched = parse_records(body);
                let cached = cache::read_snapshot(store);
                let merged = reconcile(&fetched, &cached);
                cache::write_snapshot(store, &merged);
                Ok(merged)
            }
            Err(e) if e.allows_local_fallback() => {
                tracing::warn!(error = %e, "backend unavailable; serving cached snapshot");
                Ok(cache::read_snapshot(store))
            }
            Err(e) => Err(e),
        }
    }

    // -----------------------------------------------------------------
    // Record writes
    // -----------------------------------------------------------------

    pub async fn create_asset(
        &self,
        store: &mut LocalStore,
        data: &CreateAsset,
    ) -> AppResult<AssetRecord> {
        let result = self
            .resolver
            .post("/api/assets", to_sparse_value(data))
            .await;
        let record = match result {
            Ok(body) => {
                let record = parse_record(body)?;
                self.absorb(store, &record)
            }
            Err(e) if e.allows_local_fallback() => {
                tracing::warn!(error = %e, "create demoted to local-only record");
                self.synthesize_local(store, data)
            }
            Err(e) => return Err(e),
        };
        self.audit(store, "create", &record.asset_code);
        Ok(record)
    }

    pub async fn update_asset(
        &self,
        store: &mut LocalStore,
        id: i64,
        changes: &UpdateAsset,
    ) -> AppResult<AssetRecord> {
        let result = self
            .resolver
            .patch(&format!("/api/assets/{id}"), to_sparse_value(changes))
            .await;
        let record = match result {
            Ok(body) => {
                let record = parse_record(body)?;
                self.absorb(store, &record)
            }
            Err(e) if e.allows_local_fallback() => {
                tracing::warn!(error = %e, id, "update applied to cache only");
                self.edit_cached(store, id, |record| apply_update(record, changes))?
            }
            Err(e) => return Err(e),
        };
        self.audit(store, "update", &record.asset_code);
        Ok(record)
    }

    pub async fn delete_asset(&self, store: &mut LocalStore, id: i64) -> AppResult<()> {
        let result = self.resolver.delete(&format!("/api/assets/{id}")).await;
        match result {
            Ok(_) => {}
            Err(e) if e.allows_local_fallback() => {
                tracing::warn!(error = %e, id, "delete applied to cache only");
            }
            Err(e) => return Err(e),
        }
        let mut records = cache::read_snapshot(store);
        let code = records
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.asset_code.clone())
            .unwrap_or_else(|| id.to_string());
        records.retain(|r| r.id != id);
        cache::write_snapshot(store, &records);
        self.audit(store, "delete", &code);
        Ok(())
    }

    // -----------------------------------------------------------------
    // Maintenance history sub-resource
    // -----------------------------------------------------------------

    pub async fn add_maintenance_entry(
        &self,
        store: &mut LocalStore,
        asset_id: i64,
        entry: &CreateMaintenanceEntry,
    ) -> AppResult<AssetRecord> {
        let result = self
            .resolver
            .post(&format!("/api/assets/{asset_id}/history"), to_sparse_value(entry))
            .await;
        let record = match result {
            Ok(body) => {
                let record = parse_record(body)?;
                self.absorb(store, &record)
            }
            Err(e) if e.allows_local_fallback() => {
                tracing::warn!(error = %e, asset_id, "history entry appended to cache only");
                self.edit_cached(store, asset_id, |record| {
                    let history = record.maintenance_history.to_mut();
                    let next_id = next_local_entry_id(history.iter().map(|e| e.id));
                    history.push(MaintenanceEntry {
                        id: next_id,
                        date: entry.date,
                        work: entry.work.clone(),
                        completed: entry.completed,
                        photo: entry.photo.clone(),
                        note: entry.note.clone(),
                    });
                })?
            }
            Err(e) => return Err(e),
        };
        self.audit(store, "history", &record.asset_code);
        Ok(record)
    }

    pub async fn update_maintenance_entry(
        &self,
        store: &mut LocalStore,
        asset_id: i64,
        entry_id: i64,
        changes: &UpdateMaintenanceEntry,
    ) -> AppResult<AssetRecord> {
        let result = self
            .resolver
            .patch(
                &format!("/api/assets/{asset_id}/history/{entry_id}"),
                to_sparse_value(changes),
            )
            .await;
        let record = match result {
            Ok(body) => {
                let record = parse_record(body)?;
                self.absorb(store, &record)
            }
            Err(e) if e.allows_local_fallback() => {
                tracing::warn!(error = %e, asset_id, entry_id, "history edit applied to cache only");
                self.edit_cached(store, asset_id, |record| {
                    if let ListField::Present(history) = &mut record.maintenance_history {
                        if let Some(entry) = history.iter_mut().find(|e| e.id == entry_id) {
                            if let Some(date) = changes.date {
                                entry.date = Some(date);
                            }
                            if let Some(work) = &changes.work {
                                entry.work = Some(work.clone());
                            }
                            if let Some(completed) = changes.completed {
                                entry.completed = completed;
                            }
                            if let Some(photo) = &changes.photo {
                                entry.photo = Some(photo.clone());
                            }
                            if let Some(note) = &changes.note {
                                entry.note = Some(note.clone());
                            }
                        }
                    }
                })?
            }
            Err(e) => return Err(e),
        };
        self.audit(store, "history", &record.asset_code);
        Ok(record)
    }

    /// Explicit user deletion; merge itself never deletes entries
    pub async fn delete_maintenance_entry(
        &self,
        store: &mut LocalStore,
        asset_id: i64,
        entry_id: i64,
    ) -> AppResult<AssetRecord> {
        let result = self
            .resolver
            .delete(&format!("/api/assets/{asset_id}/history/{entry_id}"))
            .await;
        let record = match result {
            Ok(body) => {
                let record = parse_record(body)?;
                self.absorb(store, &record)
            }
            Err(e) if e.allows_local_fallback() => {
                tracing::warn!(error = %e, asset_id, entry_id, "history delete applied to cache only");
                self.edit_cached(store, asset_id, |record| {
                    if let ListField::Present(history) = &mut record.maintenance_history {
                        history.retain(|e| e.id != entry_id);
                    }
                })?
            }
            Err(e) => return Err(e),
        };
        self.audit(store, "history", &record.asset_code);
        Ok(record)
    }

    // -----------------------------------------------------------------
    // Status
    // -----------------------------------------------------------------

    /// Append a status change. The payload carries the full updated
    /// `statusHistory` array explicitly, which is what lets the merge on
    /// the echoed record treat the list as authoritatively present.
    pub async fn set_status(
        &self,
        store: &mut LocalStore,
        asset_id: i64,
        status: AssetStatus,
        note: Option<String>,
    ) -> AppResult<AssetRecord> {
        // Fresh read: the new history array must extend the current one
        let cached = cache::read_snapshot(store);
        let mut history: Vec<StatusEntry> = cached
            .iter()
            .find(|r| r.id == asset_id)
            .map(|r| r.status_history.as_slice().to_vec())
            .unwrap_or_default();
        history.push(StatusEntry {
            id: next_local_entry_id(history.iter().map(|e| e.id)),
            date: Some(Utc::now().date_naive()),
            status,
            note: note.clone(),
        });

        let payload = serde_json::json!({
            "status": serde_json::to_value(status).unwrap_or(Value::Null),
            "statusHistory": serde_json::to_value(&history).unwrap_or(Value::Null),
        });
        let result = self
            .resolver
            .patch(&format!("/api/assets/{asset_id}/status"), payload)
            .await;
        let record = match result {
            Ok(body) => {
                let record = parse_record(body)?;
                self.absorb(store, &record)
            }
            Err(e) if e.allows_local_fallback() => {
                tracing::warn!(error = %e, asset_id, "status change applied to cache only");
                self.edit_cached(store, asset_id, |record| {
                    record.status = status;
                    record.status_history = ListField::Present(history);
                })?
            }
            Err(e) => return Err(e),
        };
        self.audit(store, "status", &record.asset_code);
        Ok(record)
    }

    // -----------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------

    /// Fold an echoed authoritative record into the cache and return its
    /// healed form. Going through the merge engine keeps cached history
    /// alive when the echo omits the sub-collections.
    fn absorb(&self, store: &mut LocalStore, record: &AssetRecord) -> AssetRecord {
        let cached = cache::read_snapshot(store);
        let merged = reconcile(std::slice::from_ref(record), &cached);
        cache::write_snapshot(store, &merged);
        merged
            .iter()
            .find(|r| r.merge_key() == record.merge_key())
            .cloned()
            .unwrap_or_else(|| record.clone())
    }

    /// Apply `edit` to the cached record with the given id, re-reading the
    /// cache immediately before the write
    fn edit_cached(
        &self,
        store: &mut LocalStore,
        id: i64,
        edit: impl FnOnce(&mut AssetRecord),
    ) -> AppResult<AssetRecord> {
        let mut records = cache::read_snapshot(store);
        let Some(record) = records.iter_mut().find(|r| r.id == id) else {
            return Err(AppError::Internal(format!(
                "asset {id} is not in the local cache"
            )));
        };
        edit(record);
        let updated = record.clone();
        cache::write_snapshot(store, &records);
        Ok(updated)
    }

    /// Local-only fallback record for a create that could not reach the
    /// backend: negative id, locally derived asset code
    fn synthesize_local(&self, store: &mut LocalStore, data: &CreateAsset) -> AssetRecord {
        let mut records = cache::read_snapshot(store);
        let id = next_local_record_id(&records);
        let asset_code = next_asset_code(&records, &data.campus, &data.category, &data.asset_type);
        let gallery = normalize_photo_set(data.photo.as_deref(), &data.gallery);
        let record = AssetRecord {
            id,
            asset_code,
            campus: data.campus.clone(),
            category: data.category.clone(),
            asset_type: data.asset_type.clone(),
            pc_subtype: data.pc_subtype.clone(),
            location: data.location.clone(),
            assigned_to: data.assigned_to.clone(),
            brand: data.brand.clone(),
            model: data.model.clone(),
            serial_number: data.serial_number.clone(),
            specs: data.specs.clone(),
            notes: data.notes.clone(),
            vendor: data.vendor.clone(),
            purchase_date: data.purchase_date,
            warranty_until: data.warranty_until,
            photo: gallery.first().cloned(),
            gallery,
            ..Default::default()
        };
        records.push(record.clone());
        cache::write_snapshot(store, &records);
        record
    }

    fn audit(&self, store: &mut LocalStore, action: &str, subject: &str) {
        cache::push_audit(
            store,
            AuditEntry {
                timestamp: Utc::now(),
                actor: self.actor.clone(),
                action: action.to_string(),
                subject: subject.to_string(),
            },
        );
    }
}

/// Apply an update request to a cached record, touching only the supplied
/// fields, then re-normalize the photo set
fn apply_update(record: &mut AssetRecord, changes: &UpdateAsset) {
    if let Some(v) = &changes.campus {
        record.campus = v.clone();
    }
    if let Some(v) = &changes.category {
        record.category = v.clone();
    }
    if let Some(v) = &changes.asset_type {
        record.asset_type = v.clone();
    }
    if changes.pc_subtype.is_some() {
        record.pc_subtype = changes.pc_subtype.clone();
    }
    if changes.location.is_some() {
        record.location = changes.location.clone();
    }
    if changes.assigned_to.is_some() {
        record.assigned_to = changes.assigned_to.clone();
    }
    if changes.brand.is_some() {
        record.brand = changes.brand.clone();
    }
    if changes.model.is_some() {
        record.model = changes.model.clone();
    }
    if changes.serial_number.is_some() {
        record.serial_number = changes.serial_number.clone();
    }
    if changes.specs.is_some() {
        record.specs = changes.specs.clone();
    }
    if changes.notes.is_some() {
        record.notes = changes.notes.clone();
    }
    if changes.vendor.is_some() {
        record.vendor = changes.vendor.clone();
    }
    if changes.purchase_date.is_some() {
        record.purchase_date = changes.purchase_date;
    }
    if changes.warranty_until.is_some() {
        record.warranty_until = changes.warranty_until;
    }
    if changes.photo.is_some() {
        record.photo = changes.photo.clone();
    }
    if let Some(gallery) = &changes.gallery {
        record.gallery = gallery.clone();
    }
    if let Some(schedule) = &changes.schedule {
        record.schedule = schedule.clone();
    }
    if let Some(verification) = &changes.verification {
        record.verification = verification.clone();
    }
    let photos = normalize_photo_set(record.photo.as_deref(), &record.gallery);
    record.photo = photos.first().cloned();
    record.gallery = photos;
}

/// Serialize a request struct, dropping null fields so a PATCH only
/// carries the supplied changes
fn to_sparse_value<T: Serialize>(value: &T) -> Value {
    let mut body = serde_json::to_value(value).unwrap_or(Value::Null);
    if let Value::Object(map) = &mut body {
        map.retain(|_, v| !v.is_null());
    }
    body
}

fn parse_record(body: Value) -> AppResult<AssetRecord> {
    serde_json::from_value(body)
        .map_err(|e| AppError::Internal(format!("unexpected server response: {e}")))
}

/// Parse the fetched collection; a malformed payload degrades to empty so
/// the merge keeps the cached records
fn parse_records(body: Value) -> Vec<AssetRecord> {
    match serde_json::from_value(body) {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!(error = %e, "asset collection response is malformed");
            Vec::new()
        }
    }
}

/// Negative, decreasing below anything already present, so a local id can
/// never collide with a server-assigned one
fn next_local_record_id(records: &[AssetRecord]) -> i64 {
    records.iter().map(|r| r.id).min().unwrap_or(0).min(0) - 1
}

fn next_local_entry_id<I: Iterator<Item = i64>>(ids: I) -> i64 {
    ids.min().unwrap_or(0).min(0) - 1
}

/// Derive the next asset code for a campus+category+type prefix by
/// scanning the cached snapshot for the highest existing sequence
fn next_asset_code(records: &[AssetRecord], campus: &str, category: &str, asset_type: &str) -> String {
    let prefix = format!(
        "{}-{}-{}",
        code_part(campus),
        code_part(category),
        code_part(asset_type)
    );
    let max_seq = records
        .iter()
        .filter_map(|r| r.asset_code.strip_prefix(&format!("{prefix}-")))
        .filter_map(|suffix| suffix.parse::<u32>().ok())
        .max()
        .unwrap_or(0);
    format!("{}-{:03}", prefix, max_seq + 1)
}

fn code_part(s: &str) -> String {
    let part: String = s
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(4)
        .collect::<String>()
        .to_uppercase();
    if part.is_empty() {
        "X".to_string()
    } else {
        part
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_asset_code() {
        let records = vec![
            AssetRecord {
                asset_code: "MAIN-IT-PC-007".into(),
                ..Default::default()
            },
            AssetRecord {
                asset_code: "MAIN-IT-PC-002".into(),
                ..Default::default()
            },
            AssetRecord {
                asset_code: "MAIN-IT-PR-009".into(),
                ..Default::default()
            },
        ];
        assert_eq!(
            next_asset_code(&records, "Main", "IT", "PC"),
            "MAIN-IT-PC-008"
        );
        assert_eq!(
            next_asset_code(&records, "North", "IT", "PC"),
            "NORT-IT-PC-001"
        );
    }

    #[test]
    fn test_local_ids_decrease_below_minimum() {
        let records = vec![
            AssetRecord { id: 12, ..Default::default() },
            AssetRecord { id: -3, ..Default::default() },
        ];
        assert_eq!(next_local_record_id(&records), -4);
        assert_eq!(next_local_record_id(&[]), -1);
    }

    #[test]
    fn test_sparse_value_drops_nulls() {
        let update = UpdateAsset {
            location: Some("Lab B".into()),
            ..Default::default()
        };
        let body = to_sparse_value(&update);
        let map = body.as_object().unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map["location"], "Lab B");
    }
}
