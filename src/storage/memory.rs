//! In-memory storage backend

use std::collections::HashMap;

use super::{KvStorage, StorageError};

/// HashMap-backed storage with an optional total byte quota over keys and
/// values, mirroring how browser-style bounded storage accounts usage
pub struct MemoryStorage {
    entries: HashMap<String, String>,
    quota_bytes: Option<usize>,
}

impl MemoryStorage {
    pub fn new(quota_bytes: Option<usize>) -> Self {
        Self {
            entries: HashMap::new(),
            quota_bytes,
        }
    }

    pub fn unbounded() -> Self {
        Self::new(None)
    }

    /// Bytes currently stored
    pub fn used_bytes(&self) -> usize {
        self.entries.iter().map(|(k, v)| k.len() + v.len()).sum()
    }
}

impl KvStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Some(quota) = self.quota_bytes {
            let existing = self.entries.get(key).map(|v| key.len() + v.len()).unwrap_or(0);
            let after = self.used_bytes() - existing + key.len() + value.len();
            if after > quota {
                return Err(StorageError::QuotaExceeded);
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get() {
        let mut store = MemoryStorage::unbounded();
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k"), Some("v".to_string()));
        store.remove("k");
        assert_eq!(store.get("k"), None);
    }

    #[test]
    fn test_quota_rejects_without_clobbering() {
        let mut store = MemoryStorage::new(Some(16));
        store.set("k", "small").unwrap();
        let err = store.set("k", "way too large to fit in the quota");
        assert!(matches!(err, Err(StorageError::QuotaExceeded)));
        // Previous value intact
        assert_eq!(store.get("k"), Some("small".to_string()));
    }

    #[test]
    fn test_replacing_frees_old_value() {
        let mut store = MemoryStorage::new(Some(12));
        store.set("k", "aaaaaaaaaaa").unwrap();
        store.set("k", "bbbbbbbbbbb").unwrap();
        assert_eq!(store.get("k"), Some("bbbbbbbbbbb".to_string()));
    }
}
