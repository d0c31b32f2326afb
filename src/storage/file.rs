//! File-backed storage backend
//!
//! One JSON blob per key under a directory. Writes go through a temporary
//! file and a rename so a failed write never corrupts the previous value.

use std::fs;
use std::path::{Path, PathBuf};

use super::{KvStorage, StorageError};

pub struct FileStorage {
    dir: PathBuf,
    quota_bytes: Option<u64>,
}

impl FileStorage {
    pub fn new(dir: impl AsRef<Path>, quota_bytes: Option<u64>) -> Result<Self, StorageError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| StorageError::Io(e.to_string()))?;
        Ok(Self { dir, quota_bytes })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    fn used_bytes(&self) -> u64 {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return 0;
        };
        entries
            .flatten()
            // A tmp file left by an interrupted write is not stored data
            // and must not count against the quota
            .filter(|e| e.path().extension().is_some_and(|ext| ext != "tmp"))
            .filter_map(|e| e.metadata().ok())
            .filter(|m| m.is_file())
            .map(|m| m.len())
            .sum()
    }
}

impl KvStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path_for(key)).ok()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        if let Some(quota) = self.quota_bytes {
            let existing = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
            let after = self.used_bytes() - existing + value.len() as u64;
            if after > quota {
                return Err(StorageError::QuotaExceeded);
            }
        }
        let tmp = self.dir.join(format!("{}.json.tmp", key));
        fs::write(&tmp, value).map_err(|e| StorageError::Io(e.to_string()))?;
        fs::rename(&tmp, &path).map_err(|e| StorageError::Io(e.to_string()))?;
        Ok(())
    }

    fn remove(&mut self, key: &str) {
        let _ = fs::remove_file(self.path_for(key));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStorage::new(dir.path(), None).unwrap();
        store.set("fleetkeeper.assets", "[]").unwrap();
        assert_eq!(store.get("fleetkeeper.assets"), Some("[]".to_string()));
        store.remove("fleetkeeper.assets");
        assert_eq!(store.get("fleetkeeper.assets"), None);
    }

    #[test]
    fn test_stale_tmp_file_does_not_count_toward_quota() {
        let dir = tempfile::tempdir().unwrap();
        // Leftover from a write interrupted between write and rename
        fs::write(dir.path().join("k.json.tmp"), "x".repeat(64)).unwrap();

        let mut store = FileStorage::new(dir.path(), Some(16)).unwrap();
        store.set("k", "fits").unwrap();
        assert_eq!(store.get("k"), Some("fits".to_string()));
    }

    #[test]
    fn test_quota_preserves_previous_value() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStorage::new(dir.path(), Some(8)).unwrap();
        store.set("k", "previous").unwrap();
        let err = store.set("k", "this value is far too large");
        assert!(matches!(err, Err(StorageError::QuotaExceeded)));
        assert_eq!(store.get("k"), Some("previous".to_string()));
    }
}
