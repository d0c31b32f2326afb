//! Bounded key-value storage primitive
//!
//! The client persists everything into a small set of independently
//! evolvable blobs under fixed keys. Backends are swappable behind
//! [`KvStorage`]; the cache layer owns all quota-degradation policy, this
//! layer only reports `QuotaExceeded` honestly.

pub mod file;
pub mod memory;

use thiserror::Error;

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Fixed keys of the persisted local state blobs
pub mod keys {
    /// Full asset record snapshot (the CacheSnapshot)
    pub const ASSETS: &str = "fleetkeeper.assets";
    pub const LOCATIONS: &str = "fleetkeeper.locations";
    pub const STAFF: &str = "fleetkeeper.staff";
    /// Campus code -> display name map
    pub const CAMPUS_NAMES: &str = "fleetkeeper.campus_names";
    /// User-defined item type map
    pub const CUSTOM_TYPES: &str = "fleetkeeper.custom_types";
    /// Authentication token and user blob
    pub const AUTH: &str = "fleetkeeper.auth";
    /// Audit log ring buffer
    pub const AUDIT_LOG: &str = "fleetkeeper.audit_log";
    pub const INVENTORY_ITEMS: &str = "fleetkeeper.inventory_items";
    pub const INVENTORY_TRANSACTIONS: &str = "fleetkeeper.inventory_transactions";
}

/// Storage failure classes
#[derive(Error, Debug)]
pub enum StorageError {
    /// The write would exceed the storage quota; nothing was written
    #[error("storage quota exceeded")]
    QuotaExceeded,

    #[error("storage I/O error: {0}")]
    Io(String),
}

/// Bounded key-value storage primitive
///
/// `set` is all-or-nothing: on `QuotaExceeded` the previously stored value
/// for the key, if any, must remain intact.
pub trait KvStorage: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str);
}

/// The client's local store: a storage backend behind a uniform handle,
/// passed by reference to the cache and sync layers so tests can swap in
/// an in-memory fake
pub struct LocalStore {
    backend: Box<dyn KvStorage>,
}

impl LocalStore {
    pub fn new(backend: Box<dyn KvStorage>) -> Self {
        Self { backend }
    }

    /// In-memory store without a quota, for tests and cold starts
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStorage::unbounded()))
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.backend.get(key)
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.backend.set(key, value)
    }

    pub fn remove(&mut self, key: &str) {
        self.backend.remove(key)
    }
}
