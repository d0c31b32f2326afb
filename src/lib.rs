//! Fleetkeeper client core
//!
//! The resilient data-synchronization layer of a multi-campus asset and
//! maintenance record keeper: endpoint resolution with graceful candidate
//! fallback, a tiered quota-degrading local cache, a reconciliation engine
//! that folds authoritative fetches into cached state without losing
//! locally entered data, and recurrence resolution for maintenance
//! due-dates.

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod storage;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use services::Services;
pub use storage::LocalStore;
