//! Audit log model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One audit log line; the log itself is a capped ring buffer in local
/// storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    /// Acting user (login or display name)
    pub actor: String,
    /// Action verb ("create", "update", "delete", "status", ...)
    pub action: String,
    /// What was acted on, typically an asset code
    pub subject: String,
}
