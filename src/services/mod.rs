//! Client-core services

pub mod cache;
pub mod endpoint;
pub mod reconcile;
pub mod recurrence;
pub mod sync;

use crate::config::AppConfig;
use endpoint::{EndpointResolver, ReqwestTransport};

/// Container for all services
pub struct Services {
    pub sync: sync::SyncService,
}

impl Services {
    /// Create all services with the given configuration
    pub fn new(config: &AppConfig) -> Self {
        let resolver = EndpointResolver::new(
            config.backend.clone(),
            Box::new(ReqwestTransport::new()),
        );
        Self {
            sync: sync::SyncService::new(resolver),
        }
    }
}
