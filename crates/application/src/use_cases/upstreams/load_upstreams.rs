use sluice_dns_domain::{merge_upstreams, DomainError};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::ports::{ManagedUpstreamFileRepository, StaticUpstreamSource};

/// Reads static and managed-file upstreams into one deduplicated list.
///
/// Static upstreams come first, so they win over managed-file duplicates.
pub struct UpstreamListLoader {
    static_source: Arc<dyn StaticUpstreamSource>,
    files: Arc<dyn ManagedUpstreamFileRepository>,
}

impl UpstreamListLoader {
    pub fn new(
        static_source: Arc<dyn StaticUpstreamSource>,
        files: Arc<dyn ManagedUpstreamFileRepository>,
    ) -> Self {
        Self {
            static_source,
            files,
        }
    }

    #[instrument(skip(self))]
    pub async fn execute(&self) -> Result<Vec<String>, DomainError> {
        let configured = self.static_source.load().await?;
        let managed = self.files.load_upstreams().await?;

        let merged = merge_upstreams(&[configured, managed]);
        debug!(count = merged.len(), "Upstream list loaded");

        Ok(merged)
    }
}
