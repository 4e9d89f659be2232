use async_trait::async_trait;
use sluice_dns_domain::{DomainError, ManagedFilesSnapshot};

/// Writes the managed-file set back to the configuration file.
#[async_trait]
pub trait ConfigPersistence: Send + Sync {
    async fn save_upstream_files(&self, snapshot: &ManagedFilesSnapshot) -> Result<(), DomainError>;
}
