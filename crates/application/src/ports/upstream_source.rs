use async_trait::async_trait;
use sluice_dns_domain::DomainError;

/// Source of the statically configured upstream addresses.
#[async_trait]
pub trait StaticUpstreamSource: Send + Sync {
    async fn load(&self) -> Result<Vec<String>, DomainError>;
}
