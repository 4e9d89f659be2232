use async_trait::async_trait;
use sluice_dns_application::ports::StaticUpstreamSource;
use sluice_dns_domain::{parse_upstream_lines, DnsConfig, DomainError};
use std::sync::Arc;

/// Static upstreams from the config: `upstream_dns_file` when set,
/// `upstream_servers` otherwise.
pub struct ConfigUpstreamSource {
    dns: Arc<DnsConfig>,
}

impl ConfigUpstreamSource {
    pub fn new(dns: Arc<DnsConfig>) -> Self {
        Self { dns }
    }
}

#[async_trait]
impl StaticUpstreamSource for ConfigUpstreamSource {
    async fn load(&self) -> Result<Vec<String>, DomainError> {
        let Some(path) = &self.dns.upstream_dns_file else {
            return Ok(self.dns.upstream_servers.clone());
        };

        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| DomainError::ManagedFileRead {
                path: path.clone(),
                message: e.to_string(),
            })?;
        Ok(parse_upstream_lines(&text))
    }
}
