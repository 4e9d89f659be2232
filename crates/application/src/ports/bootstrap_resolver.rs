use async_trait::async_trait;
use sluice_dns_domain::DomainError;
use std::fmt;
use std::net::SocketAddr;

/// Resolves upstream hostnames before any upstream is itself usable.
#[async_trait]
pub trait BootstrapResolver: Send + Sync + fmt::Debug {
    /// Returns the socket addresses for `host`, ordered by address-family preference.
    async fn resolve(&self, host: &str, port: u16) -> Result<Vec<SocketAddr>, DomainError>;
}
