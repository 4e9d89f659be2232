use async_trait::async_trait;
use sluice_dns_domain::{
    DomainError, HttpVersion, UpstreamGroupKind, UpstreamStrategy, UpstreamTlsConfig,
};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::BootstrapResolver;

/// Resolution options shared by every upstream of a group.
#[derive(Clone)]
pub struct UpstreamOptions {
    pub bootstrap: Arc<dyn BootstrapResolver>,
    pub timeout: Duration,
    pub http_versions: Vec<HttpVersion>,
    pub prefer_ipv6: bool,
    pub tls: UpstreamTlsConfig,
}

impl fmt::Debug for UpstreamOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamOptions")
            .field("timeout", &self.timeout)
            .field("http_versions", &self.http_versions)
            .field("prefer_ipv6", &self.prefer_ipv6)
            .finish_non_exhaustive()
    }
}

/// How one exchange spreads a query over the selected upstreams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeMode {
    pub strategy: UpstreamStrategy,
    /// Bound on waiting for the fastest answer under `FastestAddr`.
    pub fastest_timeout: Duration,
}

impl Default for ExchangeMode {
    fn default() -> Self {
        Self {
            strategy: UpstreamStrategy::LoadBalance,
            fastest_timeout: Duration::from_secs(1),
        }
    }
}

/// A built upstream resolver group.
///
/// A group owns the network resources it allocated (HTTP clients, TLS
/// sessions). They stay alive until `close` is called; closing twice is a
/// no-op.
#[async_trait]
pub trait UpstreamGroup: Send + Sync + fmt::Debug {
    fn kind(&self) -> UpstreamGroupKind;

    /// Configured upstream addresses, general ones first.
    fn addresses(&self) -> Vec<String>;

    fn is_empty(&self) -> bool;

    /// Forwards a wire-format query to the upstreams responsible for `domain`.
    async fn exchange(
        &self,
        domain: &str,
        query: &[u8],
        mode: ExchangeMode,
    ) -> Result<Vec<u8>, DomainError>;

    /// Releases the group's network resources.
    fn close(&self) -> Result<(), DomainError>;
}

/// Builds a group from an explicit list of upstream lines.
pub trait UpstreamGroupFactory: Send + Sync {
    fn build(
        &self,
        kind: UpstreamGroupKind,
        lines: &[String],
        options: &UpstreamOptions,
    ) -> Result<Arc<dyn UpstreamGroup>, DomainError>;
}

/// Builds a group whose upstream list comes from its own source
/// (system resolvers, fallback servers).
pub trait UpstreamGroupProvider: Send + Sync {
    fn build(&self, options: &UpstreamOptions) -> Result<Arc<dyn UpstreamGroup>, DomainError>;
}
