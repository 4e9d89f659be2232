use async_trait::async_trait;
use sluice_dns_domain::{DnsConfig, DomainError, UpstreamStrategy};
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use super::{ExchangeMode, UpstreamGroup};

/// Cache size of the internal proxy used for the server's own lookups.
pub const INTERNAL_PROXY_CACHE_BYTES: usize = 4096;

/// Serving options of a forwarding proxy, independent of its upstreams.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxySettings {
    pub strategy: UpstreamStrategy,
    pub fastest_timeout: Duration,
    pub cache_enabled: bool,
    pub cache_size_bytes: usize,
    pub max_concurrent_queries: usize,
    pub use_private_rdns: bool,
    pub private_networks: Vec<String>,
    pub use_dns64: bool,
    pub dns64_prefixes: Vec<String>,
    pub edns_client_subnet_enabled: bool,
    pub listen_addrs: Vec<SocketAddr>,
}

impl ProxySettings {
    /// Settings of the client-facing proxy.
    pub fn primary(dns: &DnsConfig, listen_addrs: Vec<SocketAddr>) -> Self {
        Self {
            strategy: dns.upstream_strategy,
            fastest_timeout: Duration::from_millis(dns.fastest_timeout),
            cache_enabled: dns.cache_enabled,
            cache_size_bytes: dns.cache_size_bytes,
            max_concurrent_queries: dns.max_concurrent_queries,
            use_private_rdns: dns.use_private_rdns,
            private_networks: dns.private_networks.clone(),
            use_dns64: dns.use_dns64,
            dns64_prefixes: dns.dns64_prefixes.clone(),
            edns_client_subnet_enabled: dns.edns_client_subnet_enabled,
            listen_addrs,
        }
    }

    pub fn exchange_mode(&self) -> ExchangeMode {
        ExchangeMode {
            strategy: self.strategy,
            fastest_timeout: self.fastest_timeout,
        }
    }

    /// Settings of the internal proxy: small fixed cache, no listeners.
    pub fn internal(dns: &DnsConfig) -> Self {
        Self {
            cache_enabled: true,
            cache_size_bytes: INTERNAL_PROXY_CACHE_BYTES,
            edns_client_subnet_enabled: false,
            ..Self::primary(dns, Vec::new())
        }
    }
}

/// Upstream groups plus serving options handed to the proxy factory.
#[derive(Clone)]
pub struct ProxyConfig {
    pub upstream: Arc<dyn UpstreamGroup>,
    pub private_rdns: Arc<dyn UpstreamGroup>,
    pub fallbacks: Option<Arc<dyn UpstreamGroup>>,
    pub settings: ProxySettings,
}

impl fmt::Debug for ProxyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyConfig")
            .field("upstream", &self.upstream.kind())
            .field("private_rdns", &self.private_rdns.kind())
            .field("fallbacks", &self.fallbacks.as_ref().map(|g| g.kind()))
            .field("settings", &self.settings)
            .finish()
    }
}

/// A forwarding proxy answering queries from its upstream groups.
///
/// The proxy holds references to its groups but never releases them; group
/// lifetime belongs to the bundle that built them.
#[async_trait]
pub trait DnsProxy: Send + Sync {
    fn config(&self) -> &ProxyConfig;

    async fn resolve(&self, query: &[u8]) -> Result<Vec<u8>, DomainError>;
}

pub trait DnsProxyFactory: Send + Sync {
    fn create(&self, config: ProxyConfig) -> Result<Arc<dyn DnsProxy>, DomainError>;
}
