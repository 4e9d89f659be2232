use async_trait::async_trait;
use sluice_dns_domain::DomainError;
use std::sync::Arc;
use std::time::Duration;

use super::{BootstrapResolver, DnsProxy, UpstreamGroup};

/// Upstream settings shared with per-client upstream construction.
#[derive(Debug, Clone)]
pub struct CommonUpstreamConfig {
    pub bootstrap: Arc<dyn BootstrapResolver>,
    pub timeout: Duration,
    pub prefer_ipv6: bool,
    pub edns_client_subnet_enabled: bool,
    pub use_http3: bool,
}

/// Fully built resolution state, ready to be swapped into the live server.
///
/// The bundle owns its three upstream groups. Once installed, ownership
/// moves to the server; a bundle that is discarded must be released.
pub struct ReloadBundle {
    pub main: Arc<dyn UpstreamGroup>,
    pub private_rdns: Arc<dyn UpstreamGroup>,
    pub fallback: Arc<dyn UpstreamGroup>,
    pub internal_proxy: Arc<dyn DnsProxy>,
    pub dns_proxy: Arc<dyn DnsProxy>,
    pub common: CommonUpstreamConfig,
}

impl ReloadBundle {
    /// Closes the groups in reverse build order.
    ///
    /// Every group is closed even when an earlier close fails; the first
    /// failure is the root of the returned error.
    pub fn release(&self) -> Result<(), DomainError> {
        let errors: Vec<DomainError> = [&self.fallback, &self.private_rdns, &self.main]
            .into_iter()
            .filter_map(|group| group.close().err())
            .collect();

        match DomainError::join(errors) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// The live DNS server whose resolution state is hot-swapped.
#[async_trait]
pub trait ResolutionServer: Send + Sync {
    fn bootstrap(&self) -> Option<Arc<dyn BootstrapResolver>>;

    /// Currently serving state, if any was installed.
    fn current(&self) -> Option<Arc<ReloadBundle>>;

    /// Replaces the serving state in one atomic step and returns the previous one.
    fn install(&self, bundle: ReloadBundle) -> Option<Arc<ReloadBundle>>;

    async fn start(&self) -> Result<(), DomainError>;

    async fn stop(&self) -> Result<(), DomainError>;
}

/// Rebuilds and reactivates the resolution state.
#[async_trait]
pub trait ResolutionReloader: Send + Sync {
    async fn reload(&self) -> Result<(), DomainError>;
}
