use super::UpstreamServer;
use crate::dns::load_balancer::Strategy;
use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use sluice_dns_application::ports::{ExchangeMode, UpstreamGroup};
use sluice_dns_domain::{DomainError, UpstreamGroupKind};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Upstreams reserved for one domain and its subdomains.
///
/// `servers` is `None` for an exclusion: the domain goes to the general
/// upstreams even when a parent domain is reserved.
#[derive(Debug)]
pub struct ReservedDomain {
    pub domain: String,
    pub servers: Option<Vec<Arc<UpstreamServer>>>,
}

#[derive(Debug)]
struct Routes {
    general: Vec<Arc<UpstreamServer>>,
    reserved: Vec<ReservedDomain>,
}

/// A built upstream group: general upstreams, domain reservations and the
/// configured address strings.
///
/// `close` drops the group's references to its servers. Transports and
/// resolved endpoint caches are freed once in-flight exchanges holding a
/// server finish.
pub struct UpstreamGroupConfig {
    kind: UpstreamGroupKind,
    routes: ArcSwapOption<Routes>,
    addresses: Vec<String>,
    empty: bool,
}

impl UpstreamGroupConfig {
    pub fn new(
        kind: UpstreamGroupKind,
        general: Vec<Arc<UpstreamServer>>,
        mut reserved: Vec<ReservedDomain>,
        addresses: Vec<String>,
    ) -> Self {
        // Longest domain first, so the most specific reservation matches.
        reserved.sort_by(|a, b| b.domain.len().cmp(&a.domain.len()));
        let empty = general.is_empty() && reserved.is_empty();
        Self {
            kind,
            routes: ArcSwapOption::from_pointee(Routes { general, reserved }),
            addresses,
            empty,
        }
    }

    pub fn empty(kind: UpstreamGroupKind) -> Self {
        Self::new(kind, Vec::new(), Vec::new(), Vec::new())
    }

    pub fn is_closed(&self) -> bool {
        self.routes.load().is_none()
    }

    /// Upstreams responsible for `domain`; empty once the group is closed.
    pub fn servers_for(&self, domain: &str) -> Vec<Arc<UpstreamServer>> {
        let Some(routes) = self.routes.load_full() else {
            return Vec::new();
        };
        let domain = domain.trim_end_matches('.').to_ascii_lowercase();
        let matched = routes.reserved.iter().find(|r| {
            domain == r.domain
                || (domain.len() > r.domain.len()
                    && domain.ends_with(r.domain.as_str())
                    && domain.as_bytes()[domain.len() - r.domain.len() - 1] == b'.')
        });

        match matched.and_then(|r| r.servers.as_deref()) {
            Some(servers) => servers.to_vec(),
            None => routes.general.clone(),
        }
    }
}

#[async_trait]
impl UpstreamGroup for UpstreamGroupConfig {
    fn kind(&self) -> UpstreamGroupKind {
        self.kind
    }

    fn addresses(&self) -> Vec<String> {
        self.addresses.clone()
    }

    fn is_empty(&self) -> bool {
        self.empty
    }

    async fn exchange(
        &self,
        domain: &str,
        query: &[u8],
        mode: ExchangeMode,
    ) -> Result<Vec<u8>, DomainError> {
        if self.is_closed() {
            return Err(DomainError::Network(format!(
                "{} upstream group is closed",
                self.kind
            )));
        }

        let servers = self.servers_for(domain);
        if servers.is_empty() {
            return Err(DomainError::Network(format!(
                "no {} upstream for {}",
                self.kind, domain
            )));
        }

        let result = Strategy::from_mode(mode).exchange(&servers, query).await?;
        debug!(group = %self.kind, domain = %domain, server = %result.server, latency_ms = result.latency_ms, "Upstream answered");
        Ok(result.bytes)
    }

    fn close(&self) -> Result<(), DomainError> {
        if self.routes.swap(None).is_none() {
            return Ok(());
        }
        info!(group = %self.kind, upstreams = self.addresses.len(), "Upstream group closed");
        Ok(())
    }
}

impl fmt::Debug for UpstreamGroupConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamGroupConfig")
            .field("kind", &self.kind)
            .field("addresses", &self.addresses.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}
