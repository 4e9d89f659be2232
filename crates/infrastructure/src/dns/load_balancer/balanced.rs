use super::query::{query_server, QueryAttemptResult};
use crate::dns::upstream::UpstreamServer;
use sluice_dns_domain::DomainError;
use std::sync::Arc;
use tracing::debug;

/// Tries upstreams one at a time, faster ones more likely first.
///
/// Order is a weighted shuffle by inverse observed latency, so a slow or
/// failing upstream still gets picked now and then.
pub struct BalancedStrategy;

impl BalancedStrategy {
    pub fn new() -> Self {
        Self
    }

    pub async fn exchange(
        &self,
        servers: &[Arc<UpstreamServer>],
        query_bytes: &[u8],
    ) -> Result<QueryAttemptResult, DomainError> {
        if servers.is_empty() {
            return Err(DomainError::Network("No upstream servers available".into()));
        }

        let mut last_error = None;
        for idx in weighted_order(servers) {
            let server = &servers[idx];
            match query_server(server, query_bytes).await {
                Ok(r) => return Ok(r),
                Err(e) => {
                    debug!(server = %server.display(), error = %e, "Upstream failed, trying next");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| DomainError::Network("All upstreams failed".into())))
    }
}

impl Default for BalancedStrategy {
    fn default() -> Self {
        Self::new()
    }
}

/// Indices of `servers` in weighted-random order.
fn weighted_order(servers: &[Arc<UpstreamServer>]) -> Vec<usize> {
    let mut pool: Vec<(usize, u64)> = servers
        .iter()
        .enumerate()
        .map(|(i, s)| (i, 1_000_000_000 / s.latency_us().max(1)))
        .map(|(i, w)| (i, w.max(1)))
        .collect();

    let mut order = Vec::with_capacity(pool.len());
    while !pool.is_empty() {
        let total: u64 = pool.iter().map(|(_, w)| w).sum();
        let mut pick = fastrand::u64(..total);
        let pos = pool
            .iter()
            .position(|(_, w)| {
                if pick < *w {
                    true
                } else {
                    pick -= w;
                    false
                }
            })
            .unwrap_or(pool.len() - 1);
        order.push(pool.swap_remove(pos).0);
    }
    order
}
