use super::query::{query_server, QueryAttemptResult};
use crate::dns::upstream::UpstreamServer;
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use sluice_dns_domain::DomainError;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Queries every upstream at once and keeps the first answer.
///
/// With `fastest_timeout` set, answers carrying addresses win; address-less
/// answers are held back until the window closes.
pub struct ParallelStrategy {
    fastest_timeout: Option<Duration>,
}

impl ParallelStrategy {
    pub fn new() -> Self {
        Self {
            fastest_timeout: None,
        }
    }

    pub fn fastest(window: Duration) -> Self {
        Self {
            fastest_timeout: Some(window),
        }
    }

    pub async fn exchange(
        &self,
        servers: &[Arc<UpstreamServer>],
        query_bytes: &[u8],
    ) -> Result<QueryAttemptResult, DomainError> {
        if servers.is_empty() {
            return Err(DomainError::Network("No upstream servers available".into()));
        }
        debug!(strategy = "parallel", servers = servers.len(), "Racing all upstreams");

        let window = self
            .fastest_timeout
            .unwrap_or_else(|| servers.iter().map(|s| s.timeout()).max().unwrap_or_default());
        let prefer_addresses = self.fastest_timeout.is_some();

        let mut abort_handles = Vec::with_capacity(servers.len());
        let mut futs = FuturesUnordered::new();

        for server in servers {
            let server = Arc::clone(server);
            let query = query_bytes.to_vec();
            let handle = tokio::spawn(async move { query_server(&server, &query).await });
            abort_handles.push(handle.abort_handle());
            futs.push(handle);
        }

        let mut held: Option<QueryAttemptResult> = None;
        let mut last_error: Option<DomainError> = None;

        let raced = timeout(window, async {
            while let Some(join_result) = futs.next().await {
                match join_result {
                    Ok(Ok(r)) if !prefer_addresses || !r.response.addresses.is_empty() => {
                        debug!(server = %r.server, latency_ms = r.latency_ms, "Fastest response");
                        return Some(r);
                    }
                    Ok(Ok(r)) => {
                        if held.is_none() {
                            held = Some(r);
                        }
                    }
                    Ok(Err(e)) => {
                        debug!(error = %e, "Server failed");
                        last_error = Some(e);
                    }
                    Err(e) => warn!(error = %e, "Task panicked"),
                }
            }
            None
        })
        .await;

        for handle in &abort_handles {
            handle.abort();
        }

        let timed_out = match raced {
            Ok(Some(winner)) => return Ok(winner),
            Ok(None) => false,
            Err(_) => true,
        };
        if let Some(held) = held {
            return Ok(held);
        }
        Err(match last_error {
            _ if timed_out => DomainError::Network(format!(
                "Parallel query timeout after {}ms",
                window.as_millis()
            )),
            Some(e) => e,
            None => DomainError::Network("All parallel queries failed".into()),
        })
    }
}

impl Default for ParallelStrategy {
    fn default() -> Self {
        Self::new()
    }
}
