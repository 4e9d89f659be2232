use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use sluice_dns_application::ports::{
    FileFetcher, ManagedUpstreamFileRepository, UpstreamFileRefresherPort,
};
use sluice_dns_domain::{DomainError, FetchedList, ManagedUpstreamFile, RefreshOutcome};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use super::guard::RefreshGuard;
use super::validation::validate_list_content;
use crate::repositories::ManagedFileStore;

/// Refreshes the cached content of managed upstream files.
///
/// A pass fetches every candidate first and only commits once all fetches
/// have finished, so a connectivity failure leaves every cache untouched.
pub struct UpstreamFileRefresher {
    store: Arc<ManagedFileStore>,
    fetcher: Arc<dyn FileFetcher>,
    guard: RefreshGuard,
    cancel: CancellationToken,
}

impl UpstreamFileRefresher {
    pub fn new(store: Arc<ManagedFileStore>, fetcher: Arc<dyn FileFetcher>) -> Self {
        Self {
            store,
            fetcher,
            guard: RefreshGuard::new(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn is_running(&self) -> bool {
        self.guard.is_busy()
    }

    /// Runs one pass. Callers must hold the refresh permit.
    #[instrument(skip(self))]
    async fn refresh(&self, force: bool) -> RefreshOutcome {
        let snapshot = self.store.snapshot().await;
        let now = Utc::now();
        let candidates: Vec<ManagedUpstreamFile> = snapshot
            .files
            .into_iter()
            .filter(|f| f.enabled && (force || f.is_stale(snapshot.update_interval_hours, now)))
            .collect();

        if candidates.is_empty() {
            debug!("No upstream DNS files due for refresh");
            return RefreshOutcome::default();
        }

        let fetches = join_all(
            candidates
                .iter()
                .map(|file| self.fetch_validated(&file.url)),
        );

        let results = tokio::select! {
            results = fetches => results,
            _ = self.cancel.cancelled() => {
                info!("Upstream DNS file refresh cancelled");
                return RefreshOutcome {
                    updated: 0,
                    network_error: true,
                };
            }
        };

        let mut ready: Vec<(ManagedUpstreamFile, FetchedList)> = Vec::with_capacity(results.len());
        for (file, result) in candidates.into_iter().zip(results) {
            match result {
                Ok(list) => ready.push((file, list)),
                Err(e) if e.is_network() => {
                    warn!(url = %file.url, error = %e, "Network error refreshing upstream DNS files");
                    return RefreshOutcome {
                        updated: 0,
                        network_error: true,
                    };
                }
                Err(e) => {
                    warn!(id = file.id, url = %file.url, error = %e, "Skipping upstream DNS file");
                }
            }
        }

        let mut updated = 0;
        for (file, list) in ready {
            match self.store.commit_refreshed(&file, &list, Utc::now()).await {
                Ok(true) => {
                    info!(id = file.id, url = %file.url, rules = list.rules_count, "Upstream DNS file updated");
                    updated += 1;
                }
                Ok(false) => debug!(id = file.id, "Upstream DNS file unchanged"),
                Err(e) => error!(id = file.id, error = %e, "Failed to store upstream DNS file"),
            }
        }

        RefreshOutcome {
            updated,
            network_error: false,
        }
    }
}

#[async_trait]
impl UpstreamFileRefresherPort for UpstreamFileRefresher {
    async fn try_refresh(&self, force: bool) -> Option<RefreshOutcome> {
        let _permit = self.guard.try_acquire()?;
        Some(self.refresh(force).await)
    }

    async fn fetch_validated(&self, url: &str) -> Result<FetchedList, DomainError> {
        let bytes = tokio::select! {
            bytes = self.fetcher.fetch(url) => bytes?,
            _ = self.cancel.cancelled() => return Err(DomainError::Cancelled),
        };
        validate_list_content(&bytes)
    }
}
