use sluice_dns_domain::{DomainError, RefreshOutcome};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::ports::{
    ConfigPersistence, ManagedUpstreamFileRepository, ResolutionReloader,
    UpstreamFileRefresherPort,
};

/// Runs a refresh pass and reloads the resolution state when files changed.
pub struct RefreshUpstreamFilesUseCase {
    refresher: Arc<dyn UpstreamFileRefresherPort>,
    repository: Arc<dyn ManagedUpstreamFileRepository>,
    persistence: Arc<dyn ConfigPersistence>,
    reloader: Arc<dyn ResolutionReloader>,
}

impl RefreshUpstreamFilesUseCase {
    pub fn new(
        refresher: Arc<dyn UpstreamFileRefresherPort>,
        repository: Arc<dyn ManagedUpstreamFileRepository>,
        persistence: Arc<dyn ConfigPersistence>,
        reloader: Arc<dyn ResolutionReloader>,
    ) -> Self {
        Self {
            refresher,
            repository,
            persistence,
            reloader,
        }
    }

    /// Returns `Ok(None)` when another pass is already running.
    #[instrument(skip(self))]
    pub async fn execute(&self, force: bool) -> Result<Option<RefreshOutcome>, DomainError> {
        let Some(outcome) = self.refresher.try_refresh(force).await else {
            info!(force, "Upstream DNS files refresh already running");
            return Ok(None);
        };

        info!(
            updated = outcome.updated,
            network_error = outcome.network_error,
            force,
            "Upstream DNS files refresh finished"
        );

        if outcome.network_error {
            warn!("Upstream DNS files refresh hit a network error; keeping cached lists");
            return Ok(Some(outcome));
        }

        self.persistence
            .save_upstream_files(&self.repository.snapshot().await)
            .await?;

        if outcome.updated > 0 {
            self.reloader.reload().await?;
        }

        Ok(Some(outcome))
    }
}
