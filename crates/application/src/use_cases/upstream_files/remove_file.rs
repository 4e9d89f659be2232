use sluice_dns_domain::{DomainError, ManagedUpstreamFile};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::ports::{ConfigPersistence, ManagedUpstreamFileRepository, ResolutionReloader};

pub struct RemoveUpstreamFileUseCase {
    repository: Arc<dyn ManagedUpstreamFileRepository>,
    persistence: Arc<dyn ConfigPersistence>,
    reloader: Arc<dyn ResolutionReloader>,
}

impl RemoveUpstreamFileUseCase {
    pub fn new(
        repository: Arc<dyn ManagedUpstreamFileRepository>,
        persistence: Arc<dyn ConfigPersistence>,
        reloader: Arc<dyn ResolutionReloader>,
    ) -> Self {
        Self {
            repository,
            persistence,
            reloader,
        }
    }

    /// Removes the file at `url`; a removed enabled file triggers a reload.
    #[instrument(skip(self))]
    pub async fn execute(&self, url: &str) -> Result<ManagedUpstreamFile, DomainError> {
        let removed = self.repository.remove(url.trim()).await?;

        self.persistence
            .save_upstream_files(&self.repository.snapshot().await)
            .await?;

        info!(id = removed.id, url = %removed.url, "Upstream DNS file removed");

        if removed.enabled {
            self.reloader.reload().await?;
        }

        Ok(removed)
    }
}
