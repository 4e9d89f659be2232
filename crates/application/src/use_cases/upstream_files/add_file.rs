use sluice_dns_domain::validators::{validate_list_url, validate_source_name};
use sluice_dns_domain::{DomainError, ManagedUpstreamFile};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::ports::{
    ConfigPersistence, ManagedUpstreamFileRepository, ResolutionReloader,
    UpstreamFileRefresherPort,
};

/// Adds a managed upstream file after fetching and validating its content.
pub struct AddUpstreamFileUseCase {
    repository: Arc<dyn ManagedUpstreamFileRepository>,
    refresher: Arc<dyn UpstreamFileRefresherPort>,
    persistence: Arc<dyn ConfigPersistence>,
    reloader: Arc<dyn ResolutionReloader>,
}

impl AddUpstreamFileUseCase {
    pub fn new(
        repository: Arc<dyn ManagedUpstreamFileRepository>,
        refresher: Arc<dyn UpstreamFileRefresherPort>,
        persistence: Arc<dyn ConfigPersistence>,
        reloader: Arc<dyn ResolutionReloader>,
    ) -> Self {
        Self {
            repository,
            refresher,
            persistence,
            reloader,
        }
    }

    #[instrument(skip(self))]
    pub async fn execute(&self, name: &str, url: &str) -> Result<ManagedUpstreamFile, DomainError> {
        let name = name.trim();
        let url = url.trim();
        validate_source_name(name, "upstream DNS file")?;
        validate_list_url(url)?;

        if self.repository.find_by_url(url).await.is_some() {
            return Err(DomainError::ManagedFileExists(url.to_string()));
        }

        let fetched = self.refresher.fetch_validated(url).await?;
        let file = self.repository.add(name, url, &fetched).await?;

        self.persistence
            .save_upstream_files(&self.repository.snapshot().await)
            .await?;

        info!(
            id = file.id,
            url = %file.url,
            rules_count = file.rules_count,
            "Upstream DNS file added"
        );

        self.reloader.reload().await?;

        Ok(file)
    }
}
