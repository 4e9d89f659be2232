use sluice_dns_domain::validators::{validate_list_url, validate_source_name};
use sluice_dns_domain::{DomainError, ManagedFileUpdate, ManagedUpstreamFile};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::ports::{
    ConfigPersistence, ManagedUpstreamFileRepository, ResolutionReloader,
    UpstreamFileRefresherPort,
};

/// Updates name, URL and enabled flag of a managed file.
///
/// The replacement is built and validated on a copy; the stored entry only
/// changes once everything succeeded.
pub struct SetUpstreamFilePropertiesUseCase {
    repository: Arc<dyn ManagedUpstreamFileRepository>,
    refresher: Arc<dyn UpstreamFileRefresherPort>,
    persistence: Arc<dyn ConfigPersistence>,
    reloader: Arc<dyn ResolutionReloader>,
}

impl SetUpstreamFilePropertiesUseCase {
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

    #[instrument(skip(self, update))]
    pub async fn execute(
        &self,
        url: &str,
        update: ManagedFileUpdate,
    ) -> Result<ManagedUpstreamFile, DomainError> {
        let url = url.trim();
        let new_url = update.url.trim();
        let new_name = update.name.trim();
        validate_source_name(new_name, "upstream DNS file")?;
        validate_list_url(new_url)?;

        let current = self
            .repository
            .find_by_url(url)
            .await
            .ok_or_else(|| DomainError::ManagedFileNotFound(url.to_string()))?;

        let url_changed = current.url != new_url;
        if url_changed && self.repository.find_by_url(new_url).await.is_some() {
            return Err(DomainError::ManagedFileExists(new_url.to_string()));
        }

        let mut proposed = current.clone();
        proposed.name = new_name.to_string();
        if url_changed {
            proposed.url = new_url.to_string();
            proposed.last_updated = None;
            proposed.unload();
        }
        let restart = url_changed || current.enabled != update.enabled;
        proposed.enabled = update.enabled;

        let fetched = if restart && proposed.enabled {
            Some(self.refresher.fetch_validated(&proposed.url).await?)
        } else {
            None
        };

        let updated = self
            .repository
            .replace(url, proposed, fetched.as_ref())
            .await?;

        self.persistence
            .save_upstream_files(&self.repository.snapshot().await)
            .await?;

        info!(
            id = updated.id,
            url = %updated.url,
            enabled = updated.enabled,
            restart,
            "Upstream DNS file updated"
        );

        if restart {
            self.reloader.reload().await?;
        }

        Ok(updated)
    }
}
