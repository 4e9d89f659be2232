use async_trait::async_trait;
use sluice_dns_domain::DomainError;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, instrument};

use super::{PrepareReloadUseCase, StartWithRetry};
use crate::ports::{ProxySettings, ReloadBundle, ResolutionReloader, ResolutionServer};

/// Rebuilds the upstream state and swaps it into the live server.
///
/// Only one reload runs at a time; concurrent callers queue on the mutex.
pub struct ReloadUpstreamsUseCase {
    prepare: Arc<PrepareReloadUseCase>,
    server: Arc<dyn ResolutionServer>,
    restart: StartWithRetry,
    lock: Mutex<()>,
}

impl ReloadUpstreamsUseCase {
    pub fn new(
        prepare: Arc<PrepareReloadUseCase>,
        server: Arc<dyn ResolutionServer>,
        restart: StartWithRetry,
    ) -> Self {
        Self {
            prepare,
            server,
            restart,
            lock: Mutex::new(()),
        }
    }

    /// Builds the first state and starts serving it.
    #[instrument(skip(self, settings))]
    pub async fn initialize(&self, settings: ProxySettings) -> Result<(), DomainError> {
        let _guard = self.lock.lock().await;

        let bundle = self.prepare.execute_initial(settings).await?;
        if let Some(previous) = self.server.install(bundle) {
            release_previous(&previous);
        }

        self.restart.execute(|| self.server.start()).await
    }

    #[instrument(skip(self))]
    pub async fn execute(&self) -> Result<(), DomainError> {
        let _guard = self.lock.lock().await;

        let bundle = self.prepare.execute().await?;

        if let Err(e) = self.server.stop().await {
            let deferred = bundle.release().err().into_iter().collect();
            return Err(e.with_deferred(deferred));
        }

        if let Some(previous) = self.server.install(bundle) {
            release_previous(&previous);
        }

        self.restart.execute(|| self.server.start()).await?;

        info!("Upstream configuration reloaded");
        Ok(())
    }
}

fn release_previous(previous: &ReloadBundle) {
    if let Err(e) = previous.release() {
        error!(error = %e, "Failed to release previous upstream configuration");
    }
}

#[async_trait]
impl ResolutionReloader for ReloadUpstreamsUseCase {
    async fn reload(&self) -> Result<(), DomainError> {
        self.execute().await
    }
}
