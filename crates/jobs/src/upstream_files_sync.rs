use sluice_dns_application::use_cases::RefreshUpstreamFilesUseCase;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Default period between checks for stale managed upstream files.
pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 3600;

/// Periodically refreshes stale managed upstream files.
///
/// Each tick runs a non-forced refresh; outcomes are only logged.
pub struct UpstreamFilesSyncJob {
    refresh: Arc<RefreshUpstreamFilesUseCase>,
    interval_secs: u64,
    shutdown: CancellationToken,
}

impl UpstreamFilesSyncJob {
    pub fn new(refresh: Arc<RefreshUpstreamFilesUseCase>) -> Self {
        Self {
            refresh,
            interval_secs: DEFAULT_CHECK_INTERVAL_SECS,
            shutdown: CancellationToken::new(),
        }
    }

    /// Zero disables the job.
    pub fn with_interval(mut self, interval_secs: u64) -> Self {
        self.interval_secs = interval_secs;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    /// Spawns the refresh loop; `None` when the job is disabled.
    pub async fn start(self: Arc<Self>) -> Option<JoinHandle<()>> {
        if self.interval_secs == 0 {
            info!("Upstream DNS files sync job disabled");
            return None;
        }

        info!(
            interval_secs = self.interval_secs,
            "Starting upstream DNS files sync job"
        );

        Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = self.shutdown.cancelled() => {
                        info!("UpstreamFilesSyncJob: shutting down");
                        break;
                    }
                    _ = interval.tick() => self.run_once().await,
                }
            }
        }))
    }

    async fn run_once(&self) {
        match self.refresh.execute(false).await {
            Ok(None) => debug!("UpstreamFilesSyncJob: refresh already running"),
            Ok(Some(outcome)) if outcome.network_error => {
                warn!(updated = outcome.updated, network_error = true, "UpstreamFilesSyncJob: network error")
            }
            Ok(Some(outcome)) => {
                info!(updated = outcome.updated, network_error = false, "UpstreamFilesSyncJob: check completed")
            }
            Err(e) => error!(error = %e, "UpstreamFilesSyncJob: refresh failed"),
        }
    }
}
