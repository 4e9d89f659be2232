use crate::UpstreamFilesSyncJob;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

/// Central orchestrator for all background jobs.
///
/// Register jobs with the builder methods, then call `.start()` once.
///
/// # Example
///
/// ```rust,ignore
/// let handles = JobRunner::new()
///     .with_upstream_files_sync(UpstreamFilesSyncJob::new(refresh).with_interval(3600))
///     .start()
///     .await;
/// ```
pub struct JobRunner {
    upstream_files_sync: Option<UpstreamFilesSyncJob>,
}

impl JobRunner {
    pub fn new() -> Self {
        Self {
            upstream_files_sync: None,
        }
    }

    pub fn with_upstream_files_sync(mut self, job: UpstreamFilesSyncJob) -> Self {
        self.upstream_files_sync = Some(job);
        self
    }

    /// Start all registered background jobs and return their task handles.
    pub async fn start(self) -> Vec<JoinHandle<()>> {
        info!("Starting background job runner");
        let mut handles = Vec::new();

        if let Some(job) = self.upstream_files_sync {
            handles.extend(Arc::new(job).start().await);
        }

        info!(jobs = handles.len(), "All background jobs started");
        handles
    }
}

impl Default for JobRunner {
    fn default() -> Self {
        Self::new()
    }
}
