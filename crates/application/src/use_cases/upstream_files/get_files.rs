use sluice_dns_domain::ManagedFilesSnapshot;
use std::sync::Arc;

use crate::ports::ManagedUpstreamFileRepository;

pub struct GetUpstreamFilesUseCase {
    repository: Arc<dyn ManagedUpstreamFileRepository>,
}

impl GetUpstreamFilesUseCase {
    pub fn new(repository: Arc<dyn ManagedUpstreamFileRepository>) -> Self {
        Self { repository }
    }

    pub async fn execute(&self) -> ManagedFilesSnapshot {
        self.repository.snapshot().await
    }
}
