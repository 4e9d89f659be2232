use async_trait::async_trait;
use bytes::Bytes;
use sluice_dns_domain::{DomainError, FetchedList, RefreshOutcome};

/// Retrieves raw list content from a URL or a local path.
///
/// Connectivity failures are reported as `DomainError::Network`, anything
/// else as a content or I/O error.
#[async_trait]
pub trait FileFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Bytes, DomainError>;
}

#[async_trait]
pub trait UpstreamFileRefresherPort: Send + Sync {
    /// Runs one refresh pass unless another one is in flight.
    ///
    /// Returns `None` without waiting when the pass could not be acquired.
    async fn try_refresh(&self, force: bool) -> Option<RefreshOutcome>;

    /// Fetches and validates content without touching the cache.
    async fn fetch_validated(&self, url: &str) -> Result<FetchedList, DomainError>;
}
