use async_trait::async_trait;
use sluice_dns_domain::{
    DomainError, FetchedList, ManagedFilesSnapshot, ManagedUpstreamFile,
};

/// Owner of the managed upstream file set and its on-disk caches.
///
/// Readers share the set, writers take it exclusively. No method holds the
/// lock across network I/O.
#[async_trait]
pub trait ManagedUpstreamFileRepository: Send + Sync {
    async fn snapshot(&self) -> ManagedFilesSnapshot;

    /// Upstream lines of every enabled file, in set order.
    ///
    /// A missing cache file contributes nothing. Any other read failure
    /// aborts the load with an error naming the path.
    async fn load_upstreams(&self) -> Result<Vec<String>, DomainError>;

    async fn find_by_url(&self, url: &str) -> Option<ManagedUpstreamFile>;

    /// Writes the cache for a new file and appends it with a fresh id.
    async fn add(
        &self,
        name: &str,
        url: &str,
        content: &FetchedList,
    ) -> Result<ManagedUpstreamFile, DomainError>;

    /// Moves the cache aside and drops the entry.
    async fn remove(&self, url: &str) -> Result<ManagedUpstreamFile, DomainError>;

    /// Commits a fully validated replacement for the entry currently at `url`.
    ///
    /// When `content` is given the cache is rewritten before the entry is
    /// swapped; a failed write leaves both the entry and the cache untouched.
    async fn replace(
        &self,
        url: &str,
        updated: ManagedUpstreamFile,
        content: Option<&FetchedList>,
    ) -> Result<ManagedUpstreamFile, DomainError>;
}
