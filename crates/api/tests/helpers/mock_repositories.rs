#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use sluice_dns_application::ports::{
    ConfigPersistence, ManagedUpstreamFileRepository, ResolutionReloader,
    UpstreamFileRefresherPort,
};
use sluice_dns_domain::{
    DomainError, FetchedList, ManagedFilesSnapshot, ManagedUpstreamFile, RefreshOutcome,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::RwLock;

// ============================================================================
// In-memory ManagedUpstreamFileRepository
// ============================================================================

#[derive(Default)]
pub struct InMemoryFileRepository {
    files: RwLock<Vec<ManagedUpstreamFile>>,
}

impl InMemoryFileRepository {
    pub fn with_files(files: Vec<ManagedUpstreamFile>) -> Self {
        Self {
            files: RwLock::new(files),
        }
    }

    pub async fn find(&self, url: &str) -> Option<ManagedUpstreamFile> {
        self.files.read().await.iter().find(|f| f.url == url).cloned()
    }

    pub async fn count(&self) -> usize {
        self.files.read().await.len()
    }
}

#[async_trait]
impl ManagedUpstreamFileRepository for InMemoryFileRepository {
    async fn snapshot(&self) -> ManagedFilesSnapshot {
        ManagedFilesSnapshot {
            files: self.files.read().await.clone(),
            update_interval_hours: 24,
        }
    }

    async fn load_upstreams(&self) -> Result<Vec<String>, DomainError> {
        Ok(Vec::new())
    }

    async fn find_by_url(&self, url: &str) -> Option<ManagedUpstreamFile> {
        self.find(url).await
    }

    async fn add(
        &self,
        name: &str,
        url: &str,
        content: &FetchedList,
    ) -> Result<ManagedUpstreamFile, DomainError> {
        let mut files = self.files.write().await;
        let id = files.iter().map(|f| f.id).max().unwrap_or(0) + 1;
        let mut file = ManagedUpstreamFile::new(id, url, name);
        file.rules_count = content.rules_count;
        file.checksum = Some(content.checksum.clone());
        file.last_updated = Some(Utc::now());
        files.push(file.clone());
        Ok(file)
    }

    async fn remove(&self, url: &str) -> Result<ManagedUpstreamFile, DomainError> {
        let mut files = self.files.write().await;
        let pos = files
            .iter()
            .position(|f| f.url == url)
            .ok_or_else(|| DomainError::ManagedFileNotFound(url.to_string()))?;
        Ok(files.remove(pos))
    }

    async fn replace(
        &self,
        url: &str,
        mut updated: ManagedUpstreamFile,
        content: Option<&FetchedList>,
    ) -> Result<ManagedUpstreamFile, DomainError> {
        let mut files = self.files.write().await;
        let slot = files
            .iter_mut()
            .find(|f| f.url == url)
            .ok_or_else(|| DomainError::ManagedFileNotFound(url.to_string()))?;
        if let Some(content) = content {
            updated.rules_count = content.rules_count;
            updated.checksum = Some(content.checksum.clone());
            updated.last_updated = Some(Utc::now());
        }
        *slot = updated.clone();
        Ok(updated)
    }
}

// ============================================================================
// Mock UpstreamFileRefresherPort
// ============================================================================

pub struct MockRefresher {
    outcome: Mutex<Option<RefreshOutcome>>,
    fetch_error: Mutex<Option<fn() -> DomainError>>,
    fetches: AtomicUsize,
}

impl MockRefresher {
    pub fn new() -> Self {
        Self {
            outcome: Mutex::new(Some(RefreshOutcome::default())),
            fetch_error: Mutex::new(None),
            fetches: AtomicUsize::new(0),
        }
    }

    /// `None` simulates a pass already in flight.
    pub fn set_outcome(&self, outcome: Option<RefreshOutcome>) {
        *self.outcome.lock().unwrap() = outcome;
    }

    pub fn set_fetch_error(&self, make: fn() -> DomainError) {
        *self.fetch_error.lock().unwrap() = Some(make);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UpstreamFileRefresherPort for MockRefresher {
    async fn try_refresh(&self, _force: bool) -> Option<RefreshOutcome> {
        *self.outcome.lock().unwrap()
    }

    async fn fetch_validated(&self, _url: &str) -> Result<FetchedList, DomainError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let fetch_error = *self.fetch_error.lock().unwrap();
        if let Some(make) = fetch_error {
            return Err(make());
        }
        Ok(FetchedList {
            content: "1.1.1.1\n[/lan/]192.168.1.1\n9.9.9.9\n".into(),
            rules_count: 3,
            checksum: "c0ffee".into(),
        })
    }
}

// ============================================================================
// Mock ConfigPersistence / ResolutionReloader
// ============================================================================

#[derive(Default)]
pub struct MockPersistence {
    saves: AtomicUsize,
}

impl MockPersistence {
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConfigPersistence for MockPersistence {
    async fn save_upstream_files(&self, _snapshot: &ManagedFilesSnapshot) -> Result<(), DomainError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
pub struct MockReloader {
    reloads: AtomicUsize,
}

impl MockReloader {
    pub fn reload_count(&self) -> usize {
        self.reloads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResolutionReloader for MockReloader {
    async fn reload(&self) -> Result<(), DomainError> {
        self.reloads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub fn make_file(id: i64, url: &str, enabled: bool) -> ManagedUpstreamFile {
    let mut file = ManagedUpstreamFile::new(id, url, format!("list {}", id));
    file.enabled = enabled;
    file.rules_count = 2;
    file
}
