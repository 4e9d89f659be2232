#![allow(dead_code)]

use async_trait::async_trait;
use sluice_dns_application::ports::{
    ConfigPersistence, ManagedUpstreamFileRepository, ResolutionReloader,
    UpstreamFileRefresherPort,
};
use sluice_dns_domain::{
    DomainError, FetchedList, ManagedFilesSnapshot, ManagedUpstreamFile, RefreshOutcome,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

// ============================================================================
// Mock UpstreamFileRefresherPort
// ============================================================================

pub struct MockRefresher {
    outcome: Mutex<Option<RefreshOutcome>>,
    passes: AtomicUsize,
    forced: AtomicUsize,
}

impl MockRefresher {
    pub fn returning(outcome: Option<RefreshOutcome>) -> Self {
        Self {
            outcome: Mutex::new(outcome),
            passes: AtomicUsize::new(0),
            forced: AtomicUsize::new(0),
        }
    }

    pub fn pass_count(&self) -> usize {
        self.passes.load(Ordering::SeqCst)
    }

    pub fn forced_count(&self) -> usize {
        self.forced.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UpstreamFileRefresherPort for MockRefresher {
    async fn try_refresh(&self, force: bool) -> Option<RefreshOutcome> {
        self.passes.fetch_add(1, Ordering::SeqCst);
        if force {
            self.forced.fetch_add(1, Ordering::SeqCst);
        }
        *self.outcome.lock().unwrap()
    }

    async fn fetch_validated(&self, url: &str) -> Result<FetchedList, DomainError> {
        Err(DomainError::Network(format!("{} unreachable", url)))
    }
}

// ============================================================================
// Mock ManagedUpstreamFileRepository
// ============================================================================

#[derive(Default)]
pub struct EmptyFileRepository;

#[async_trait]
impl ManagedUpstreamFileRepository for EmptyFileRepository {
    async fn snapshot(&self) -> ManagedFilesSnapshot {
        ManagedFilesSnapshot {
            files: Vec::new(),
            update_interval_hours: 24,
        }
    }

    async fn load_upstreams(&self) -> Result<Vec<String>, DomainError> {
        Ok(Vec::new())
    }

    async fn find_by_url(&self, _url: &str) -> Option<ManagedUpstreamFile> {
        None
    }

    async fn add(
        &self,
        _name: &str,
        url: &str,
        _content: &FetchedList,
    ) -> Result<ManagedUpstreamFile, DomainError> {
        Err(DomainError::IoError(format!("read-only repository: {}", url)))
    }

    async fn remove(&self, url: &str) -> Result<ManagedUpstreamFile, DomainError> {
        Err(DomainError::ManagedFileNotFound(url.to_string()))
    }

    async fn replace(
        &self,
        url: &str,
        _updated: ManagedUpstreamFile,
        _content: Option<&FetchedList>,
    ) -> Result<ManagedUpstreamFile, DomainError> {
        Err(DomainError::ManagedFileNotFound(url.to_string()))
    }
}

// ============================================================================
// Mock ConfigPersistence / ResolutionReloader
// ============================================================================

#[derive(Default)]
pub struct MockPersistence {
    saves: AtomicUsize,
    should_fail: AtomicBool,
}

impl MockPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let persistence = Self::default();
        persistence.should_fail.store(true, Ordering::SeqCst);
        persistence
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConfigPersistence for MockPersistence {
    async fn save_upstream_files(&self, _snapshot: &ManagedFilesSnapshot) -> Result<(), DomainError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(DomainError::IoError("config file is read-only".into()));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MockReloader {
    reloads: AtomicUsize,
}

impl MockReloader {
    pub fn new() -> Self {
        Self::default()
    }

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
