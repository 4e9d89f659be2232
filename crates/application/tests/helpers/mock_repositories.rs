#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use sluice_dns_application::ports::{
    BootstrapResolver, CommonUpstreamConfig, ConfigPersistence, DnsProxy, DnsProxyFactory,
    ExchangeMode,
    ManagedUpstreamFileRepository, ProxyConfig, ProxySettings, ReloadBundle,
    ResolutionReloader, ResolutionServer, StaticUpstreamSource, UpstreamFileRefresherPort,
    UpstreamGroup, UpstreamGroupFactory, UpstreamGroupProvider, UpstreamOptions,
};
use sluice_dns_domain::{
    DnsConfig, DomainError, FetchedList, ManagedFilesSnapshot, ManagedUpstreamFile,
    RefreshOutcome, UpstreamGroupKind,
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::RwLock;

// ============================================================================
// Mock BootstrapResolver
// ============================================================================

#[derive(Debug, Default)]
pub struct MockBootstrap;

#[async_trait]
impl BootstrapResolver for MockBootstrap {
    async fn resolve(&self, _host: &str, port: u16) -> Result<Vec<SocketAddr>, DomainError> {
        Ok(vec![SocketAddr::from(([127, 0, 0, 1], port))])
    }
}

// ============================================================================
// Mock UpstreamGroup
// ============================================================================

#[derive(Debug)]
pub struct MockUpstreamGroup {
    pub kind: UpstreamGroupKind,
    pub addresses: Vec<String>,
    closes: AtomicUsize,
    fail_close: bool,
}

impl MockUpstreamGroup {
    pub fn new(kind: UpstreamGroupKind, addresses: Vec<String>) -> Self {
        Self {
            kind,
            addresses,
            closes: AtomicUsize::new(0),
            fail_close: false,
        }
    }

    pub fn failing_close(kind: UpstreamGroupKind) -> Self {
        Self {
            fail_close: true,
            ..Self::new(kind, vec![])
        }
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UpstreamGroup for MockUpstreamGroup {
    fn kind(&self) -> UpstreamGroupKind {
        self.kind
    }

    fn addresses(&self) -> Vec<String> {
        self.addresses.clone()
    }

    fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    async fn exchange(
        &self,
        _domain: &str,
        query: &[u8],
        _mode: ExchangeMode,
    ) -> Result<Vec<u8>, DomainError> {
        Ok(query.to_vec())
    }

    fn close(&self) -> Result<(), DomainError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        if self.fail_close {
            return Err(DomainError::UpstreamClose {
                group: self.kind,
                message: "mock close failure".into(),
            });
        }
        Ok(())
    }
}

// ============================================================================
// Mock UpstreamGroupFactory (main group)
// ============================================================================

#[derive(Default)]
pub struct MockGroupFactory {
    fail: AtomicBool,
    fail_close: AtomicBool,
    built: Mutex<Vec<Arc<MockUpstreamGroup>>>,
    lines: Mutex<Vec<Vec<String>>>,
}

impl MockGroupFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_should_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_close(&self, fail: bool) {
        self.fail_close.store(fail, Ordering::SeqCst);
    }

    pub fn built(&self) -> Vec<Arc<MockUpstreamGroup>> {
        self.built.lock().unwrap().clone()
    }

    pub fn last_lines(&self) -> Option<Vec<String>> {
        self.lines.lock().unwrap().last().cloned()
    }
}

impl UpstreamGroupFactory for MockGroupFactory {
    fn build(
        &self,
        kind: UpstreamGroupKind,
        lines: &[String],
        _options: &UpstreamOptions,
    ) -> Result<Arc<dyn UpstreamGroup>, DomainError> {
        self.lines.lock().unwrap().push(lines.to_vec());
        if self.fail.load(Ordering::SeqCst) {
            return Err(DomainError::UpstreamBuild {
                group: kind,
                message: "mock main failure".into(),
            });
        }
        let group = if self.fail_close.load(Ordering::SeqCst) {
            Arc::new(MockUpstreamGroup::failing_close(kind))
        } else {
            Arc::new(MockUpstreamGroup::new(kind, lines.to_vec()))
        };
        self.built.lock().unwrap().push(group.clone());
        Ok(group)
    }
}

// ============================================================================
// Mock UpstreamGroupProvider (private rDNS / fallback)
// ============================================================================

pub struct MockGroupProvider {
    kind: UpstreamGroupKind,
    fail: AtomicBool,
    built: Mutex<Vec<Arc<MockUpstreamGroup>>>,
}

impl MockGroupProvider {
    pub fn new(kind: UpstreamGroupKind) -> Self {
        Self {
            kind,
            fail: AtomicBool::new(false),
            built: Mutex::new(Vec::new()),
        }
    }

    pub fn set_should_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn built(&self) -> Vec<Arc<MockUpstreamGroup>> {
        self.built.lock().unwrap().clone()
    }
}

impl UpstreamGroupProvider for MockGroupProvider {
    fn build(&self, _options: &UpstreamOptions) -> Result<Arc<dyn UpstreamGroup>, DomainError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(DomainError::UpstreamBuild {
                group: self.kind,
                message: format!("mock {} failure", self.kind),
            });
        }
        let group = Arc::new(MockUpstreamGroup::new(
            self.kind,
            vec![format!("udp://{}.invalid:53", self.kind.as_str().replace(' ', "-"))],
        ));
        self.built.lock().unwrap().push(group.clone());
        Ok(group)
    }
}

// ============================================================================
// Mock DnsProxy / DnsProxyFactory
// ============================================================================

pub struct MockDnsProxy {
    config: ProxyConfig,
}

impl MockDnsProxy {
    pub fn new(config: ProxyConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl DnsProxy for MockDnsProxy {
    fn config(&self) -> &ProxyConfig {
        &self.config
    }

    async fn resolve(&self, query: &[u8]) -> Result<Vec<u8>, DomainError> {
        Ok(query.to_vec())
    }
}

#[derive(Default)]
pub struct MockProxyFactory {
    /// 1-based call number that fails
    fail_on_call: Mutex<Option<usize>>,
    calls: AtomicUsize,
}

impl MockProxyFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on_call(&self, call: usize) {
        *self.fail_on_call.lock().unwrap() = Some(call);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DnsProxyFactory for MockProxyFactory {
    fn create(&self, config: ProxyConfig) -> Result<Arc<dyn DnsProxy>, DomainError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if *self.fail_on_call.lock().unwrap() == Some(call) {
            return Err(DomainError::ProxyBuild("mock proxy failure".into()));
        }
        Ok(Arc::new(MockDnsProxy::new(config)))
    }
}

// ============================================================================
// Mock ResolutionServer
// ============================================================================

pub struct MockResolutionServer {
    bootstrap: Option<Arc<dyn BootstrapResolver>>,
    current: Mutex<Option<Arc<ReloadBundle>>>,
    start_failures: AtomicUsize,
    starts: AtomicUsize,
    stops: AtomicUsize,
    fail_stop: AtomicBool,
    initial_groups: Mutex<Vec<Arc<MockUpstreamGroup>>>,
}

impl MockResolutionServer {
    pub fn new() -> Self {
        Self {
            bootstrap: Some(Arc::new(MockBootstrap)),
            current: Mutex::new(None),
            start_failures: AtomicUsize::new(0),
            starts: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
            fail_stop: AtomicBool::new(false),
            initial_groups: Mutex::new(Vec::new()),
        }
    }

    pub fn without_bootstrap() -> Self {
        Self {
            bootstrap: None,
            ..Self::new()
        }
    }

    /// Server already serving a bundle built with `settings`.
    pub fn serving(settings: ProxySettings) -> Self {
        let server = Self::new();
        let (bundle, groups) = make_bundle_with_groups(settings);
        *server.current.lock().unwrap() = Some(Arc::new(bundle));
        *server.initial_groups.lock().unwrap() = groups;
        server
    }

    /// Main, private and fallback groups of the bundle installed by `serving`.
    pub fn initial_groups(&self) -> Vec<Arc<MockUpstreamGroup>> {
        self.initial_groups.lock().unwrap().clone()
    }

    pub fn fail_next_starts(&self, count: usize) {
        self.start_failures.store(count, Ordering::SeqCst);
    }

    pub fn set_fail_stop(&self, fail: bool) {
        self.fail_stop.store(fail, Ordering::SeqCst);
    }

    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResolutionServer for MockResolutionServer {
    fn bootstrap(&self) -> Option<Arc<dyn BootstrapResolver>> {
        self.bootstrap.clone()
    }

    fn current(&self) -> Option<Arc<ReloadBundle>> {
        self.current.lock().unwrap().clone()
    }

    fn install(&self, bundle: ReloadBundle) -> Option<Arc<ReloadBundle>> {
        self.current.lock().unwrap().replace(Arc::new(bundle))
    }

    async fn start(&self) -> Result<(), DomainError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        let remaining = self.start_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.start_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(DomainError::StartFailed("address in use".into()));
        }
        Ok(())
    }

    async fn stop(&self) -> Result<(), DomainError> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        if self.fail_stop.load(Ordering::SeqCst) {
            return Err(DomainError::IoError("mock stop failure".into()));
        }
        Ok(())
    }
}

/// Bundle whose groups are plain mocks, returned alongside the bundle.
pub fn make_bundle_with_groups(
    settings: ProxySettings,
) -> (ReloadBundle, Vec<Arc<MockUpstreamGroup>>) {
    let mocks = vec![
        Arc::new(MockUpstreamGroup::new(
            UpstreamGroupKind::Main,
            vec!["1.1.1.1".into()],
        )),
        Arc::new(MockUpstreamGroup::new(UpstreamGroupKind::PrivateRdns, vec![])),
        Arc::new(MockUpstreamGroup::new(UpstreamGroupKind::Fallback, vec![])),
    ];
    let main: Arc<dyn UpstreamGroup> = mocks[0].clone();
    let private_rdns: Arc<dyn UpstreamGroup> = mocks[1].clone();
    let fallback: Arc<dyn UpstreamGroup> = mocks[2].clone();
    let proxy: Arc<dyn DnsProxy> = Arc::new(MockDnsProxy::new(ProxyConfig {
        upstream: main.clone(),
        private_rdns: private_rdns.clone(),
        fallbacks: Some(fallback.clone()),
        settings,
    }));

    let bundle = ReloadBundle {
        main,
        private_rdns,
        fallback,
        internal_proxy: proxy.clone(),
        dns_proxy: proxy,
        common: CommonUpstreamConfig {
            bootstrap: Arc::new(MockBootstrap),
            timeout: Duration::from_secs(10),
            prefer_ipv6: false,
            edns_client_subnet_enabled: false,
            use_http3: false,
        },
    };
    (bundle, mocks)
}

pub fn primary_settings() -> ProxySettings {
    ProxySettings::primary(&DnsConfig::default(), vec![])
}

// ============================================================================
// Mock StaticUpstreamSource
// ============================================================================

pub struct MockStaticSource {
    upstreams: Vec<String>,
}

impl MockStaticSource {
    pub fn new(upstreams: Vec<&str>) -> Self {
        Self {
            upstreams: upstreams.into_iter().map(String::from).collect(),
        }
    }
}

#[async_trait]
impl StaticUpstreamSource for MockStaticSource {
    async fn load(&self) -> Result<Vec<String>, DomainError> {
        Ok(self.upstreams.clone())
    }
}

// ============================================================================
// Mock ManagedUpstreamFileRepository
// ============================================================================

#[derive(Default)]
pub struct MockFileRepository {
    files: RwLock<Vec<ManagedUpstreamFile>>,
    contents: RwLock<HashMap<String, Vec<String>>>,
    fail_load: AtomicBool,
    fail_replace: AtomicBool,
}

impl MockFileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn with_files(files: Vec<ManagedUpstreamFile>) -> Self {
        let repo = Self::new();
        *repo.files.write().await = files;
        repo
    }

    pub async fn set_content(&self, url: &str, lines: Vec<&str>) {
        self.contents
            .write()
            .await
            .insert(url.to_string(), lines.into_iter().map(String::from).collect());
    }

    pub fn set_fail_load(&self, fail: bool) {
        self.fail_load.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_replace(&self, fail: bool) {
        self.fail_replace.store(fail, Ordering::SeqCst);
    }

    pub async fn count(&self) -> usize {
        self.files.read().await.len()
    }

    pub async fn find(&self, url: &str) -> Option<ManagedUpstreamFile> {
        self.files.read().await.iter().find(|f| f.url == url).cloned()
    }
}

#[async_trait]
impl ManagedUpstreamFileRepository for MockFileRepository {
    async fn snapshot(&self) -> ManagedFilesSnapshot {
        ManagedFilesSnapshot {
            files: self.files.read().await.clone(),
            update_interval_hours: 24,
        }
    }

    async fn load_upstreams(&self) -> Result<Vec<String>, DomainError> {
        if self.fail_load.load(Ordering::SeqCst) {
            return Err(DomainError::ManagedFileRead {
                path: "data/upstream_dns/1.txt".into(),
                message: "permission denied".into(),
            });
        }
        let files = self.files.read().await;
        let contents = self.contents.read().await;
        Ok(files
            .iter()
            .filter(|f| f.enabled)
            .flat_map(|f| contents.get(&f.url).cloned().unwrap_or_default())
            .collect())
    }

    async fn find_by_url(&self, url: &str) -> Option<ManagedUpstreamFile> {
        self.files.read().await.iter().find(|f| f.url == url).cloned()
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
        if self.fail_replace.load(Ordering::SeqCst) {
            return Err(DomainError::IoError("mock write failure".into()));
        }
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
    passes: AtomicUsize,
}

impl MockRefresher {
    pub fn new() -> Self {
        Self {
            outcome: Mutex::new(Some(RefreshOutcome::default())),
            fetch_error: Mutex::new(None),
            fetches: AtomicUsize::new(0),
            passes: AtomicUsize::new(0),
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

    pub fn pass_count(&self) -> usize {
        self.passes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UpstreamFileRefresherPort for MockRefresher {
    async fn try_refresh(&self, _force: bool) -> Option<RefreshOutcome> {
        self.passes.fetch_add(1, Ordering::SeqCst);
        *self.outcome.lock().unwrap()
    }

    async fn fetch_validated(&self, _url: &str) -> Result<FetchedList, DomainError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let fetch_error = *self.fetch_error.lock().unwrap();
        if let Some(make) = fetch_error {
            return Err(make());
        }
        Ok(FetchedList {
            content: "1.1.1.1\n8.8.8.8\n".into(),
            rules_count: 2,
            checksum: "abc".into(),
        })
    }
}

// ============================================================================
// Mock ConfigPersistence / ResolutionReloader
// ============================================================================

#[derive(Default)]
pub struct MockPersistence {
    saves: AtomicUsize,
    last: Mutex<Option<ManagedFilesSnapshot>>,
}

impl MockPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn last_saved(&self) -> Option<ManagedFilesSnapshot> {
        self.last.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConfigPersistence for MockPersistence {
    async fn save_upstream_files(&self, snapshot: &ManagedFilesSnapshot) -> Result<(), DomainError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some(snapshot.clone());
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

pub fn make_file(id: i64, url: &str, enabled: bool) -> ManagedUpstreamFile {
    let mut file = ManagedUpstreamFile::new(id, url, format!("list {}", id));
    file.enabled = enabled;
    file
}
