use sluice_dns_domain::{DnsConfig, DomainError, HttpVersion, UpstreamGroupKind, DEFAULT_UPSTREAM};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::UpstreamListLoader;
use crate::ports::{
    BootstrapResolver, CommonUpstreamConfig, DnsProxyFactory, ProxyConfig, ProxySettings,
    ReloadBundle, ResolutionServer, UpstreamGroup, UpstreamGroupFactory, UpstreamGroupProvider,
    UpstreamOptions,
};

/// Progress of one reload attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadStage {
    Idle,
    Loading,
    BuildingMain,
    BuildingPrivate,
    BuildingProxy,
    BuildingFallback,
    Assembling,
    Ready,
    Aborted,
}

impl ReloadStage {
    fn is_building(self) -> bool {
        matches!(
            self,
            Self::BuildingMain
                | Self::BuildingPrivate
                | Self::BuildingProxy
                | Self::BuildingFallback
                | Self::Assembling
        )
    }
}

/// Stage tracker plus the stack of groups built so far in one attempt.
struct ReloadRun {
    stage: ReloadStage,
    built: Vec<Arc<dyn UpstreamGroup>>,
}

impl ReloadRun {
    fn new() -> Self {
        Self {
            stage: ReloadStage::Idle,
            built: Vec::with_capacity(3),
        }
    }

    fn enter(&mut self, stage: ReloadStage) {
        debug!(from = ?self.stage, to = ?stage, "Reload stage");
        self.stage = stage;
    }

    fn push(&mut self, group: Arc<dyn UpstreamGroup>) {
        self.built.push(group);
    }

    /// Pops and closes every built group, newest first, and joins the
    /// close failures onto `cause`.
    fn abort(&mut self, cause: DomainError) -> DomainError {
        let failed_at = self.stage;
        let mut deferred = Vec::new();
        let released = self.built.len();

        while let Some(group) = self.built.pop() {
            if let Err(e) = group.close() {
                deferred.push(e);
            }
        }

        if failed_at.is_building() {
            self.stage = ReloadStage::Aborted;
        }

        warn!(
            stage = ?failed_at,
            released,
            release_errors = deferred.len(),
            error = %cause,
            "Upstream reload aborted"
        );

        cause.with_deferred(deferred)
    }

    /// Hands the built groups over to the bundle without releasing them.
    fn finish(&mut self) {
        self.built.clear();
        self.enter(ReloadStage::Ready);
    }
}

/// Builds a complete `ReloadBundle` from the current configuration.
///
/// Groups are built in order main, private rDNS, fallback, with the internal
/// proxy created between private and fallback. If any step fails, everything
/// built before it is released in reverse order and the failure is returned
/// as the root cause. The bundle is never installed here.
pub struct PrepareReloadUseCase {
    dns: Arc<DnsConfig>,
    server: Arc<dyn ResolutionServer>,
    loader: Arc<UpstreamListLoader>,
    groups: Arc<dyn UpstreamGroupFactory>,
    private_rdns: Arc<dyn UpstreamGroupProvider>,
    fallback: Arc<dyn UpstreamGroupProvider>,
    proxies: Arc<dyn DnsProxyFactory>,
}

impl PrepareReloadUseCase {
    pub fn new(
        dns: Arc<DnsConfig>,
        server: Arc<dyn ResolutionServer>,
        loader: Arc<UpstreamListLoader>,
        groups: Arc<dyn UpstreamGroupFactory>,
        private_rdns: Arc<dyn UpstreamGroupProvider>,
        fallback: Arc<dyn UpstreamGroupProvider>,
        proxies: Arc<dyn DnsProxyFactory>,
    ) -> Self {
        Self {
            dns,
            server,
            loader,
            groups,
            private_rdns,
            fallback,
            proxies,
        }
    }

    /// Prepares a replacement for the state the server is serving now.
    ///
    /// The primary proxy keeps the live proxy's settings.
    #[instrument(skip(self))]
    pub async fn execute(&self) -> Result<ReloadBundle, DomainError> {
        let bootstrap = self.require_bootstrap()?;
        let current = self.server.current().ok_or_else(|| {
            DomainError::Precondition("dns proxy is not initialized".into())
        })?;
        let settings = current.dns_proxy.config().settings.clone();

        self.build(bootstrap, settings).await
    }

    /// Prepares the first state at startup, before any proxy exists.
    #[instrument(skip(self, settings))]
    pub async fn execute_initial(
        &self,
        settings: ProxySettings,
    ) -> Result<ReloadBundle, DomainError> {
        let bootstrap = self.require_bootstrap()?;
        self.build(bootstrap, settings).await
    }

    fn require_bootstrap(&self) -> Result<Arc<dyn BootstrapResolver>, DomainError> {
        self.server.bootstrap().ok_or_else(|| {
            DomainError::Precondition("bootstrap resolver is not initialized".into())
        })
    }

    fn upstream_options(&self, bootstrap: Arc<dyn BootstrapResolver>) -> UpstreamOptions {
        UpstreamOptions {
            bootstrap,
            timeout: Duration::from_millis(self.dns.upstream_timeout),
            http_versions: HttpVersion::preference(self.dns.use_http3_upstreams),
            prefer_ipv6: self.dns.bootstrap_prefer_ipv6,
            tls: self.dns.tls.clone(),
        }
    }

    async fn build(
        &self,
        bootstrap: Arc<dyn BootstrapResolver>,
        primary_settings: ProxySettings,
    ) -> Result<ReloadBundle, DomainError> {
        let mut run = ReloadRun::new();

        run.enter(ReloadStage::Loading);
        let mut upstreams = self.loader.execute().await.map_err(|e| run.abort(e))?;
        if upstreams.is_empty() {
            upstreams.push(DEFAULT_UPSTREAM.to_string());
        }

        let options = self.upstream_options(bootstrap.clone());

        run.enter(ReloadStage::BuildingMain);
        let main = self
            .groups
            .build(UpstreamGroupKind::Main, &upstreams, &options)
            .map_err(|e| run.abort(e))?;
        run.push(main.clone());

        run.enter(ReloadStage::BuildingPrivate);
        let private_rdns = self.private_rdns.build(&options).map_err(|e| run.abort(e))?;
        run.push(private_rdns.clone());

        run.enter(ReloadStage::BuildingProxy);
        let internal_proxy = self
            .proxies
            .create(ProxyConfig {
                upstream: main.clone(),
                private_rdns: private_rdns.clone(),
                fallbacks: None,
                settings: ProxySettings::internal(&self.dns),
            })
            .map_err(|e| run.abort(e))?;

        run.enter(ReloadStage::BuildingFallback);
        let fallback = self.fallback.build(&options).map_err(|e| run.abort(e))?;
        run.push(fallback.clone());

        run.enter(ReloadStage::Assembling);
        let dns_proxy = self
            .proxies
            .create(ProxyConfig {
                upstream: main.clone(),
                private_rdns: private_rdns.clone(),
                fallbacks: Some(fallback.clone()),
                settings: primary_settings,
            })
            .map_err(|e| run.abort(e))?;

        run.finish();

        info!(
            upstreams = main.addresses().len(),
            private_rdns = private_rdns.addresses().len(),
            fallbacks = fallback.addresses().len(),
            "Upstream configuration prepared"
        );

        Ok(ReloadBundle {
            main,
            private_rdns,
            fallback,
            internal_proxy,
            dns_proxy,
            common: CommonUpstreamConfig {
                bootstrap,
                timeout: options.timeout,
                prefer_ipv6: options.prefer_ipv6,
                edns_client_subnet_enabled: self.dns.edns_client_subnet_enabled,
                use_http3: options.http_versions.contains(&HttpVersion::Http3),
            },
        })
    }
}
