use sluice_dns_api::AppState;
use sluice_dns_application::use_cases::{
    AddUpstreamFileUseCase, GetUpstreamFilesUseCase, PrepareReloadUseCase,
    RefreshUpstreamFilesUseCase, ReloadUpstreamsUseCase, RemoveUpstreamFileUseCase,
    SetUpstreamFilePropertiesUseCase, StartWithRetry, UpstreamListLoader,
};
use sluice_dns_domain::Config;
use sluice_dns_infrastructure::dns::upstream::{
    FallbackUpstreams, LocalResolvers, UpstreamGroupBuilder,
};
use sluice_dns_infrastructure::dns::{DnsServer, ForwardingProxyFactory, UdpBootstrapResolver};
use sluice_dns_infrastructure::repositories::{
    ConfigUpstreamSource, ManagedFileStore, TomlConfigRepository,
};
use sluice_dns_infrastructure::upstream_files::{HttpFileFetcher, UpstreamFileRefresher};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Timeout for downloading one managed upstream file.
const FILE_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything the binary drives after wiring.
pub struct Services {
    pub server: Arc<DnsServer>,
    pub reload: Arc<ReloadUpstreamsUseCase>,
    pub app_state: AppState,
}

impl Services {
    pub fn build(
        config: &Config,
        config_path: Option<PathBuf>,
        shutdown: CancellationToken,
    ) -> anyhow::Result<Self> {
        let dns = Arc::new(config.dns.clone());
        let listen_addrs = config.server.dns_listen_addrs();
        let upstream_timeout = Duration::from_millis(dns.upstream_timeout);

        let bootstrap = Arc::new(UdpBootstrapResolver::new(
            &dns.bootstrap_dns,
            upstream_timeout,
            dns.bootstrap_prefer_ipv6,
        )?);
        let server = Arc::new(DnsServer::new(listen_addrs.clone()).with_bootstrap(bootstrap));

        let store = Arc::new(ManagedFileStore::new(
            config.server.data_dir.clone(),
            config.upstream_files.update_interval_hours,
            config.upstream_files.files.clone(),
        ));
        let refresher = Arc::new(
            UpstreamFileRefresher::new(
                store.clone(),
                Arc::new(HttpFileFetcher::new(FILE_FETCH_TIMEOUT)?),
            )
            .with_cancellation(shutdown),
        );
        let persistence = Arc::new(TomlConfigRepository::new(config_path));

        let loader = Arc::new(UpstreamListLoader::new(
            Arc::new(ConfigUpstreamSource::new(dns.clone())),
            store.clone(),
        ));
        let prepare = Arc::new(PrepareReloadUseCase::new(
            dns.clone(),
            server.clone(),
            loader,
            Arc::new(UpstreamGroupBuilder::new()),
            Arc::new(LocalResolvers::new(
                dns.local_ptr_upstreams.clone(),
                dns.use_private_rdns,
                listen_addrs,
            )),
            Arc::new(FallbackUpstreams::new(dns.fallback_dns.clone())),
            Arc::new(ForwardingProxyFactory::new()),
        ));
        let reload = Arc::new(ReloadUpstreamsUseCase::new(
            prepare,
            server.clone(),
            StartWithRetry::new(dns.restart_attempts),
        ));

        let app_state = AppState {
            get_files: Arc::new(GetUpstreamFilesUseCase::new(store.clone())),
            add_file: Arc::new(AddUpstreamFileUseCase::new(
                store.clone(),
                refresher.clone(),
                persistence.clone(),
                reload.clone(),
            )),
            remove_file: Arc::new(RemoveUpstreamFileUseCase::new(
                store.clone(),
                persistence.clone(),
                reload.clone(),
            )),
            set_file_properties: Arc::new(SetUpstreamFilePropertiesUseCase::new(
                store.clone(),
                refresher.clone(),
                persistence.clone(),
                reload.clone(),
            )),
            refresh_files: Arc::new(RefreshUpstreamFilesUseCase::new(
                refresher,
                store,
                persistence,
                reload.clone(),
            )),
        };

        info!("Services wired");
        Ok(Self {
            server,
            reload,
            app_state,
        })
    }
}
