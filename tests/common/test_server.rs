use hickory_proto::rr::RecordType;
use sluice_dns_application::ports::{ProxySettings, ResolutionServer};
use sluice_dns_application::use_cases::{
    AddUpstreamFileUseCase, PrepareReloadUseCase, RefreshUpstreamFilesUseCase,
    ReloadUpstreamsUseCase, StartWithRetry, UpstreamListLoader,
};
use sluice_dns_domain::DnsConfig;
use sluice_dns_infrastructure::dns::forwarding::{MessageBuilder, ResponseParser};
use sluice_dns_infrastructure::dns::upstream::{
    FallbackUpstreams, LocalResolvers, UpstreamGroupBuilder,
};
use sluice_dns_infrastructure::dns::{DnsServer, ForwardingProxyFactory, StaticBootstrap};
use sluice_dns_infrastructure::repositories::{
    ConfigUpstreamSource, ManagedFileStore, TomlConfigRepository,
};
use sluice_dns_infrastructure::upstream_files::{HttpFileFetcher, UpstreamFileRefresher};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::UdpSocket;

/// The full reload stack wired the way the binary wires it, on loopback.
pub struct TestServer {
    pub server: Arc<DnsServer>,
    pub reload: Arc<ReloadUpstreamsUseCase>,
    pub store: Arc<ManagedFileStore>,
    pub add_file: AddUpstreamFileUseCase,
    pub refresh: RefreshUpstreamFilesUseCase,
    pub config_path: PathBuf,
    pub dir: TempDir,
}

impl TestServer {
    pub async fn start(dns: DnsConfig) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("sluice.toml");
        std::fs::write(&config_path, "[server]\ndns_port = 5353\n").unwrap();

        let dns = Arc::new(dns);
        let listen_addrs: Vec<SocketAddr> = vec!["127.0.0.1:0".parse().unwrap()];

        let server = Arc::new(
            DnsServer::new(listen_addrs.clone())
                .with_bootstrap(Arc::new(StaticBootstrap::default())),
        );
        let store = Arc::new(ManagedFileStore::new(dir.path().join("data"), 24, Vec::new()));
        let refresher = Arc::new(UpstreamFileRefresher::new(
            store.clone(),
            Arc::new(HttpFileFetcher::new(Duration::from_secs(5)).unwrap()),
        ));
        let persistence = Arc::new(TomlConfigRepository::new(Some(config_path.clone())));

        let prepare = Arc::new(PrepareReloadUseCase::new(
            dns.clone(),
            server.clone(),
            Arc::new(UpstreamListLoader::new(
                Arc::new(ConfigUpstreamSource::new(dns.clone())),
                store.clone(),
            )),
            Arc::new(UpstreamGroupBuilder::new()),
            Arc::new(LocalResolvers::new(Vec::new(), false, listen_addrs.clone())),
            Arc::new(FallbackUpstreams::new(dns.fallback_dns.clone())),
            Arc::new(ForwardingProxyFactory::new()),
        ));
        let reload = Arc::new(ReloadUpstreamsUseCase::new(
            prepare,
            server.clone(),
            StartWithRetry::new(dns.restart_attempts).with_base_delay(Duration::from_millis(10)),
        ));
        reload
            .initialize(ProxySettings::primary(&dns, listen_addrs))
            .await
            .unwrap();

        Self {
            add_file: AddUpstreamFileUseCase::new(
                store.clone(),
                refresher.clone(),
                persistence.clone(),
                reload.clone(),
            ),
            refresh: RefreshUpstreamFilesUseCase::new(
                refresher,
                store.clone(),
                persistence,
                reload.clone(),
            ),
            server,
            reload,
            store,
            config_path,
            dir,
        }
    }

    /// Address the server currently listens on; it changes on every restart.
    pub async fn addr(&self) -> SocketAddr {
        self.server.local_addrs().await[0]
    }

    /// Resolves `name` through the running server and returns the answers.
    pub async fn resolve(&self, name: &str) -> Vec<IpAddr> {
        let query = MessageBuilder::build_query(name, RecordType::A).unwrap();
        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        client.send_to(&query, self.addr().await).await.unwrap();

        let mut buf = vec![0u8; 4096];
        let (len, _) = tokio::time::timeout(Duration::from_secs(5), client.recv_from(&mut buf))
            .await
            .unwrap()
            .unwrap();
        ResponseParser::parse(&buf[..len]).unwrap().addresses
    }

    pub async fn shutdown(self) {
        self.server.stop().await.unwrap();
        if let Some(bundle) = self.server.current() {
            bundle.release().unwrap();
        }
    }
}
