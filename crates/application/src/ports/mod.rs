pub mod bootstrap_resolver;
pub mod config_persistence;
pub mod dns_proxy;
pub mod managed_file_repository;
pub mod resolution_server;
pub mod upstream_file_refresher;
pub mod upstream_group;
pub mod upstream_source;

pub use bootstrap_resolver::BootstrapResolver;
pub use config_persistence::ConfigPersistence;
pub use dns_proxy::{DnsProxy, DnsProxyFactory, ProxyConfig, ProxySettings};
pub use managed_file_repository::ManagedUpstreamFileRepository;
pub use resolution_server::{CommonUpstreamConfig, ReloadBundle, ResolutionReloader, ResolutionServer};
pub use upstream_file_refresher::{FileFetcher, UpstreamFileRefresherPort};
pub use upstream_group::{
    ExchangeMode, UpstreamGroup, UpstreamGroupFactory, UpstreamGroupProvider, UpstreamOptions,
};
pub use upstream_source::StaticUpstreamSource;
