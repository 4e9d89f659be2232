#![allow(dead_code)]

pub mod dns_server_mock;

pub use dns_server_mock::MockDnsServer;

use sluice_dns_application::ports::UpstreamOptions;
use sluice_dns_domain::{HttpVersion, UpstreamTlsConfig};
use sluice_dns_infrastructure::dns::StaticBootstrap;
use std::sync::Arc;
use std::time::Duration;

pub fn upstream_options() -> UpstreamOptions {
    UpstreamOptions {
        bootstrap: Arc::new(StaticBootstrap::default()),
        timeout: Duration::from_millis(500),
        http_versions: HttpVersion::preference(false),
        prefer_ipv6: false,
        tls: UpstreamTlsConfig::default(),
    }
}

pub fn lines(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}
