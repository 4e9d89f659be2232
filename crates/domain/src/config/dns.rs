use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How queries are distributed across the main upstream group
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpstreamStrategy {
    /// Weighted random choice by past response time
    #[default]
    LoadBalance,
    /// Query all upstreams, take the first answer
    Parallel,
    /// Query all upstreams, keep the answer with the fastest address
    FastestAddr,
}

/// TLS material applied to encrypted upstreams
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UpstreamTlsConfig {
    /// Extra PEM files with root certificates, added to the bundled roots
    #[serde(default)]
    pub root_ca_files: Vec<PathBuf>,

    /// Allowed cipher suites by IANA name (empty: provider defaults)
    #[serde(default)]
    pub cipher_suites: Vec<String>,
}

/// Upstream resolution configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DnsConfig {
    #[serde(default)]
    pub upstream_servers: Vec<String>,

    /// File with one upstream per line; replaces `upstream_servers` when set
    #[serde(default)]
    pub upstream_dns_file: Option<PathBuf>,

    /// Plain DNS servers used to resolve upstream hostnames
    #[serde(default = "default_bootstrap_dns")]
    pub bootstrap_dns: Vec<String>,

    #[serde(default)]
    pub bootstrap_prefer_ipv6: bool,

    /// Upstream query timeout in milliseconds
    #[serde(default = "default_upstream_timeout")]
    pub upstream_timeout: u64,

    #[serde(default)]
    pub upstream_strategy: UpstreamStrategy,

    /// Wait time in milliseconds for `fastest_addr` probing
    #[serde(default = "default_fastest_timeout")]
    pub fastest_timeout: u64,

    #[serde(default)]
    pub use_http3_upstreams: bool,

    /// Upstreams for reverse lookups of private addresses (empty: system resolvers)
    #[serde(default)]
    pub local_ptr_upstreams: Vec<String>,

    #[serde(default = "default_true")]
    pub use_private_rdns: bool,

    /// Networks treated as private for reverse lookups (empty: RFC 6303 set)
    #[serde(default)]
    pub private_networks: Vec<String>,

    #[serde(default)]
    pub fallback_dns: Vec<String>,

    #[serde(default = "default_true")]
    pub cache_enabled: bool,

    #[serde(default = "default_cache_size_bytes")]
    pub cache_size_bytes: usize,

    #[serde(default = "default_max_concurrent_queries")]
    pub max_concurrent_queries: usize,

    #[serde(default)]
    pub edns_client_subnet_enabled: bool,

    #[serde(default)]
    pub use_dns64: bool,

    #[serde(default)]
    pub dns64_prefixes: Vec<String>,

    #[serde(default)]
    pub tls: UpstreamTlsConfig,

    /// Attempts to restart the DNS server after an upstream reload
    #[serde(default = "default_restart_attempts")]
    pub restart_attempts: u32,
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            upstream_servers: vec!["https://dns10.quad9.net/dns-query".to_string()],
            upstream_dns_file: None,
            bootstrap_dns: default_bootstrap_dns(),
            bootstrap_prefer_ipv6: false,
            upstream_timeout: default_upstream_timeout(),
            upstream_strategy: UpstreamStrategy::LoadBalance,
            fastest_timeout: default_fastest_timeout(),
            use_http3_upstreams: false,
            local_ptr_upstreams: vec![],
            use_private_rdns: true,
            private_networks: vec![],
            fallback_dns: vec![],
            cache_enabled: true,
            cache_size_bytes: default_cache_size_bytes(),
            max_concurrent_queries: default_max_concurrent_queries(),
            edns_client_subnet_enabled: false,
            use_dns64: false,
            dns64_prefixes: vec![],
            tls: UpstreamTlsConfig::default(),
            restart_attempts: default_restart_attempts(),
        }
    }
}

// Default functions for DNS config
fn default_bootstrap_dns() -> Vec<String> {
    vec!["9.9.9.10".to_string(), "149.112.112.10".to_string()]
}

fn default_upstream_timeout() -> u64 {
    10_000
}

fn default_fastest_timeout() -> u64 {
    1000
}

fn default_true() -> bool {
    true
}

fn default_cache_size_bytes() -> usize {
    4 * 1024 * 1024
}

fn default_max_concurrent_queries() -> usize {
    300
}

fn default_restart_attempts() -> u32 {
    3
}
