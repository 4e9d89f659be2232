use sluice_dns_domain::DnsConfig;
use std::path::{Path, PathBuf};

/// DNS settings for loopback tests: no private rDNS, short timeouts.
pub fn dns_config(upstream_servers: Vec<String>) -> DnsConfig {
    DnsConfig {
        upstream_servers,
        upstream_timeout: 500,
        use_private_rdns: false,
        restart_attempts: 2,
        ..DnsConfig::default()
    }
}

/// Writes a list file under `dir` and returns its absolute path.
pub fn write_list(dir: &Path, name: &str, lines: &[String]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("# {}\n{}\n", name, lines.join("\n"))).unwrap();
    path
}
