use crate::dns::forwarding::{MessageBuilder, ResponseParser};
use crate::dns::transport::endpoint::sort_by_family;
use crate::dns::transport::udp::UdpTransport;
use crate::dns::transport::{DnsTransport, Endpoint};
use async_trait::async_trait;
use hickory_proto::rr::RecordType;
use rustc_hash::FxHashMap;
use sluice_dns_application::ports::BootstrapResolver;
use sluice_dns_domain::{DomainError, UpstreamProtocol};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Resolves upstream hostnames through plain-DNS bootstrap servers, or the
/// system resolver when none are configured.
#[derive(Debug)]
pub struct UdpBootstrapResolver {
    servers: Vec<SocketAddr>,
    timeout: Duration,
    prefer_ipv6: bool,
}

impl UdpBootstrapResolver {
    /// Bootstrap servers must be IP addresses, optionally with a port.
    pub fn new(servers: &[String], timeout: Duration, prefer_ipv6: bool) -> Result<Self, DomainError> {
        let servers = servers
            .iter()
            .map(|s| parse_bootstrap_server(s))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            servers,
            timeout,
            prefer_ipv6,
        })
    }

    pub fn servers(&self) -> &[SocketAddr] {
        &self.servers
    }

    async fn query(&self, server: SocketAddr, host: &str) -> Result<Vec<IpAddr>, DomainError> {
        let transport = UdpTransport::new(Arc::new(Endpoint::new(
            &server.ip().to_string(),
            server.port(),
            Arc::new(StaticBootstrap::default()),
            false,
        )));

        let mut addrs = Vec::new();
        let mut last_error = None;
        for record_type in [RecordType::A, RecordType::AAAA] {
            let query = MessageBuilder::build_query(host, record_type)?;
            match transport.send(&query, self.timeout).await {
                Ok(response) => match ResponseParser::parse(&response.bytes) {
                    Ok(parsed) => addrs.extend(parsed.addresses),
                    Err(e) => last_error = Some(e),
                },
                Err(e) => last_error = Some(e),
            }
        }

        if addrs.is_empty() {
            return Err(last_error.unwrap_or_else(|| {
                DomainError::Network(format!("{} has no addresses via {}", host, server))
            }));
        }
        Ok(addrs)
    }
}

fn parse_bootstrap_server(s: &str) -> Result<SocketAddr, DomainError> {
    let protocol: UpstreamProtocol = s.parse()?;
    match &protocol {
        UpstreamProtocol::Udp { host, port } => host
            .parse::<IpAddr>()
            .map(|ip| SocketAddr::new(ip, *port))
            .map_err(|_| {
                DomainError::InvalidUpstream(format!(
                    "bootstrap server '{}' must be an IP address",
                    s
                ))
            }),
        _ => Err(DomainError::InvalidUpstream(format!(
            "bootstrap server '{}' must be plain DNS",
            s
        ))),
    }
}

#[async_trait]
impl BootstrapResolver for UdpBootstrapResolver {
    async fn resolve(&self, host: &str, port: u16) -> Result<Vec<SocketAddr>, DomainError> {
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(vec![SocketAddr::new(ip, port)]);
        }

        if self.servers.is_empty() {
            let found = tokio::net::lookup_host((host, port))
                .await
                .map_err(|e| DomainError::Network(format!("resolving {}: {}", host, e)))?;
            let mut addrs: Vec<SocketAddr> = found.collect();
            sort_by_family(&mut addrs, self.prefer_ipv6);
            return Ok(addrs);
        }

        let mut last_error = None;
        for server in &self.servers {
            match self.query(*server, host).await {
                Ok(ips) => {
                    let mut addrs: Vec<SocketAddr> =
                        ips.into_iter().map(|ip| SocketAddr::new(ip, port)).collect();
                    sort_by_family(&mut addrs, self.prefer_ipv6);
                    debug!(host = %host, bootstrap = %server, addrs = addrs.len(), "Bootstrapped upstream host");
                    return Ok(addrs);
                }
                Err(e) => {
                    warn!(host = %host, bootstrap = %server, error = %e, "Bootstrap lookup failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| DomainError::Network(format!("could not resolve {}", host))))
    }
}

/// Fixed host table, for embedding and tests.
#[derive(Debug, Default, Clone)]
pub struct StaticBootstrap {
    hosts: FxHashMap<String, Vec<IpAddr>>,
}

impl StaticBootstrap {
    pub fn with_host(mut self, host: &str, ips: Vec<IpAddr>) -> Self {
        self.hosts.insert(host.to_ascii_lowercase(), ips);
        self
    }
}

#[async_trait]
impl BootstrapResolver for StaticBootstrap {
    async fn resolve(&self, host: &str, port: u16) -> Result<Vec<SocketAddr>, DomainError> {
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(vec![SocketAddr::new(ip, port)]);
        }
        self.hosts
            .get(&host.to_ascii_lowercase())
            .map(|ips| ips.iter().map(|ip| SocketAddr::new(*ip, port)).collect())
            .ok_or_else(|| DomainError::Network(format!("unknown host {}", host)))
    }
}
