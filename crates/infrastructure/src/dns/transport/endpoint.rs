use sluice_dns_application::ports::BootstrapResolver;
use sluice_dns_domain::DomainError;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

/// Host and port of one upstream, resolved through the bootstrap resolver
/// the first time it is needed and cached afterwards.
pub struct Endpoint {
    host: String,
    port: u16,
    bootstrap: Arc<dyn BootstrapResolver>,
    prefer_ipv6: bool,
    resolved: OnceCell<Vec<SocketAddr>>,
}

impl Endpoint {
    pub fn new(
        host: &str,
        port: u16,
        bootstrap: Arc<dyn BootstrapResolver>,
        prefer_ipv6: bool,
    ) -> Self {
        Self {
            host: host.to_string(),
            port,
            bootstrap,
            prefer_ipv6,
            resolved: OnceCell::new(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Socket addresses of the endpoint, preferred family first.
    pub async fn addrs(&self) -> Result<&[SocketAddr], DomainError> {
        let addrs = self
            .resolved
            .get_or_try_init(|| async {
                if let Ok(ip) = self.host.parse::<IpAddr>() {
                    return Ok(vec![SocketAddr::new(ip, self.port)]);
                }

                let mut addrs = self.bootstrap.resolve(&self.host, self.port).await?;
                if addrs.is_empty() {
                    return Err(DomainError::Network(format!(
                        "bootstrap returned no addresses for {}",
                        self.host
                    )));
                }
                sort_by_family(&mut addrs, self.prefer_ipv6);
                debug!(host = %self.host, addrs = ?addrs, "Upstream host resolved");
                Ok(addrs)
            })
            .await?;
        Ok(addrs.as_slice())
    }

    pub async fn first_addr(&self) -> Result<SocketAddr, DomainError> {
        self.addrs().await.map(|addrs| addrs[0])
    }
}

/// Stable sort putting the preferred address family first.
pub fn sort_by_family(addrs: &mut [SocketAddr], prefer_ipv6: bool) {
    addrs.sort_by_key(|a| a.is_ipv6() != prefer_ipv6);
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}
