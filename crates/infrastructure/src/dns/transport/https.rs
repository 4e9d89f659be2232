use super::endpoint::sort_by_family;
use super::{DnsTransport, TransportContext, TransportResponse};
use async_trait::async_trait;
use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use sluice_dns_application::ports::BootstrapResolver;
use sluice_dns_domain::{DomainError, UpstreamProtocol};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Expected content type for DNS-over-HTTPS responses (RFC 8484 §4.2.1)
const DNS_MESSAGE_CONTENT_TYPE: &str = "application/dns-message";

/// Routes reqwest's hostname lookups through the bootstrap resolver.
struct BootstrapDns {
    bootstrap: Arc<dyn BootstrapResolver>,
    prefer_ipv6: bool,
}

impl Resolve for BootstrapDns {
    fn resolve(&self, name: Name) -> Resolving {
        let bootstrap = self.bootstrap.clone();
        let prefer_ipv6 = self.prefer_ipv6;
        Box::pin(async move {
            let mut addrs = bootstrap.resolve(name.as_str(), 0).await?;
            sort_by_family(&mut addrs, prefer_ipv6);
            let addrs: Addrs = Box::new(addrs.into_iter());
            Ok::<_, Box<dyn std::error::Error + Send + Sync>>(addrs)
        })
    }
}

/// DNS-over-HTTPS transport (RFC 8484). `h3://` upstreams use it too,
/// negotiating HTTP/2 or HTTP/1.1.
pub struct HttpsTransport {
    url: String,
    client: reqwest::Client,
}

impl HttpsTransport {
    pub fn new(protocol: &UpstreamProtocol, ctx: &TransportContext) -> Result<Self, DomainError> {
        let (host, port, path) = match protocol {
            UpstreamProtocol::Https { host, port, path } | UpstreamProtocol::H3 { host, port, path } => {
                (host, port, path)
            }
            other => {
                return Err(DomainError::InvalidUpstream(format!(
                    "{} is not an HTTPS upstream",
                    other
                )))
            }
        };
        let authority = if host.contains(':') {
            format!("[{}]", host)
        } else {
            host.clone()
        };
        let url = format!("https://{}:{}{}", authority, port, path);

        let client = reqwest::Client::builder()
            .use_preconfigured_tls((*ctx.doh_tls).clone())
            .dns_resolver(Arc::new(BootstrapDns {
                bootstrap: ctx.bootstrap.clone(),
                prefer_ipv6: ctx.prefer_ipv6,
            }))
            .connect_timeout(ctx.timeout)
            .pool_max_idle_per_host(4)
            .build()
            .map_err(|e| DomainError::InvalidUpstream(format!("{}: {}", url, e)))?;

        Ok(Self { url, client })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl DnsTransport for HttpsTransport {
    async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DomainError> {
        debug!(url = %self.url, message_len = message_bytes.len(), "Sending DoH query");

        let response = tokio::time::timeout(
            timeout,
            self.client
                .post(&self.url)
                .header("Content-Type", DNS_MESSAGE_CONTENT_TYPE)
                .header("Accept", DNS_MESSAGE_CONTENT_TYPE)
                .body(message_bytes.to_vec())
                .send(),
        )
        .await
        .map_err(|_| DomainError::Network(format!("Timeout sending DoH query to {}", self.url)))?
        .map_err(|e| DomainError::Network(format!("DoH request to {} failed: {}", self.url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DomainError::InvalidContent(format!(
                "DoH server {} returned HTTP {}: {}",
                self.url,
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        let response_bytes = tokio::time::timeout(timeout, response.bytes())
            .await
            .map_err(|_| {
                DomainError::Network(format!("Timeout reading DoH response from {}", self.url))
            })?
            .map_err(|e| {
                DomainError::Network(format!(
                    "Failed to read DoH response from {}: {}",
                    self.url, e
                ))
            })?;

        Ok(TransportResponse {
            bytes: response_bytes.to_vec(),
            protocol_used: "HTTPS",
        })
    }

    fn protocol_name(&self) -> &'static str {
        "HTTPS"
    }
}
