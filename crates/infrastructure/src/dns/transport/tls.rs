use super::{exchange_framed, DnsTransport, Endpoint, TransportResponse};
use async_trait::async_trait;
use rustls::pki_types::ServerName;
use sluice_dns_domain::DomainError;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tracing::debug;

/// DNS over TLS (RFC 7858), a fresh session per query.
pub struct TlsTransport {
    endpoint: Arc<Endpoint>,
    server_name: ServerName<'static>,
    connector: TlsConnector,
}

impl TlsTransport {
    pub fn new(
        endpoint: Arc<Endpoint>,
        hostname: &str,
        config: Arc<rustls::ClientConfig>,
    ) -> Result<Self, DomainError> {
        let server_name = ServerName::try_from(hostname.to_string()).map_err(|e| {
            DomainError::InvalidUpstream(format!("Invalid TLS server name '{}': {}", hostname, e))
        })?;

        Ok(Self {
            endpoint,
            server_name,
            connector: TlsConnector::from(config),
        })
    }
}

#[async_trait]
impl DnsTransport for TlsTransport {
    async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DomainError> {
        let server_addr = self.endpoint.first_addr().await?;

        let tcp = tokio::time::timeout(timeout, TcpStream::connect(server_addr))
            .await
            .map_err(|_| DomainError::Network(format!("Timeout connecting to {}", server_addr)))?
            .map_err(|e| {
                DomainError::Network(format!("Failed to connect to {}: {}", server_addr, e))
            })?;

        let mut stream = tokio::time::timeout(
            timeout,
            self.connector.connect(self.server_name.clone(), tcp),
        )
        .await
        .map_err(|_| DomainError::Network(format!("TLS handshake with {} timed out", server_addr)))?
        .map_err(|e| {
            DomainError::Network(format!("TLS handshake with {} failed: {}", server_addr, e))
        })?;

        let bytes = exchange_framed(&mut stream, message_bytes, timeout, self.endpoint.host()).await?;
        debug!(server = %server_addr, bytes_received = bytes.len(), "DoT response received");

        Ok(TransportResponse {
            bytes,
            protocol_used: "TLS",
        })
    }

    fn protocol_name(&self) -> &'static str {
        "TLS"
    }
}
