use super::{exchange_framed, DnsTransport, Endpoint, TransportResponse};
use async_trait::async_trait;
use sluice_dns_domain::DomainError;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::debug;

/// Plain DNS over TCP with the two-byte length prefix.
pub struct TcpTransport {
    endpoint: Arc<Endpoint>,
}

impl TcpTransport {
    pub fn new(endpoint: Arc<Endpoint>) -> Self {
        Self { endpoint }
    }
}

#[async_trait]
impl DnsTransport for TcpTransport {
    async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DomainError> {
        let server_addr = self.endpoint.first_addr().await?;

        let mut stream = tokio::time::timeout(timeout, TcpStream::connect(server_addr))
            .await
            .map_err(|_| DomainError::Network(format!("Timeout connecting to {}", server_addr)))?
            .map_err(|e| {
                DomainError::Network(format!("Failed to connect to {}: {}", server_addr, e))
            })?;

        let bytes =
            exchange_framed(&mut stream, message_bytes, timeout, &server_addr.to_string()).await?;
        debug!(server = %server_addr, bytes_received = bytes.len(), "TCP response received");

        Ok(TransportResponse {
            bytes,
            protocol_used: "TCP",
        })
    }

    fn protocol_name(&self) -> &'static str {
        "TCP"
    }
}
