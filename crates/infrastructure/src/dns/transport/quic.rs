use super::{DnsTransport, Endpoint, TransportResponse, MAX_STREAM_MESSAGE_SIZE};
use async_trait::async_trait;
use quinn::crypto::rustls::QuicClientConfig;
use sluice_dns_domain::DomainError;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// ALPN token for DNS over QUIC.
const DOQ_ALPN: &[u8] = b"doq";

/// DNS over QUIC (RFC 9250), one connection per query.
pub struct QuicTransport {
    endpoint: Arc<Endpoint>,
    hostname: Arc<str>,
    client_config: quinn::ClientConfig,
}

impl QuicTransport {
    pub fn new(
        endpoint: Arc<Endpoint>,
        hostname: Arc<str>,
        tls: &rustls::ClientConfig,
    ) -> Result<Self, DomainError> {
        let mut tls = tls.clone();
        tls.alpn_protocols = vec![DOQ_ALPN.to_vec()];

        let crypto = QuicClientConfig::try_from(Arc::new(tls)).map_err(|e| {
            DomainError::InvalidUpstream(format!("QUIC upstream {}: {}", hostname, e))
        })?;

        Ok(Self {
            endpoint,
            hostname,
            client_config: quinn::ClientConfig::new(Arc::new(crypto)),
        })
    }

    async fn exchange(
        &self,
        server_addr: SocketAddr,
        message_bytes: &[u8],
    ) -> Result<Vec<u8>, DomainError> {
        let network = |what: &str, e: &dyn std::fmt::Display| {
            DomainError::Network(format!("QUIC {} with {} failed: {}", what, server_addr, e))
        };

        let bind_addr = if server_addr.is_ipv4() {
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
        } else {
            SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
        };
        let quic = quinn::Endpoint::client(bind_addr)
            .map_err(|e| DomainError::IoError(format!("Failed to bind QUIC socket: {}", e)))?;

        let connection = quic
            .connect_with(self.client_config.clone(), server_addr, &self.hostname)
            .map_err(|e| network("connect", &e))?
            .await
            .map_err(|e| network("handshake", &e))?;

        let (mut send, mut recv) = connection
            .open_bi()
            .await
            .map_err(|e| network("stream", &e))?;

        // Queries carry message ID 0 on the wire.
        let mut request = Vec::with_capacity(2 + message_bytes.len());
        request.extend_from_slice(&(message_bytes.len() as u16).to_be_bytes());
        request.extend_from_slice(&[0, 0]);
        request.extend_from_slice(&message_bytes[2..]);

        send.write_all(&request)
            .await
            .map_err(|e| network("write", &e))?;
        send.finish().map_err(|e| network("write", &e))?;

        let framed = recv
            .read_to_end(2 + MAX_STREAM_MESSAGE_SIZE)
            .await
            .map_err(|e| network("read", &e))?;
        connection.close(0u32.into(), b"");

        if framed.len() < 4 {
            return Err(DomainError::InvalidContent(format!(
                "short DoQ response from {}",
                server_addr
            )));
        }
        let len = u16::from_be_bytes([framed[0], framed[1]]) as usize;
        let mut response = framed[2..].to_vec();
        if response.len() != len {
            return Err(DomainError::InvalidContent(format!(
                "DoQ response from {} declares {} bytes, carries {}",
                server_addr,
                len,
                response.len()
            )));
        }
        response[..2].copy_from_slice(&message_bytes[..2]);

        Ok(response)
    }
}

#[async_trait]
impl DnsTransport for QuicTransport {
    async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DomainError> {
        if message_bytes.len() < 2 || message_bytes.len() > MAX_STREAM_MESSAGE_SIZE {
            return Err(DomainError::InvalidContent(format!(
                "DNS message of {} bytes cannot be sent over QUIC",
                message_bytes.len()
            )));
        }

        let server_addr = self.endpoint.first_addr().await?;
        let bytes = tokio::time::timeout(timeout, self.exchange(server_addr, message_bytes))
            .await
            .map_err(|_| {
                DomainError::Network(format!(
                    "Timeout waiting for DoQ response from {}({})",
                    self.hostname, server_addr
                ))
            })??;

        debug!(server = %server_addr, bytes_received = bytes.len(), "DoQ response received");

        Ok(TransportResponse {
            bytes,
            protocol_used: "QUIC",
        })
    }

    fn protocol_name(&self) -> &'static str {
        "QUIC"
    }
}
