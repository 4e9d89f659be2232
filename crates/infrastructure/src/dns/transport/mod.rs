pub mod endpoint;
pub mod https;
#[cfg(feature = "dns-over-quic")]
pub mod quic;
pub mod tcp;
pub mod tls;
pub mod udp;

use async_trait::async_trait;
use sluice_dns_domain::{DomainError, UpstreamProtocol};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

pub use endpoint::Endpoint;

/// Largest DNS message accepted over a stream transport.
pub const MAX_STREAM_MESSAGE_SIZE: usize = u16::MAX as usize;

/// Result of a raw DNS transport operation
#[derive(Debug)]
pub struct TransportResponse {
    /// Raw DNS response bytes (wire format)
    pub bytes: Vec<u8>,
    /// Which protocol was used
    pub protocol_used: &'static str,
}

/// Trait for sending raw DNS messages over the wire
#[async_trait]
pub trait DnsTransport: Send + Sync {
    async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DomainError>;

    fn protocol_name(&self) -> &'static str;
}

/// Enum-dispatched transport, one per upstream.
pub enum Transport {
    Udp(udp::UdpTransport),
    Tcp(tcp::TcpTransport),
    #[cfg(feature = "dns-over-rustls")]
    Tls(tls::TlsTransport),
    #[cfg(feature = "dns-over-https")]
    Https(https::HttpsTransport),
    #[cfg(feature = "dns-over-quic")]
    Quic(quic::QuicTransport),
}

impl Transport {
    pub async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DomainError> {
        match self {
            Self::Udp(t) => DnsTransport::send(t, message_bytes, timeout).await,
            Self::Tcp(t) => DnsTransport::send(t, message_bytes, timeout).await,
            #[cfg(feature = "dns-over-rustls")]
            Self::Tls(t) => DnsTransport::send(t, message_bytes, timeout).await,
            #[cfg(feature = "dns-over-https")]
            Self::Https(t) => DnsTransport::send(t, message_bytes, timeout).await,
            #[cfg(feature = "dns-over-quic")]
            Self::Quic(t) => DnsTransport::send(t, message_bytes, timeout).await,
        }
    }

    pub fn protocol_name(&self) -> &'static str {
        match self {
            Self::Udp(_) => "UDP",
            Self::Tcp(_) => "TCP",
            #[cfg(feature = "dns-over-rustls")]
            Self::Tls(_) => "TLS",
            #[cfg(feature = "dns-over-https")]
            Self::Https(_) => "HTTPS",
            #[cfg(feature = "dns-over-quic")]
            Self::Quic(_) => "QUIC",
        }
    }
}

/// Shared material for building the transports of one upstream group.
#[derive(Clone)]
pub struct TransportContext {
    pub bootstrap: Arc<dyn sluice_dns_application::ports::BootstrapResolver>,
    pub prefer_ipv6: bool,
    pub timeout: Duration,
    pub tls: Arc<rustls::ClientConfig>,
    pub doh_tls: Arc<rustls::ClientConfig>,
}

/// Creates the transport for one parsed upstream.
///
/// No network I/O happens here; hostnames are resolved on first use.
pub fn create_transport(
    protocol: &UpstreamProtocol,
    ctx: &TransportContext,
) -> Result<Transport, DomainError> {
    let endpoint = || {
        Arc::new(Endpoint::new(
            protocol.host(),
            protocol.port(),
            ctx.bootstrap.clone(),
            ctx.prefer_ipv6,
        ))
    };

    match protocol {
        UpstreamProtocol::Udp { .. } => Ok(Transport::Udp(udp::UdpTransport::new(endpoint()))),
        UpstreamProtocol::Tcp { .. } => Ok(Transport::Tcp(tcp::TcpTransport::new(endpoint()))),

        #[cfg(feature = "dns-over-rustls")]
        UpstreamProtocol::Tls { host, .. } => Ok(Transport::Tls(tls::TlsTransport::new(
            endpoint(),
            host,
            ctx.tls.clone(),
        )?)),

        #[cfg(not(feature = "dns-over-rustls"))]
        UpstreamProtocol::Tls { .. } => Err(DomainError::InvalidUpstream(format!(
            "TLS feature not enabled, cannot use {}",
            protocol
        ))),

        #[cfg(feature = "dns-over-https")]
        UpstreamProtocol::Https { .. } | UpstreamProtocol::H3 { .. } => Ok(Transport::Https(
            https::HttpsTransport::new(protocol, ctx)?,
        )),

        #[cfg(not(feature = "dns-over-https"))]
        UpstreamProtocol::Https { .. } | UpstreamProtocol::H3 { .. } => {
            Err(DomainError::InvalidUpstream(format!(
                "HTTPS feature not enabled, cannot use {}",
                protocol
            )))
        }

        #[cfg(feature = "dns-over-quic")]
        UpstreamProtocol::Quic { host, .. } => Ok(Transport::Quic(quic::QuicTransport::new(
            endpoint(),
            Arc::from(host.as_str()),
            &ctx.tls,
        )?)),

        #[cfg(not(feature = "dns-over-quic"))]
        UpstreamProtocol::Quic { .. } => Err(DomainError::InvalidUpstream(format!(
            "QUIC feature not enabled, cannot use {}",
            protocol
        ))),
    }
}

/// One length-prefixed exchange over a stream (TCP and DoT framing).
pub(crate) async fn exchange_framed<S>(
    stream: &mut S,
    message_bytes: &[u8],
    timeout: Duration,
    peer: &str,
) -> Result<Vec<u8>, DomainError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    if message_bytes.len() > MAX_STREAM_MESSAGE_SIZE {
        return Err(DomainError::InvalidContent(format!(
            "DNS message of {} bytes is too large",
            message_bytes.len()
        )));
    }

    let mut request = Vec::with_capacity(2 + message_bytes.len());
    request.extend_from_slice(&(message_bytes.len() as u16).to_be_bytes());
    request.extend_from_slice(message_bytes);

    let io = async {
        stream.write_all(&request).await?;
        stream.flush().await?;

        let mut len_buf = [0u8; 2];
        stream.read_exact(&mut len_buf).await?;
        let mut response = vec![0u8; u16::from_be_bytes(len_buf) as usize];
        stream.read_exact(&mut response).await?;
        Ok::<_, std::io::Error>(response)
    };

    tokio::time::timeout(timeout, io)
        .await
        .map_err(|_| DomainError::Network(format!("Timeout waiting for response from {}", peer)))?
        .map_err(|e| DomainError::Network(format!("Exchange with {} failed: {}", peer, e)))
}
