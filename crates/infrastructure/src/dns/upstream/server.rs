use crate::dns::transport::{self, tcp::TcpTransport, Endpoint, Transport, TransportContext};
use sluice_dns_domain::{DomainError, UpstreamProtocol};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Smoothing factor of the latency average, in 1/8ths of the new sample.
const EWMA_WEIGHT_EIGHTHS: u64 = 2;

/// Latency assumed for an upstream that has not answered yet.
const INITIAL_LATENCY_US: u64 = 50_000;

/// One upstream of a group: its transport plus observed latency.
pub struct UpstreamServer {
    protocol: UpstreamProtocol,
    display: Arc<str>,
    transport: Transport,
    tcp_fallback: Option<Transport>,
    timeout: Duration,
    latency_us: AtomicU64,
}

impl UpstreamServer {
    pub fn new(protocol: UpstreamProtocol, ctx: &TransportContext) -> Result<Self, DomainError> {
        let transport = transport::create_transport(&protocol, ctx)?;
        let tcp_fallback = match &protocol {
            UpstreamProtocol::Udp { host, port } => Some(Transport::Tcp(TcpTransport::new(
                Arc::new(Endpoint::new(host, *port, ctx.bootstrap.clone(), ctx.prefer_ipv6)),
            ))),
            _ => None,
        };

        Ok(Self {
            display: Arc::from(protocol.to_string()),
            protocol,
            transport,
            tcp_fallback,
            timeout: ctx.timeout,
            latency_us: AtomicU64::new(INITIAL_LATENCY_US),
        })
    }

    pub fn protocol(&self) -> &UpstreamProtocol {
        &self.protocol
    }

    pub fn display(&self) -> &Arc<str> {
        &self.display
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// TCP transport to retry truncated UDP answers with.
    pub fn tcp_fallback(&self) -> Option<&Transport> {
        self.tcp_fallback.as_ref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn latency_us(&self) -> u64 {
        self.latency_us.load(Ordering::Relaxed)
    }

    pub fn record_latency(&self, sample: Duration) {
        let sample = sample.as_micros().min(u128::from(u64::MAX)) as u64;
        let _ = self
            .latency_us
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |old| {
                Some((old * (8 - EWMA_WEIGHT_EIGHTHS) + sample * EWMA_WEIGHT_EIGHTHS) / 8)
            });
    }

    /// Penalizes an upstream that failed to answer.
    pub fn record_failure(&self) {
        self.record_latency(self.timeout);
    }
}

impl fmt::Debug for UpstreamServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamServer")
            .field("upstream", &self.display)
            .field("latency_us", &self.latency_us())
            .finish()
    }
}
