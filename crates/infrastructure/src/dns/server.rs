use super::forwarding::MessageBuilder;
use super::transport::MAX_STREAM_MESSAGE_SIZE;
use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use hickory_proto::op::ResponseCode;
use sluice_dns_application::ports::{BootstrapResolver, ReloadBundle, ResolutionServer};
use sluice_dns_domain::DomainError;
use socket2::{Domain, Protocol, Socket, Type};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Idle time after which a client TCP connection is closed.
pub const TCP_IDLE_TIMEOUT: Duration = Duration::from_secs(10);

const UDP_BUFFER_SIZE: usize = 4096;

type SharedState = Arc<ArcSwapOption<ReloadBundle>>;

struct Running {
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
    local_addrs: Vec<SocketAddr>,
}

/// UDP and TCP listeners serving queries through the installed bundle.
///
/// The bundle is read per query, so `install` takes effect immediately
/// even while the listeners run.
pub struct DnsServer {
    listen_addrs: Vec<SocketAddr>,
    bootstrap: Option<Arc<dyn BootstrapResolver>>,
    state: SharedState,
    running: Mutex<Option<Running>>,
}

impl DnsServer {
    pub fn new(listen_addrs: Vec<SocketAddr>) -> Self {
        Self {
            listen_addrs,
            bootstrap: None,
            state: Arc::new(ArcSwapOption::empty()),
            running: Mutex::new(None),
        }
    }

    pub fn with_bootstrap(mut self, bootstrap: Arc<dyn BootstrapResolver>) -> Self {
        self.bootstrap = Some(bootstrap);
        self
    }

    /// Addresses actually bound, empty while stopped.
    pub async fn local_addrs(&self) -> Vec<SocketAddr> {
        self.running
            .lock()
            .await
            .as_ref()
            .map(|r| r.local_addrs.clone())
            .unwrap_or_default()
    }

    pub async fn is_running(&self) -> bool {
        self.running.lock().await.is_some()
    }
}

#[async_trait]
impl ResolutionServer for DnsServer {
    fn bootstrap(&self) -> Option<Arc<dyn BootstrapResolver>> {
        self.bootstrap.clone()
    }

    fn current(&self) -> Option<Arc<ReloadBundle>> {
        self.state.load_full()
    }

    fn install(&self, bundle: ReloadBundle) -> Option<Arc<ReloadBundle>> {
        self.state.swap(Some(Arc::new(bundle)))
    }

    async fn start(&self) -> Result<(), DomainError> {
        let mut running = self.running.lock().await;
        if running.is_some() {
            return Err(DomainError::StartFailed("DNS server is already running".into()));
        }
        if self.state.load().is_none() {
            return Err(DomainError::StartFailed(
                "no upstream configuration installed".into(),
            ));
        }

        let cancel = CancellationToken::new();
        let mut tasks = Vec::with_capacity(self.listen_addrs.len() * 2);
        let mut local_addrs = Vec::with_capacity(self.listen_addrs.len());

        for addr in &self.listen_addrs {
            let bound = bind_pair(*addr);
            let (udp, tcp) = match bound {
                Ok(pair) => pair,
                Err(e) => {
                    cancel.cancel();
                    for task in tasks {
                        let _ = task.await;
                    }
                    return Err(e);
                }
            };

            let local = udp.local_addr().map_err(|e| DomainError::IoError(e.to_string()))?;
            info!(address = %local, "DNS server listening on UDP and TCP");
            local_addrs.push(local);

            tasks.push(tokio::spawn(serve_udp(
                Arc::new(udp),
                self.state.clone(),
                cancel.clone(),
            )));
            tasks.push(tokio::spawn(serve_tcp(tcp, self.state.clone(), cancel.clone())));
        }

        *running = Some(Running {
            cancel,
            tasks,
            local_addrs,
        });
        Ok(())
    }

    async fn stop(&self) -> Result<(), DomainError> {
        let Some(running) = self.running.lock().await.take() else {
            debug!("DNS server already stopped");
            return Ok(());
        };

        running.cancel.cancel();
        let mut failures = Vec::new();
        for task in running.tasks {
            if let Err(e) = task.await {
                failures.push(DomainError::IoError(format!("listener task failed: {}", e)));
            }
        }

        info!(listeners = running.local_addrs.len(), "DNS server stopped");
        match DomainError::join(failures) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Binds UDP and TCP on the same address; a zero port is shared.
fn bind_pair(addr: SocketAddr) -> Result<(UdpSocket, TcpListener), DomainError> {
    let bind_err =
        |proto: &str, e: std::io::Error| DomainError::StartFailed(format!("{} {}: {}", proto, addr, e));

    let udp = Socket::new(Domain::for_address(addr), Type::DGRAM, Some(Protocol::UDP))
        .map_err(|e| bind_err("udp", e))?;
    udp.set_reuse_address(true).map_err(|e| bind_err("udp", e))?;
    udp.set_nonblocking(true).map_err(|e| bind_err("udp", e))?;
    udp.bind(&addr.into()).map_err(|e| bind_err("udp", e))?;
    let udp = UdpSocket::from_std(udp.into()).map_err(|e| bind_err("udp", e))?;

    let tcp_addr = udp.local_addr().map_err(|e| bind_err("udp", e))?;
    let tcp = Socket::new(Domain::for_address(tcp_addr), Type::STREAM, Some(Protocol::TCP))
        .map_err(|e| bind_err("tcp", e))?;
    tcp.set_reuse_address(true).map_err(|e| bind_err("tcp", e))?;
    tcp.set_nonblocking(true).map_err(|e| bind_err("tcp", e))?;
    tcp.bind(&tcp_addr.into()).map_err(|e| bind_err("tcp", e))?;
    tcp.listen(1024).map_err(|e| bind_err("tcp", e))?;
    let tcp = TcpListener::from_std(tcp.into()).map_err(|e| bind_err("tcp", e))?;

    Ok((udp, tcp))
}

/// Resolves one query; `None` means the query cannot be answered at all.
async fn answer(state: &SharedState, query: &[u8]) -> Option<Vec<u8>> {
    let result = match state.load_full() {
        Some(bundle) => bundle.dns_proxy.resolve(query).await,
        None => Err(DomainError::Precondition("no upstream configuration".into())),
    };

    match result {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            debug!(error = %e, "Query failed");
            MessageBuilder::error_response(query, ResponseCode::ServFail).ok()
        }
    }
}

async fn serve_udp(socket: Arc<UdpSocket>, state: SharedState, cancel: CancellationToken) {
    let mut buf = vec![0u8; UDP_BUFFER_SIZE];
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            received = socket.recv_from(&mut buf) => {
                let (len, peer) = match received {
                    Ok(r) => r,
                    Err(e) => {
                        warn!(error = %e, "UDP receive failed");
                        continue;
                    }
                };
                let query = buf[..len].to_vec();
                let socket = Arc::clone(&socket);
                let state = state.clone();
                tokio::spawn(async move {
                    if let Some(response) = answer(&state, &query).await {
                        if let Err(e) = socket.send_to(&response, peer).await {
                            debug!(peer = %peer, error = %e, "UDP send failed");
                        }
                    }
                });
            }
        }
    }
}

async fn serve_tcp(listener: TcpListener, state: SharedState, cancel: CancellationToken) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    let state = state.clone();
                    let cancel = cancel.clone();
                    tokio::spawn(async move {
                        tokio::select! {
                            _ = cancel.cancelled() => {}
                            result = serve_connection(stream, &state) => {
                                if let Err(e) = result {
                                    debug!(peer = %peer, error = %e, "TCP connection closed");
                                }
                            }
                        }
                    });
                }
                Err(e) => error!(error = %e, "TCP accept failed"),
            }
        }
    }
}

async fn serve_connection(mut stream: TcpStream, state: &SharedState) -> std::io::Result<()> {
    loop {
        let mut len_buf = [0u8; 2];
        match tokio::time::timeout(TCP_IDLE_TIMEOUT, stream.read_exact(&mut len_buf)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(()),
            Ok(Err(e)) => return Err(e),
            Err(_) => return Ok(()),
        }

        let len = u16::from_be_bytes(len_buf) as usize;
        let mut query = vec![0u8; len];
        stream.read_exact(&mut query).await?;

        let Some(response) = answer(state, &query).await else {
            return Ok(());
        };
        if response.len() > MAX_STREAM_MESSAGE_SIZE {
            warn!(size = response.len(), "Response too large for TCP framing");
            return Ok(());
        }

        let mut framed = Vec::with_capacity(response.len() + 2);
        framed.extend_from_slice(&(response.len() as u16).to_be_bytes());
        framed.extend_from_slice(&response);
        stream.write_all(&framed).await?;
    }
}
