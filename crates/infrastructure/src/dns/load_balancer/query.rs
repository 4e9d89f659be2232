use crate::dns::forwarding::{DnsResponse, ResponseParser};
use crate::dns::upstream::UpstreamServer;
use sluice_dns_domain::DomainError;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

pub struct QueryAttemptResult {
    pub response: DnsResponse,
    pub bytes: Vec<u8>,
    pub server: Arc<str>,
    pub latency_ms: u64,
}

/// Sends `query_bytes` to one upstream, retrying over TCP when a UDP
/// answer comes back truncated.
pub async fn query_server(
    server: &UpstreamServer,
    query_bytes: &[u8],
) -> Result<QueryAttemptResult, DomainError> {
    let start = Instant::now();
    let timeout = server.timeout();

    let outcome = async {
        let sent = server.transport().send(query_bytes, timeout).await?;
        let mut bytes = sent.bytes;
        let mut response = ResponseParser::parse(&bytes)?;
        check_id(query_bytes, &response, &server.display())?;

        if response.truncated {
            if let Some(tcp) = server.tcp_fallback() {
                debug!(server = %server.display(), "Response truncated (TC bit), retrying via TCP");

                let remaining = timeout
                    .checked_sub(start.elapsed())
                    .unwrap_or(Duration::from_millis(500));
                bytes = tcp.send(query_bytes, remaining).await?.bytes;
                response = ResponseParser::parse(&bytes)?;
                check_id(query_bytes, &response, &server.display())?;
            }
        }
        Ok::<_, DomainError>((response, bytes))
    }
    .await;

    match outcome {
        Ok((response, bytes)) => {
            server.record_latency(start.elapsed());
            Ok(QueryAttemptResult {
                response,
                bytes,
                server: Arc::clone(server.display()),
                latency_ms: start.elapsed().as_millis() as u64,
            })
        }
        Err(e) => {
            server.record_failure();
            Err(e)
        }
    }
}

fn check_id(query_bytes: &[u8], response: &DnsResponse, server: &str) -> Result<(), DomainError> {
    let query_id = query_bytes
        .get(..2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
        .unwrap_or_default();
    if response.message.id() != query_id {
        return Err(DomainError::InvalidContent(format!(
            "response from {} has mismatched id {} (expected {})",
            server,
            response.message.id(),
            query_id
        )));
    }
    Ok(())
}
