use hickory_proto::op::{Message, ResponseCode};
use hickory_proto::rr::{RData, RecordType};
use sluice_dns_domain::DomainError;
use std::net::IpAddr;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct DnsResponse {
    pub addresses: Vec<IpAddr>,

    pub rcode: ResponseCode,

    pub truncated: bool,

    pub min_ttl: Option<u32>,

    pub message: Message,
}

impl DnsResponse {
    pub fn is_server_error(&self) -> bool {
        matches!(
            self.rcode,
            ResponseCode::ServFail | ResponseCode::Refused | ResponseCode::NotImp
        )
    }
}

/// First question of a query: lowercased name without the trailing dot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionInfo {
    pub id: u16,
    pub name: String,
    pub record_type: RecordType,
}

pub struct ResponseParser;

impl ResponseParser {
    pub fn parse(response_bytes: &[u8]) -> Result<DnsResponse, DomainError> {
        let message = Message::from_vec(response_bytes).map_err(|e| {
            DomainError::InvalidContent(format!("Failed to parse DNS response: {}", e))
        })?;

        let rcode = message.response_code();
        let truncated = message.truncated();

        let mut addresses = Vec::with_capacity(message.answers().len().min(8));
        let mut min_ttl: Option<u32> = None;

        for record in message.answers() {
            let record_ttl = record.ttl();
            min_ttl = Some(min_ttl.map_or(record_ttl, |current| current.min(record_ttl)));

            match record.data() {
                RData::A(a) => addresses.push(IpAddr::V4(a.0)),
                RData::AAAA(aaaa) => addresses.push(IpAddr::V6(aaaa.0)),
                _ => {}
            }
        }

        debug!(
            rcode = ?rcode,
            addresses = addresses.len(),
            truncated = truncated,
            "DNS response parsed"
        );

        Ok(DnsResponse {
            addresses,
            rcode,
            truncated,
            min_ttl,
            message,
        })
    }

    /// Reads the first question of a wire-format query.
    pub fn question(query_bytes: &[u8]) -> Result<QuestionInfo, DomainError> {
        let message = Message::from_vec(query_bytes).map_err(|e| {
            DomainError::InvalidContent(format!("Failed to parse DNS query: {}", e))
        })?;
        let query = message
            .queries()
            .first()
            .ok_or_else(|| DomainError::InvalidContent("DNS query has no question".into()))?;

        let name = query.name().to_lowercase().to_utf8();
        Ok(QuestionInfo {
            id: message.id(),
            name: name.trim_end_matches('.').to_string(),
            record_type: query.query_type(),
        })
    }
}
