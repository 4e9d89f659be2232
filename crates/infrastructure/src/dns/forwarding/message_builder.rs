//! Query construction in wire format using `hickory-proto`.

use hickory_proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::{DNSClass, Name, RecordType};
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};
use sluice_dns_domain::DomainError;
use std::str::FromStr;

/// Fixed size of the DNS message header.
pub const DNS_HEADER_LEN: usize = 12;

pub struct MessageBuilder;

impl MessageBuilder {
    /// Builds a recursive query for `domain` with a random ID.
    pub fn build_query(domain: &str, record_type: RecordType) -> Result<Vec<u8>, DomainError> {
        Ok(Self::build_query_with_id(domain, record_type)?.1)
    }

    /// Like `build_query`, also returning the ID for response matching.
    pub fn build_query_with_id(
        domain: &str,
        record_type: RecordType,
    ) -> Result<(u16, Vec<u8>), DomainError> {
        let name = Name::from_str(domain).map_err(|e| {
            DomainError::InvalidUpstream(format!("Invalid domain '{}': {}", domain, e))
        })?;

        let mut query = Query::new();
        query.set_name(name);
        query.set_query_type(record_type);
        query.set_query_class(DNSClass::IN);

        let id = fastrand::u16(..);
        let mut message = Message::new(id, MessageType::Query, OpCode::Query);
        message.set_recursion_desired(true);
        message.add_query(query);

        Ok((id, Self::serialize_message(&message)?))
    }

    /// Turns a query into an answerless response carrying `rcode`.
    ///
    /// The question and any OPT record are echoed back unchanged.
    pub fn error_response(query_bytes: &[u8], rcode: ResponseCode) -> Result<Vec<u8>, DomainError> {
        if query_bytes.len() < DNS_HEADER_LEN {
            return Err(DomainError::InvalidContent(format!(
                "DNS query of {} bytes is shorter than a header",
                query_bytes.len()
            )));
        }

        let mut response = query_bytes.to_vec();
        response[2] |= 0x80;
        response[3] = 0x80 | (u16::from(rcode) & 0x0f) as u8;
        Ok(response)
    }

    pub fn serialize_message(message: &Message) -> Result<Vec<u8>, DomainError> {
        let mut buf = Vec::with_capacity(512);
        let mut encoder = BinEncoder::new(&mut buf);

        message.emit(&mut encoder).map_err(|e| {
            DomainError::IoError(format!("Failed to serialize DNS message: {}", e))
        })?;

        Ok(buf)
    }
}
