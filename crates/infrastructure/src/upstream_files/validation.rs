use sha2::{Digest, Sha256};
use sluice_dns_domain::{parse_upstream_lines, DomainError, FetchedList, UpstreamLine};

/// Checks fetched bytes and turns them into a `FetchedList`.
///
/// Content must be UTF-8 text, must not be an HTML page and must hold at
/// least one valid upstream line.
pub fn validate_list_content(bytes: &[u8]) -> Result<FetchedList, DomainError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|_| DomainError::InvalidContent("data is not valid UTF-8 text".into()))?;

    if looks_like_html(text) {
        return Err(DomainError::InvalidContent("data is HTML, not an upstream list".into()));
    }

    let lines = parse_upstream_lines(text);
    if lines.is_empty() {
        return Err(DomainError::InvalidContent("no upstream lines found".into()));
    }

    for line in &lines {
        UpstreamLine::parse(line).map_err(|e| {
            DomainError::InvalidContent(format!("bad line '{}': {}", line, e))
        })?;
    }

    Ok(FetchedList {
        content: text.to_string(),
        rules_count: lines.len(),
        checksum: checksum(bytes),
    })
}

/// Hex-encoded SHA-256 of `bytes`.
pub fn checksum(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

fn looks_like_html(text: &str) -> bool {
    let head: String = text
        .trim_start()
        .chars()
        .take(64)
        .collect::<String>()
        .to_ascii_lowercase();
    head.starts_with("<!doctype html") || head.starts_with("<html")
}
