use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Marker that starts a trailing comment in upstream list files.
pub const COMMENT_MARKER: char = '#';

/// Upstream used for the main group when no upstream is configured at all.
pub const DEFAULT_UPSTREAM: &str = "https://dns10.quad9.net/dns-query";

/// The three upstream groups a resolution state is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpstreamGroupKind {
    Main,
    PrivateRdns,
    Fallback,
}

impl UpstreamGroupKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::PrivateRdns => "private rdns",
            Self::Fallback => "fallback",
        }
    }
}

impl fmt::Display for UpstreamGroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpVersion {
    Http11,
    Http2,
    Http3,
}

impl HttpVersion {
    /// Preferred HTTP versions for DNS-over-HTTPS upstreams, most preferred first.
    pub fn preference(use_http3: bool) -> Vec<HttpVersion> {
        if use_http3 {
            vec![Self::Http3, Self::Http2, Self::Http11]
        } else {
            vec![Self::Http2, Self::Http11]
        }
    }
}

impl fmt::Display for HttpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http11 => f.write_str("http/1.1"),
            Self::Http2 => f.write_str("h2"),
            Self::Http3 => f.write_str("h3"),
        }
    }
}

/// Merges upstream lists, keeping the first occurrence of every value.
///
/// Lists are concatenated in argument order, so the first list wins on
/// duplicates. Static upstreams are passed first to take priority over
/// managed-file upstreams.
pub fn merge_upstreams<L: AsRef<[String]>>(lists: &[L]) -> Vec<String> {
    let total: usize = lists.iter().map(|l| l.as_ref().len()).sum();
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    let mut merged = Vec::with_capacity(total);

    for list in lists {
        for upstream in list.as_ref() {
            if seen.insert(upstream.as_str()) {
                merged.push(upstream.clone());
            }
        }
    }

    merged
}

/// Strips a trailing comment and surrounding whitespace from one line.
///
/// A comment starts at a marker that opens the line or follows whitespace.
/// The exclusion marker of `[/domain/]#` is kept and anything after it
/// dropped.
pub fn trim_upstream_line(line: &str) -> &str {
    let mut prev: Option<char> = None;
    let mut end = line.len();
    for (idx, c) in line.char_indices() {
        if c == COMMENT_MARKER {
            match prev {
                None => {
                    end = idx;
                    break;
                }
                Some(p) if p.is_whitespace() => {
                    end = idx;
                    break;
                }
                Some(']') => {
                    end = idx + c.len_utf8();
                    break;
                }
                Some(_) => {}
            }
        }
        prev = Some(c);
    }
    line[..end].trim()
}

/// Splits list file content into upstream lines.
///
/// Comments are stripped, whitespace trimmed and blank results dropped.
/// Both `\n` and `\r` terminate a line.
pub fn parse_upstream_lines(text: &str) -> Vec<String> {
    text.split(['\n', '\r'])
        .map(trim_upstream_line)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
