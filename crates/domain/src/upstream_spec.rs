//! Parsing of upstream specifications.
//!
//! Accepted upstream forms:
//! - `1.1.1.1`, `1.1.1.1:5353`, `[2606:4700::1111]:53`, `dns.lan` (plain DNS over UDP)
//! - `udp://`, `tcp://`, `tls://`, `quic://` followed by `host[:port]`
//! - `https://host[:port]/path`, `h3://host[:port]/path`
//!
//! A configuration line is either a whitespace-separated list of upstreams or a
//! domain-reserved line `[/example.org/other.lan/]upstream ...`. The special
//! upstream `#` in a reserved line excludes the domains from reservation.

use crate::errors::DomainError;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UpstreamProtocol {
    Udp { host: String, port: u16 },
    Tcp { host: String, port: u16 },
    Tls { host: String, port: u16 },
    Quic { host: String, port: u16 },
    Https { host: String, port: u16, path: String },
    H3 { host: String, port: u16, path: String },
}

impl UpstreamProtocol {
    pub fn scheme(&self) -> &'static str {
        match self {
            Self::Udp { .. } => "udp",
            Self::Tcp { .. } => "tcp",
            Self::Tls { .. } => "tls",
            Self::Quic { .. } => "quic",
            Self::Https { .. } => "https",
            Self::H3 { .. } => "h3",
        }
    }

    pub fn host(&self) -> &str {
        match self {
            Self::Udp { host, .. }
            | Self::Tcp { host, .. }
            | Self::Tls { host, .. }
            | Self::Quic { host, .. }
            | Self::Https { host, .. }
            | Self::H3 { host, .. } => host,
        }
    }

    pub fn port(&self) -> u16 {
        match self {
            Self::Udp { port, .. }
            | Self::Tcp { port, .. }
            | Self::Tls { port, .. }
            | Self::Quic { port, .. }
            | Self::Https { port, .. }
            | Self::H3 { port, .. } => *port,
        }
    }

    /// True when the host is a name that must go through the bootstrap resolver.
    pub fn needs_bootstrap(&self) -> bool {
        self.host().parse::<IpAddr>().is_err()
    }

    pub fn is_encrypted(&self) -> bool {
        !matches!(self, Self::Udp { .. } | Self::Tcp { .. })
    }

    pub fn is_http(&self) -> bool {
        matches!(self, Self::Https { .. } | Self::H3 { .. })
    }
}

fn default_port(scheme: &str) -> u16 {
    match scheme {
        "tls" | "quic" => 853,
        "https" | "h3" => 443,
        _ => 53,
    }
}

/// Splits `host[:port]`, accepting bracketed and bare IPv6 literals.
fn split_host_port(authority: &str, default: u16) -> Result<(String, u16), DomainError> {
    let invalid = || DomainError::InvalidUpstream(format!("invalid address '{}'", authority));

    if authority.is_empty() {
        return Err(invalid());
    }

    if let Some(rest) = authority.strip_prefix('[') {
        let (host, tail) = rest.split_once(']').ok_or_else(invalid)?;
        host.parse::<IpAddr>().map_err(|_| invalid())?;
        let port = match tail {
            "" => default,
            t => t
                .strip_prefix(':')
                .and_then(|p| p.parse::<u16>().ok())
                .ok_or_else(invalid)?,
        };
        return Ok((host.to_string(), port));
    }

    if authority.matches(':').count() > 1 {
        authority.parse::<IpAddr>().map_err(|_| invalid())?;
        return Ok((authority.to_string(), default));
    }

    match authority.rsplit_once(':') {
        Some((host, port)) => {
            let port = port.parse::<u16>().map_err(|_| invalid())?;
            if host.is_empty() || port == 0 {
                return Err(invalid());
            }
            Ok((host.to_string(), port))
        }
        None => Ok((authority.to_string(), default)),
    }
}

impl FromStr for UpstreamProtocol {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (scheme, rest) = match s.split_once("://") {
            Some((scheme, rest)) => (scheme.to_ascii_lowercase(), rest),
            None => ("udp".to_string(), s),
        };

        match scheme.as_str() {
            "udp" | "tcp" | "tls" | "quic" => {
                if rest.contains('/') {
                    return Err(DomainError::InvalidUpstream(format!(
                        "unexpected path in '{}'",
                        s
                    )));
                }
                let (host, port) = split_host_port(rest, default_port(&scheme))?;
                Ok(match scheme.as_str() {
                    "udp" => Self::Udp { host, port },
                    "tcp" => Self::Tcp { host, port },
                    "tls" => Self::Tls { host, port },
                    _ => Self::Quic { host, port },
                })
            }
            "https" | "h3" => {
                let (authority, path) = match rest.find('/') {
                    Some(idx) => (&rest[..idx], rest[idx..].to_string()),
                    None => (rest, "/dns-query".to_string()),
                };
                let (host, port) = split_host_port(authority, default_port(&scheme))?;
                Ok(if scheme == "https" {
                    Self::Https { host, port, path }
                } else {
                    Self::H3 { host, port, path }
                })
            }
            other => Err(DomainError::InvalidUpstream(format!(
                "unsupported scheme '{}' in '{}'",
                other, s
            ))),
        }
    }
}

impl fmt::Display for UpstreamProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let host = self.host();
        let host = if host.contains(':') {
            format!("[{}]", host)
        } else {
            host.to_string()
        };
        match self {
            Self::Https { port, path, .. } | Self::H3 { port, path, .. } => {
                write!(f, "{}://{}:{}{}", self.scheme(), host, port, path)
            }
            _ => write!(f, "{}://{}:{}", self.scheme(), host, self.port()),
        }
    }
}

/// One parsed line of an upstream configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamLine {
    /// Domains the upstreams are reserved for; empty for general upstreams.
    pub domains: Vec<String>,
    /// Upstreams of the line; empty for an exclusion line (`[/domain/]#`).
    pub upstreams: Vec<UpstreamProtocol>,
}

impl UpstreamLine {
    pub fn is_reserved(&self) -> bool {
        !self.domains.is_empty()
    }

    pub fn is_exclusion(&self) -> bool {
        self.is_reserved() && self.upstreams.is_empty()
    }

    pub fn parse(line: &str) -> Result<Self, DomainError> {
        let line = line.trim();

        let (domains, rest) = match line.strip_prefix("[/") {
            Some(tail) => {
                let (spec, rest) = tail.split_once("/]").ok_or_else(|| {
                    DomainError::InvalidUpstream(format!("unterminated domain spec in '{}'", line))
                })?;
                let domains: Vec<String> = spec
                    .split('/')
                    .map(|d| d.trim().trim_end_matches('.').to_ascii_lowercase())
                    .collect();
                if domains.iter().any(|d| d.is_empty()) {
                    return Err(DomainError::InvalidUpstream(format!(
                        "empty domain in '{}'",
                        line
                    )));
                }
                (domains, rest.trim())
            }
            None => (Vec::new(), line),
        };

        if !domains.is_empty() && rest == "#" {
            return Ok(Self {
                domains,
                upstreams: Vec::new(),
            });
        }

        let upstreams = rest
            .split_whitespace()
            .map(UpstreamProtocol::from_str)
            .collect::<Result<Vec<_>, _>>()?;

        if upstreams.is_empty() {
            return Err(DomainError::InvalidUpstream(format!(
                "no upstreams in '{}'",
                line
            )));
        }

        Ok(Self { domains, upstreams })
    }
}
