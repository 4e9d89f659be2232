use super::UpstreamGroupBuilder;
use sluice_dns_application::ports::{UpstreamGroup, UpstreamGroupProvider, UpstreamOptions};
use sluice_dns_domain::{DomainError, UpstreamGroupKind, UpstreamLine, UpstreamProtocol};
use std::io::ErrorKind;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

pub const RESOLV_CONF: &str = "/etc/resolv.conf";

/// Upstreams for reverse lookups of private addresses.
///
/// Configured `local_ptr_upstreams` win; without them the system resolvers
/// from resolv.conf are used. Upstreams that point back at this server's
/// own listeners are dropped.
pub struct LocalResolvers {
    configured: Vec<String>,
    enabled: bool,
    listen_addrs: Vec<SocketAddr>,
    resolv_conf: PathBuf,
    builder: UpstreamGroupBuilder,
}

impl LocalResolvers {
    pub fn new(configured: Vec<String>, enabled: bool, listen_addrs: Vec<SocketAddr>) -> Self {
        Self {
            configured,
            enabled,
            listen_addrs,
            resolv_conf: PathBuf::from(RESOLV_CONF),
            builder: UpstreamGroupBuilder::new(),
        }
    }

    pub fn with_resolv_conf(mut self, path: impl Into<PathBuf>) -> Self {
        self.resolv_conf = path.into();
        self
    }

    fn system_resolvers(&self) -> Result<Vec<String>, DomainError> {
        let text = match std::fs::read_to_string(&self.resolv_conf) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(path = %self.resolv_conf.display(), "No system resolver configuration");
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(DomainError::UpstreamBuild {
                    group: UpstreamGroupKind::PrivateRdns,
                    message: format!("reading {}: {}", self.resolv_conf.display(), e),
                })
            }
        };
        Ok(parse_resolv_conf(&text))
    }

    /// True when `protocol` is plain DNS aimed at one of our listeners.
    fn is_own_listener(&self, protocol: &UpstreamProtocol) -> bool {
        let (UpstreamProtocol::Udp { host, port } | UpstreamProtocol::Tcp { host, port }) = protocol
        else {
            return false;
        };
        let Ok(ip) = host.parse::<IpAddr>() else {
            return false;
        };

        self.listen_addrs.iter().any(|listen| {
            listen.port() == *port
                && (listen.ip() == ip || (listen.ip().is_unspecified() && ip.is_loopback()))
        })
    }

    /// Validates lines and drops own-listener upstreams from them.
    fn filter_lines(&self, lines: Vec<String>) -> Result<Vec<String>, DomainError> {
        let build_err = |message: String| DomainError::UpstreamBuild {
            group: UpstreamGroupKind::PrivateRdns,
            message,
        };

        let mut kept = Vec::with_capacity(lines.len());
        for line in lines {
            let parsed = UpstreamLine::parse(&line).map_err(|e| build_err(e.to_string()))?;

            if let Some(domain) = parsed.domains.iter().find(|d| !is_arpa_domain(d)) {
                return Err(build_err(format!(
                    "{} is not a reverse lookup domain in '{}'",
                    domain, line
                )));
            }

            if parsed.upstreams.iter().any(|u| self.is_own_listener(u)) {
                let rest: Vec<String> = parsed
                    .upstreams
                    .iter()
                    .filter(|u| !self.is_own_listener(u))
                    .map(|u| u.to_string())
                    .collect();
                debug!(line = %line, kept = rest.len(), "Dropped own address from local resolvers");
                if rest.is_empty() {
                    continue;
                }
                let prefix = if parsed.is_reserved() {
                    format!("[/{}/]", parsed.domains.join("/"))
                } else {
                    String::new()
                };
                kept.push(format!("{}{}", prefix, rest.join(" ")));
                continue;
            }

            kept.push(line);
        }
        Ok(kept)
    }
}

impl UpstreamGroupProvider for LocalResolvers {
    fn build(&self, options: &UpstreamOptions) -> Result<Arc<dyn UpstreamGroup>, DomainError> {
        if !self.enabled {
            debug!("Private reverse DNS disabled");
            return Ok(Arc::new(super::UpstreamGroupConfig::empty(
                UpstreamGroupKind::PrivateRdns,
            )));
        }

        let lines = if self.configured.is_empty() {
            self.system_resolvers()?
        } else {
            self.configured.clone()
        };
        let lines = self.filter_lines(lines)?;

        Ok(Arc::new(self.builder.build_group(
            UpstreamGroupKind::PrivateRdns,
            &lines,
            options,
        )?))
    }
}

fn is_arpa_domain(domain: &str) -> bool {
    ["in-addr.arpa", "ip6.arpa"]
        .iter()
        .any(|zone| domain == *zone || domain.ends_with(&format!(".{}", zone)))
}

/// `nameserver` entries of a resolv.conf, zone indices stripped.
pub fn parse_resolv_conf(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            match (fields.next(), fields.next()) {
                (Some("nameserver"), Some(addr)) => {
                    let addr = addr.split('%').next().unwrap_or(addr);
                    addr.parse::<IpAddr>().ok().map(|ip| ip.to_string())
                }
                _ => None,
            }
        })
        .collect()
}
