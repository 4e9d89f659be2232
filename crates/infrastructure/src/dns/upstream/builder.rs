use super::group::{ReservedDomain, UpstreamGroupConfig};
use super::tls::build_client_config;
use super::UpstreamServer;
use crate::dns::transport::TransportContext;
use rustc_hash::FxHashMap;
use sluice_dns_application::ports::{UpstreamGroup, UpstreamGroupFactory, UpstreamOptions};
use sluice_dns_domain::{DomainError, UpstreamGroupKind, UpstreamLine, UpstreamProtocol};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Builds upstream groups from configuration lines.
///
/// Building parses and validates every line and prepares transports; it
/// never touches the network. Hostnames go through the bootstrap resolver
/// on first use.
#[derive(Debug, Default, Clone, Copy)]
pub struct UpstreamGroupBuilder;

impl UpstreamGroupBuilder {
    pub fn new() -> Self {
        Self
    }

    #[instrument(skip(self, lines, options), fields(lines = lines.len()))]
    pub fn build_group(
        &self,
        kind: UpstreamGroupKind,
        lines: &[String],
        options: &UpstreamOptions,
    ) -> Result<UpstreamGroupConfig, DomainError> {
        let build_err = |message: String| DomainError::UpstreamBuild {
            group: kind,
            message,
        };

        let parsed = lines
            .iter()
            .map(|line| UpstreamLine::parse(line).map_err(|e| build_err(e.to_string())))
            .collect::<Result<Vec<_>, _>>()?;

        if parsed.is_empty() {
            return Ok(UpstreamGroupConfig::empty(kind));
        }

        let ctx = TransportContext {
            bootstrap: options.bootstrap.clone(),
            prefer_ipv6: options.prefer_ipv6,
            timeout: options.timeout,
            tls: build_client_config(&options.tls, &[]).map_err(|e| build_err(e.to_string()))?,
            doh_tls: build_client_config(&options.tls, &options.http_versions)
                .map_err(|e| build_err(e.to_string()))?,
        };

        let mut servers: FxHashMap<UpstreamProtocol, Arc<UpstreamServer>> = FxHashMap::default();
        let mut server_for = |protocol: &UpstreamProtocol| -> Result<Arc<UpstreamServer>, DomainError> {
            if let Some(server) = servers.get(protocol) {
                return Ok(Arc::clone(server));
            }
            let server = Arc::new(
                UpstreamServer::new(protocol.clone(), &ctx).map_err(|e| build_err(e.to_string()))?,
            );
            servers.insert(protocol.clone(), Arc::clone(&server));
            Ok(server)
        };

        let mut general = Vec::new();
        let mut reserved: Vec<ReservedDomain> = Vec::new();

        for line in &parsed {
            let line_servers = line
                .upstreams
                .iter()
                .map(&mut server_for)
                .collect::<Result<Vec<_>, _>>()?;

            if !line.is_reserved() {
                general.extend(line_servers);
                continue;
            }

            for domain in &line.domains {
                let idx = match reserved.iter().position(|r| &r.domain == domain) {
                    Some(idx) => idx,
                    None => {
                        reserved.push(ReservedDomain {
                            domain: domain.clone(),
                            servers: Some(Vec::new()),
                        });
                        reserved.len() - 1
                    }
                };
                let entry = &mut reserved[idx];

                if line.is_exclusion() {
                    entry.servers = None;
                } else if let Some(existing) = entry.servers.as_mut() {
                    existing.extend(line_servers.iter().cloned());
                }
            }
        }

        if kind == UpstreamGroupKind::Main && general.is_empty() {
            return Err(build_err("no default upstreams specified".into()));
        }

        debug!(group = %kind, general = general.len(), reserved = reserved.len(), "Upstream group built");
        Ok(UpstreamGroupConfig::new(kind, general, reserved, lines.to_vec()))
    }
}

impl UpstreamGroupFactory for UpstreamGroupBuilder {
    fn build(
        &self,
        kind: UpstreamGroupKind,
        lines: &[String],
        options: &UpstreamOptions,
    ) -> Result<Arc<dyn UpstreamGroup>, DomainError> {
        Ok(Arc::new(self.build_group(kind, lines, options)?))
    }
}
