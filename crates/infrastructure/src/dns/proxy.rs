use super::forwarding::{MessageBuilder, ResponseParser};
use super::rdns::{reverse_domain_to_ip, PrivateNetworks};
use async_trait::async_trait;
use hickory_proto::op::ResponseCode;
use hickory_proto::rr::RecordType;
use ipnetwork::Ipv6Network;
use sluice_dns_application::ports::{
    DnsProxy, DnsProxyFactory, ExchangeMode, ProxyConfig, UpstreamGroup,
};
use sluice_dns_domain::{DomainError, UpstreamStrategy};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

const DNS64_PREFIX_LENGTHS: [u8; 6] = [32, 40, 48, 56, 64, 96];

/// Forwards client queries to the upstream groups of one reload bundle.
pub struct ForwardingProxy {
    config: ProxyConfig,
    private_nets: PrivateNetworks,
    limiter: Semaphore,
}

impl ForwardingProxy {
    fn new(config: ProxyConfig, private_nets: PrivateNetworks) -> Self {
        let limiter = Semaphore::new(config.settings.max_concurrent_queries);
        Self {
            config,
            private_nets,
            limiter,
        }
    }

    /// Reverse lookups of private addresses, `None` for anything else.
    fn private_ptr(&self, name: &str, record_type: RecordType) -> Option<bool> {
        if record_type != RecordType::PTR {
            return None;
        }
        let ip = reverse_domain_to_ip(name)?;
        Some(self.private_nets.contains(&ip))
    }

    async fn resolve_private(&self, name: &str, query: &[u8]) -> Result<Vec<u8>, DomainError> {
        let group = &self.config.private_rdns;
        if !self.config.settings.use_private_rdns || group.is_empty() {
            debug!(name = %name, "Private reverse lookup answered locally");
            return MessageBuilder::error_response(query, ResponseCode::NXDomain);
        }
        group.exchange(name, query, ExchangeMode::default()).await
    }

    async fn resolve_public(&self, name: &str, query: &[u8]) -> Result<Vec<u8>, DomainError> {
        let primary = self
            .config
            .upstream
            .exchange(name, query, self.config.settings.exchange_mode())
            .await;

        let err = match primary {
            Ok(bytes) => return Ok(bytes),
            Err(e) => e,
        };

        let Some(fallbacks) = self.config.fallbacks.as_ref().filter(|g| !g.is_empty()) else {
            return Err(err);
        };

        warn!(name = %name, error = %err, "Main upstreams failed, using fallback");
        fallbacks
            .exchange(name, query, ExchangeMode::default())
            .await
            .map_err(|fallback_err| err.with_deferred(vec![fallback_err]))
    }
}

#[async_trait]
impl DnsProxy for ForwardingProxy {
    fn config(&self) -> &ProxyConfig {
        &self.config
    }

    async fn resolve(&self, query: &[u8]) -> Result<Vec<u8>, DomainError> {
        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|_| DomainError::Cancelled)?;

        let question = ResponseParser::question(query)?;
        match self.private_ptr(&question.name, question.record_type) {
            Some(true) => self.resolve_private(&question.name, query).await,
            _ => self.resolve_public(&question.name, query).await,
        }
    }
}

/// Validates proxy settings and creates forwarding proxies.
#[derive(Debug, Default, Clone, Copy)]
pub struct ForwardingProxyFactory;

impl ForwardingProxyFactory {
    pub fn new() -> Self {
        Self
    }
}

impl DnsProxyFactory for ForwardingProxyFactory {
    fn create(&self, config: ProxyConfig) -> Result<Arc<dyn DnsProxy>, DomainError> {
        let settings = &config.settings;

        if settings.max_concurrent_queries == 0 {
            return Err(DomainError::ProxyBuild(
                "max_concurrent_queries must be positive".into(),
            ));
        }
        if settings.strategy == UpstreamStrategy::FastestAddr && settings.fastest_timeout.is_zero() {
            return Err(DomainError::ProxyBuild(
                "fastest_timeout must be positive for fastest_addr".into(),
            ));
        }
        if settings.cache_enabled && settings.cache_size_bytes == 0 {
            return Err(DomainError::ProxyBuild("cache size must be positive".into()));
        }
        if settings.use_dns64 {
            for prefix in &settings.dns64_prefixes {
                validate_dns64_prefix(prefix)?;
            }
        }

        let private_nets = PrivateNetworks::parse(&settings.private_networks)?;
        debug!(
            strategy = ?settings.strategy,
            fallbacks = config.fallbacks.is_some(),
            "Forwarding proxy created"
        );
        Ok(Arc::new(ForwardingProxy::new(config, private_nets)))
    }
}

fn validate_dns64_prefix(prefix: &str) -> Result<(), DomainError> {
    let net = Ipv6Network::from_str(prefix.trim())
        .map_err(|e| DomainError::ProxyBuild(format!("dns64 prefix '{}': {}", prefix, e)))?;
    if !DNS64_PREFIX_LENGTHS.contains(&net.prefix()) {
        return Err(DomainError::ProxyBuild(format!(
            "dns64 prefix '{}' must have length 32, 40, 48, 56, 64 or 96",
            prefix
        )));
    }
    Ok(())
}
