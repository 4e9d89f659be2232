//! rustls client configuration for encrypted upstreams.

use rustls::crypto::{aws_lc_rs, CryptoProvider};
use rustls::{ClientConfig, RootCertStore};
use sluice_dns_domain::{DomainError, HttpVersion, UpstreamTlsConfig};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Builds a client config from the bundled webpki roots plus any extra PEM
/// roots, restricted to the configured cipher suites.
///
/// `alpn` is empty for DoT; DoH passes the preferred HTTP versions.
pub fn build_client_config(
    tls: &UpstreamTlsConfig,
    alpn: &[HttpVersion],
) -> Result<Arc<ClientConfig>, DomainError> {
    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    for path in &tls.root_ca_files {
        add_pem_roots(&mut roots, path)?;
    }

    let provider = provider_with_suites(&tls.cipher_suites)?;
    let mut config = ClientConfig::builder_with_provider(Arc::new(provider))
        .with_safe_default_protocol_versions()
        .map_err(|e| DomainError::InvalidUpstream(format!("TLS configuration: {}", e)))?
        .with_root_certificates(roots)
        .with_no_client_auth();

    config.alpn_protocols = alpn
        .iter()
        .filter(|v| **v != HttpVersion::Http3)
        .map(|v| v.to_string().into_bytes())
        .collect();

    Ok(Arc::new(config))
}

fn provider_with_suites(names: &[String]) -> Result<CryptoProvider, DomainError> {
    let mut provider = aws_lc_rs::default_provider();
    if names.is_empty() {
        return Ok(provider);
    }

    provider
        .cipher_suites
        .retain(|suite| names.iter().any(|n| n.eq_ignore_ascii_case(&suite_name(suite))));
    if provider.cipher_suites.is_empty() {
        return Err(DomainError::InvalidUpstream(format!(
            "no supported cipher suite among {:?}",
            names
        )));
    }
    Ok(provider)
}

fn suite_name(suite: &rustls::SupportedCipherSuite) -> String {
    format!("{:?}", suite.suite())
}

fn add_pem_roots(roots: &mut RootCertStore, path: &Path) -> Result<(), DomainError> {
    let file = File::open(path).map_err(|e| {
        DomainError::InvalidUpstream(format!("reading root CA {}: {}", path.display(), e))
    })?;
    let mut reader = BufReader::new(file);

    let mut added = 0;
    for cert in rustls_pemfile::certs(&mut reader) {
        let cert = cert.map_err(|e| {
            DomainError::InvalidUpstream(format!("parsing root CA {}: {}", path.display(), e))
        })?;
        roots.add(cert).map_err(|e| {
            DomainError::InvalidUpstream(format!("adding root CA {}: {}", path.display(), e))
        })?;
        added += 1;
    }

    if added == 0 {
        return Err(DomainError::InvalidUpstream(format!(
            "no certificates in {}",
            path.display()
        )));
    }
    debug!(path = %path.display(), added, "Extra root certificates loaded");
    Ok(())
}
