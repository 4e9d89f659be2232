use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use sluice_dns_application::ports::FileFetcher;
use sluice_dns_domain::DomainError;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Upper bound for one managed list.
pub const MAX_LIST_BYTES: usize = 16 * 1024 * 1024;

const USER_AGENT: &str = concat!("sluice-dns/", env!("CARGO_PKG_VERSION"));

/// Fetches list content over HTTP(S), or from disk for absolute paths.
pub struct HttpFileFetcher {
    client: reqwest::Client,
    max_bytes: usize,
}

impl HttpFileFetcher {
    pub fn new(timeout: Duration) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::IoError(format!("building http client: {}", e)))?;
        Ok(Self {
            client,
            max_bytes: MAX_LIST_BYTES,
        })
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    fn too_large(&self, source: &dyn std::fmt::Display, len: usize) -> DomainError {
        DomainError::InvalidContent(format!(
            "{} is too large: {} bytes, limit {}",
            source, len, self.max_bytes
        ))
    }

    async fn fetch_http(&self, url: &str) -> Result<Bytes, DomainError> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DomainError::InvalidContent(format!(
                "HTTP {} for {}",
                status.as_u16(),
                url
            )));
        }

        if let Some(len) = response.content_length() {
            if len > self.max_bytes as u64 {
                return Err(self.too_large(&url, len as usize));
            }
        }

        // The declared length may be absent or wrong; cap what is buffered.
        let mut body = BytesMut::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| classify(url, e))? {
            if body.len() + chunk.len() > self.max_bytes {
                return Err(self.too_large(&url, body.len() + chunk.len()));
            }
            body.extend_from_slice(&chunk);
        }

        Ok(body.freeze())
    }

    async fn fetch_local(&self, path: &Path) -> Result<Bytes, DomainError> {
        let data = tokio::fs::read(path)
            .await
            .map_err(|e| DomainError::IoError(format!("reading {}: {}", path.display(), e)))?;
        if data.len() > self.max_bytes {
            return Err(self.too_large(&path.display(), data.len()));
        }
        Ok(Bytes::from(data))
    }
}

/// Connectivity problems become `Network`, everything else is content.
fn classify(url: &str, e: reqwest::Error) -> DomainError {
    if e.is_connect() || e.is_timeout() || e.is_request() || e.is_body() {
        DomainError::Network(format!("{}: {}", url, e))
    } else {
        DomainError::InvalidContent(format!("{}: {}", url, e))
    }
}

#[async_trait]
impl FileFetcher for HttpFileFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes, DomainError> {
        debug!(url = %url, "Fetching upstream list");
        let path = Path::new(url);
        if path.is_absolute() {
            return self.fetch_local(path).await;
        }
        self.fetch_http(url).await
    }
}
