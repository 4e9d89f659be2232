use super::{ConfigError, DnsConfig, LoggingConfig, ServerConfig, UpstreamFilesConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub dns: DnsConfig,

    #[serde(default)]
    pub upstream_files: UpstreamFilesConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Values given on the command line; they win over the config file.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub dns_port: Option<u16>,
    pub web_port: Option<u16>,
    pub bind_address: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub log_level: Option<String>,
}

impl Config {
    /// Loads the TOML file at `path` (defaults when `None`) and applies overrides.
    pub fn load(path: Option<&str>, overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::from_file(Path::new(p))?,
            None => Self::default(),
        };
        config.apply_overrides(overrides);
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn apply_overrides(&mut self, overrides: CliOverrides) {
        if let Some(port) = overrides.dns_port {
            self.server.dns_port = port;
        }
        if let Some(port) = overrides.web_port {
            self.server.web_port = port;
        }
        if let Some(bind) = overrides.bind_address {
            self.server.bind_address = bind;
        }
        if let Some(dir) = overrides.data_dir {
            self.server.data_dir = dir;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.web_port == 0 {
            return Err(ConfigError::Invalid("web_port cannot be 0".into()));
        }
        if self.dns.upstream_timeout == 0 {
            return Err(ConfigError::Invalid("upstream_timeout cannot be 0".into()));
        }
        if self.dns.restart_attempts == 0 {
            return Err(ConfigError::Invalid("restart_attempts cannot be 0".into()));
        }
        if self.dns.cache_enabled && self.dns.cache_size_bytes == 0 {
            return Err(ConfigError::Invalid(
                "cache_size_bytes cannot be 0 when the cache is enabled".into(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for file in &self.upstream_files.files {
            if !seen.insert(file.url.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate upstream dns file url: {}",
                    file.url
                )));
            }
        }

        Ok(())
    }
}
