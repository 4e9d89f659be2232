//! Configuration module for Sluice DNS
//!
//! This module contains all configuration structures organized by domain:
//! - `root`: Main configuration and CLI overrides
//! - `server`: Server ports, binding and data directory
//! - `dns`: Upstream resolution settings
//! - `upstream_files`: Managed upstream files and their refresh interval
//! - `logging`: Logging settings
//! - `errors`: Configuration errors

pub mod dns;
pub mod errors;
pub mod logging;
pub mod root;
pub mod server;
pub mod upstream_files;

pub use dns::{DnsConfig, UpstreamStrategy, UpstreamTlsConfig};
pub use errors::ConfigError;
pub use logging::LoggingConfig;
pub use root::{CliOverrides, Config};
pub use server::ServerConfig;
pub use upstream_files::UpstreamFilesConfig;
