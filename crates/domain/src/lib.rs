//! Sluice DNS Domain Layer
pub mod config;
pub mod errors;
pub mod managed_file;
pub mod upstream;
pub mod upstream_spec;
pub mod validators;

pub use config::{
    CliOverrides, Config, ConfigError, DnsConfig, LoggingConfig, ServerConfig, UpstreamFilesConfig,
    UpstreamStrategy, UpstreamTlsConfig,
};
pub use errors::{DomainError, JoinedError};
pub use managed_file::{
    FetchedList, ManagedFileUpdate, ManagedFilesSnapshot, ManagedUpstreamFile, RefreshOutcome,
};
pub use upstream::{
    merge_upstreams, parse_upstream_lines, HttpVersion, UpstreamGroupKind, DEFAULT_UPSTREAM,
};
pub use upstream_spec::{UpstreamLine, UpstreamProtocol};
