pub mod managed_file_store;
pub mod static_upstream_source;
pub mod toml_config_repository;

pub use managed_file_store::ManagedFileStore;
pub use static_upstream_source::ConfigUpstreamSource;
pub use toml_config_repository::TomlConfigRepository;
