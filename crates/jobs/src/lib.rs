pub mod runner;
pub mod upstream_files_sync;

pub use runner::JobRunner;
pub use upstream_files_sync::UpstreamFilesSyncJob;
