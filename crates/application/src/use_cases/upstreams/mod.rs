pub mod load_upstreams;
pub mod prepare_reload;
pub mod reload_upstreams;
pub mod start_with_retry;

pub use load_upstreams::UpstreamListLoader;
pub use prepare_reload::{PrepareReloadUseCase, ReloadStage};
pub use reload_upstreams::ReloadUpstreamsUseCase;
pub use start_with_retry::StartWithRetry;
