pub mod upstream_files;
pub mod upstreams;

pub use upstream_files::{
    AddUpstreamFileUseCase, GetUpstreamFilesUseCase, RefreshUpstreamFilesUseCase,
    RemoveUpstreamFileUseCase, SetUpstreamFilePropertiesUseCase,
};
pub use upstreams::{
    PrepareReloadUseCase, ReloadStage, ReloadUpstreamsUseCase, StartWithRetry,
    UpstreamListLoader,
};
