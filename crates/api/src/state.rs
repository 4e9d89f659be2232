use sluice_dns_application::use_cases::{
    AddUpstreamFileUseCase, GetUpstreamFilesUseCase, RefreshUpstreamFilesUseCase,
    RemoveUpstreamFileUseCase, SetUpstreamFilePropertiesUseCase,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub get_files: Arc<GetUpstreamFilesUseCase>,
    pub add_file: Arc<AddUpstreamFileUseCase>,
    pub remove_file: Arc<RemoveUpstreamFileUseCase>,
    pub set_file_properties: Arc<SetUpstreamFilePropertiesUseCase>,
    pub refresh_files: Arc<RefreshUpstreamFilesUseCase>,
}
