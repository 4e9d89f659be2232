pub mod add_file;
pub mod get_files;
pub mod refresh_files;
pub mod remove_file;
pub mod set_properties;

pub use add_file::AddUpstreamFileUseCase;
pub use get_files::GetUpstreamFilesUseCase;
pub use refresh_files::RefreshUpstreamFilesUseCase;
pub use remove_file::RemoveUpstreamFileUseCase;
pub use set_properties::SetUpstreamFilePropertiesUseCase;
