pub mod upstream_files;

pub use upstream_files::{
    AddUrlRequest, ErrorResponse, RefreshResponse, RemoveUrlRequest, SetUrlData, SetUrlRequest,
    UpstreamFileResponse, UpstreamFilesStatusResponse,
};
