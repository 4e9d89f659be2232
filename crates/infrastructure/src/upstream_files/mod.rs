//! Managed upstream files: fetching, validation and single-flight refresh.

pub mod fetcher;
pub mod guard;
pub mod refresher;
pub mod validation;

pub use fetcher::HttpFileFetcher;
pub use guard::{RefreshGuard, RefreshPermit};
pub use refresher::UpstreamFileRefresher;
pub use validation::validate_list_content;
