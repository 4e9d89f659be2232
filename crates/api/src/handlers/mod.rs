pub mod upstream_files;

pub use upstream_files::{add_url, get_status, refresh, remove_url, set_url};
