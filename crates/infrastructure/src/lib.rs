pub mod dns;
pub mod repositories;
pub mod upstream_files;
