#![allow(dead_code)]

pub mod fixtures;
pub mod mock_upstream;
pub mod test_server;

pub use fixtures::{dns_config, write_list};
pub use mock_upstream::MockUpstream;
pub use test_server::TestServer;
