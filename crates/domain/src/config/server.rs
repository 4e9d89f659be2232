use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_dns_port")]
    pub dns_port: u16,

    #[serde(default = "default_web_port")]
    pub web_port: u16,

    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Directory holding cached managed upstream files
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl ServerConfig {
    /// Addresses the DNS listeners bind to.
    pub fn dns_listen_addrs(&self) -> Vec<SocketAddr> {
        match self.bind_address.parse::<IpAddr>() {
            Ok(ip) => vec![SocketAddr::new(ip, self.dns_port)],
            Err(_) => vec![],
        }
    }
}

fn default_dns_port() -> u16 {
    53
}

fn default_web_port() -> u16 {
    3000
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            dns_port: default_dns_port(),
            web_port: default_web_port(),
            bind_address: default_bind_address(),
            data_dir: default_data_dir(),
        }
    }
}
