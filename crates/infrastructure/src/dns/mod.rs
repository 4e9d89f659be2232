pub mod bootstrap;
pub mod forwarding;
pub mod load_balancer;
pub mod proxy;
pub mod rdns;
pub mod server;
pub mod transport;
pub mod upstream;

pub use bootstrap::{StaticBootstrap, UdpBootstrapResolver};
pub use proxy::{ForwardingProxy, ForwardingProxyFactory};
pub use server::DnsServer;
