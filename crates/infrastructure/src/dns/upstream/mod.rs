//! Upstream groups: building, domain reservation and the three group sources.

pub mod builder;
pub mod fallback;
pub mod group;
pub mod local_resolvers;
pub mod server;
pub mod tls;

pub use builder::UpstreamGroupBuilder;
pub use fallback::FallbackUpstreams;
pub use group::{ReservedDomain, UpstreamGroupConfig};
pub use local_resolvers::LocalResolvers;
pub use server::UpstreamServer;
