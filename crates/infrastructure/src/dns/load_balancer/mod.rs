pub mod balanced;
pub mod parallel;
pub mod query;
pub mod strategy;

pub use balanced::BalancedStrategy;
pub use parallel::ParallelStrategy;
pub use query::{query_server, QueryAttemptResult};
pub use strategy::Strategy;
