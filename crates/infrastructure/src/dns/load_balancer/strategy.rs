use super::balanced::BalancedStrategy;
use super::parallel::ParallelStrategy;
use super::query::QueryAttemptResult;
use crate::dns::upstream::UpstreamServer;
use sluice_dns_application::ports::ExchangeMode;
use sluice_dns_domain::{DomainError, UpstreamStrategy};
use std::sync::Arc;

/// Stack-allocated enum dispatch for load balancing strategies.
pub enum Strategy {
    Balanced(BalancedStrategy),
    Parallel(ParallelStrategy),
}

impl Strategy {
    pub fn from_mode(mode: ExchangeMode) -> Self {
        match mode.strategy {
            UpstreamStrategy::LoadBalance => Self::Balanced(BalancedStrategy::new()),
            UpstreamStrategy::Parallel => Self::Parallel(ParallelStrategy::new()),
            UpstreamStrategy::FastestAddr => {
                Self::Parallel(ParallelStrategy::fastest(mode.fastest_timeout))
            }
        }
    }

    pub async fn exchange(
        &self,
        servers: &[Arc<UpstreamServer>],
        query_bytes: &[u8],
    ) -> Result<QueryAttemptResult, DomainError> {
        match self {
            Self::Balanced(s) => s.exchange(servers, query_bytes).await,
            Self::Parallel(s) => s.exchange(servers, query_bytes).await,
        }
    }
}
