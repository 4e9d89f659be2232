use sluice_dns_domain::DomainError;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Wait unit between start attempts; the i-th retry waits `i` units.
pub const RESTART_BASE_DELAY: Duration = Duration::from_millis(100);

/// Linear-backoff retry around the server's start operation.
#[derive(Debug, Clone, Copy)]
pub struct StartWithRetry {
    attempts: u32,
    base_delay: Duration,
}

impl StartWithRetry {
    pub fn new(attempts: u32) -> Self {
        Self {
            attempts,
            base_delay: RESTART_BASE_DELAY,
        }
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Calls `start` up to `attempts` times and returns the last error when
    /// every attempt failed. At least one attempt is always made.
    pub async fn execute<F, Fut>(&self, mut start: F) -> Result<(), DomainError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(), DomainError>>,
    {
        let attempts = self.attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            if attempt > 1 {
                sleep(self.base_delay * (attempt - 1)).await;
            }

            match start().await {
                Ok(()) => {
                    if attempt > 1 {
                        info!(attempt, attempts, "DNS server started after retry");
                    }
                    return Ok(());
                }
                Err(e) => {
                    warn!(attempt, attempts, error = %e, "Failed to start DNS server");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| DomainError::StartFailed("no start attempt was made".into())))
    }
}
