//! Bounded retry with linear backoff around a single delivery.
//!
//! After failed attempt `n` the envelope waits `n * base_delay` before trying
//! again. Permanent errors stop the loop immediately. The wait is an async
//! sleep, so it only suspends the delivery that is retrying.

use crate::core::DeliveryError;
use crate::features::notifications::transport::DeliveryResult;
use log::{info, warn};
use std::future::Future;
use std::time::Duration;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(700);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        RetryPolicy {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Wait before the attempt following failed attempt number `attempt`
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }

    /// Run `operation` until it succeeds, fails permanently, or the attempt
    /// budget runs out. Returns the last error in the latter two cases.
    pub async fn attempt<F, Fut>(&self, label: &str, mut operation: F) -> DeliveryResult
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = DeliveryResult>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let error: DeliveryError = match operation().await {
                Ok(()) => {
                    if attempt > 1 {
                        info!("{label} succeeded on attempt {attempt}/{max_attempts}");
                    }
                    return Ok(());
                }
                Err(e) => e,
            };

            if error.is_permanent() {
                warn!("{label} failed permanently: {error}");
                return Err(error);
            }

            if attempt >= max_attempts {
                warn!("{label} failed after {max_attempts} attempts: {error}");
                return Err(error);
            }

            let delay = self.delay_after(attempt);
            warn!(
                "{} attempt {}/{} failed: {}. Retrying in {:?}...",
                label, attempt, max_attempts, error, delay
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
