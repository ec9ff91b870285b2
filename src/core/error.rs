//! Error types the scheduling surface exposes to callers.

use std::time::Duration;
use thiserror::Error;

/// Why a single notification send did not go through
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    #[error("email transport not configured: {0}")]
    NotConfigured(String),

    #[error("{0} notifications not implemented")]
    UnsupportedChannel(String),

    #[error("invalid email address: {0}")]
    InvalidAddress(String),

    #[error("failed to build message: {0}")]
    Build(String),

    #[error("SMTP error: {0}")]
    Smtp(String),

    #[error("send timed out after {0:?}")]
    Timeout(Duration),
}

impl DeliveryError {
    /// Permanent errors are reported immediately and never retried
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            DeliveryError::NotConfigured(_)
                | DeliveryError::UnsupportedChannel(_)
                | DeliveryError::InvalidAddress(_)
                | DeliveryError::Build(_)
        )
    }
}

/// Why a reminder could not be registered with the scheduler
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("reminder {0} is not scheduled in the future")]
    NotInFuture(String),

    #[error("reminder {0} has an out-of-range timestamp")]
    InvalidTimestamp(String),

    #[error("reminder {0} cannot be scheduled outside a tokio runtime")]
    NoRuntime(String),
}
