use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::RetryIf;
use tracing::{debug, warn};

use crate::error::CallError;

/// Retry budget of the RPC transport.
///
/// The dispatcher never retries on its own; a call that still fails after
/// this budget is final for the resolution pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts including the first one (default: 3)
    pub max_attempts: u32,
    /// Delay before the first retry in milliseconds (default: 100ms)
    pub base_delay_ms: u64,
    /// Maximum delay cap in milliseconds (default: 5000ms)
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 100,
            max_delay_ms: 5000,
        }
    }
}

impl RetryConfig {
    /// Retry configuration for JSON-RPC reads
    pub fn for_blockchain() -> Self {
        Self {
            max_attempts: 4,
            base_delay_ms: 250,
            max_delay_ms: 4000,
        }
    }

    /// No retries at all, used by tests and by callers with their own policy
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay_ms: 0,
            max_delay_ms: 0,
        }
    }

    /// Delays between attempts: doubling from `base_delay_ms`, capped, jittered.
    fn strategy(&self) -> impl Iterator<Item = Duration> {
        // ExponentialBackoff yields base^n * factor, so base 2 with half the
        // configured delay as factor gives base_delay, 2*base_delay, ...
        ExponentialBackoff::from_millis(2)
            .factor((self.base_delay_ms / 2).max(1))
            .max_delay(Duration::from_millis(self.max_delay_ms))
            .map(jitter)
            .take(self.max_attempts.saturating_sub(1) as usize)
    }
}

/// Execute a read with exponential backoff, retrying transport failures only
pub async fn with_retry<F, Fut, T>(
    operation_name: &str,
    config: &RetryConfig,
    mut operation: F,
) -> Result<T, CallError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CallError>>,
{
    let max_attempts = config.max_attempts;

    RetryIf::start(
        config.strategy(),
        || {
            debug!(operation = operation_name, max_attempts, "Executing read with retry logic");
            operation()
        },
        |error: &CallError| {
            let retry = error.is_retryable();
            if retry {
                warn!(
                    operation = operation_name,
                    max_attempts,
                    error = %error,
                    "Read failed, retrying after delay"
                );
            }
            retry
        },
    )
    .await
}
