use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::warn;

use crate::config::RetryConfig;
use crate::error::{Error, Result};

/// Wall-clock budget shared by every request of one aggregation call.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
        }
    }

    /// Time left before expiry, `None` once expired.
    pub fn remaining(&self) -> Option<Duration> {
        self.at.checked_duration_since(Instant::now())
    }
}

/// Fixed-backoff retry policy for upstream requests.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, backoff: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            backoff,
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(config.attempts, config.backoff)
    }
}

/// Run `attempt` until it succeeds, retries are exhausted, or the deadline
/// expires.
///
/// The deadline is checked before every attempt and every backoff sleep, and
/// bounds each in-flight attempt; expiry maps to [`Error::Timeout`] and is
/// never retried, including a `Timeout` bubbling out of a nested operation.
pub async fn retry<T, F, Fut>(
    policy: RetryPolicy,
    deadline: Option<Deadline>,
    operation: &'static str,
    mut attempt: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let timeout_error = || Error::Timeout {
        operation: operation.to_string(),
    };

    let mut last = None;
    for round in 1..=policy.attempts {
        let outcome = match deadline {
            Some(deadline) => {
                let Some(remaining) = deadline.remaining() else {
                    return Err(timeout_error());
                };
                match tokio::time::timeout(remaining, attempt()).await {
                    Ok(outcome) => outcome,
                    Err(_) => return Err(timeout_error()),
                }
            }
            None => attempt().await,
        };

        match outcome {
            Ok(value) => return Ok(value),
            Err(error @ Error::Timeout { .. }) => return Err(error),
            Err(error) => {
                warn!(operation, attempt = round, %error, "upstream request failed");
                last = Some(error);
            }
        }

        if round < policy.attempts {
            if deadline.is_some_and(|d| d.remaining().is_none()) {
                return Err(timeout_error());
            }
            tokio::time::sleep(policy.backoff).await;
        }
    }

    Err(Error::RetriesExhausted {
        operation: operation.to_string(),
        attempts: policy.attempts,
        last: last.map(|e| e.to_string()).unwrap_or_default(),
    })
}
