//! Bounded retry with linear backoff.
//!
//! The loop is an explicit state machine: every attempt outcome is fed to
//! [`RetryState::record`], which answers with the next step. The bound and the
//! backoff schedule can be inspected without doing any I/O.

use std::future::Future;
use std::time::Duration;
use tracing::{error, warn};

use crate::error::{PalError, PalResult};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Backoff after failed attempt `n` is `(1 + n) * backoff_unit`
    pub backoff_unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_unit: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Wait after the failed attempt numbered `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_unit * (1 + attempt)
    }

    /// Every wait the policy can produce, in order.
    pub fn schedule(&self) -> Vec<Duration> {
        (1..self.max_attempts).map(|n| self.backoff(n)).collect()
    }

    pub fn start(&self) -> RetryState {
        RetryState {
            policy: *self,
            attempts: 0,
        }
    }
}

/// Result of a single attempt as judged by the caller.
#[derive(Debug)]
pub enum AttemptOutcome<T> {
    Success(T),
    /// Worth trying again, e.g. a 5xx status or an undecodable body
    Retryable(String),
    /// Retrying cannot help, e.g. a rejected request
    Terminal(String),
}

/// What the caller does next.
#[derive(Debug, PartialEq)]
pub enum RetryStep<T> {
    Done(T),
    Wait(Duration),
    GiveUp { attempts: u32, last_failure: String },
}

#[derive(Debug, Clone)]
pub struct RetryState {
    policy: RetryPolicy,
    attempts: u32,
}

impl RetryState {
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn record<T>(&mut self, outcome: AttemptOutcome<T>) -> RetryStep<T> {
        self.attempts += 1;
        match outcome {
            AttemptOutcome::Success(value) => RetryStep::Done(value),
            AttemptOutcome::Terminal(reason) => RetryStep::GiveUp {
                attempts: self.attempts,
                last_failure: reason,
            },
            AttemptOutcome::Retryable(reason) => {
                if self.attempts >= self.policy.max_attempts {
                    RetryStep::GiveUp {
                        attempts: self.attempts,
                        last_failure: reason,
                    }
                } else {
                    RetryStep::Wait(self.policy.backoff(self.attempts))
                }
            }
        }
    }
}

/// Drive `attempt` until it succeeds or the policy gives up.
///
/// The closure receives the 1-based attempt number.
pub async fn run_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut attempt: F,
) -> PalResult<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = AttemptOutcome<T>>,
{
    let mut state = policy.start();

    loop {
        let outcome = attempt(state.attempts() + 1).await;
        let failure = match &outcome {
            AttemptOutcome::Retryable(reason) | AttemptOutcome::Terminal(reason) => {
                Some(reason.clone())
            }
            AttemptOutcome::Success(_) => None,
        };

        match state.record(outcome) {
            RetryStep::Done(value) => return Ok(value),
            RetryStep::Wait(delay) => {
                warn!(
                    "{}: attempt {}/{} failed: {}. Retrying in {:?}",
                    label,
                    state.attempts(),
                    policy.max_attempts,
                    failure.unwrap_or_default(),
                    delay
                );
                tokio::time::sleep(delay).await;
            }
            RetryStep::GiveUp {
                attempts,
                last_failure,
            } => {
                error!(
                    "{}: giving up after {} attempt(s): {}",
                    label, attempts, last_failure
                );
                return Err(PalError::CatalogUnavailable {
                    attempts,
                    last_failure,
                });
            }
        }
    }
}

/// Map an HTTP status to the retry decision for a non-200 response.
///
/// Statuses listed in `terminal` end the loop; every other status is retried.
pub fn classify_status<T>(status: u16, terminal: &[u16]) -> AttemptOutcome<T> {
    let reason = format!("HTTP status {}", status);
    if terminal.contains(&status) {
        AttemptOutcome::Terminal(reason)
    } else {
        AttemptOutcome::Retryable(reason)
    }
}
