//! Retry policy and backend failure classification.

use std::time::Duration;

/// Bounded exponential-backoff configuration for backend calls.
///
/// Both knobs are explicit so tests can inject a tiny budget instead of
/// sleeping for real seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of tries, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on each subsequent one.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with an explicit attempt budget and base delay.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Backoff delay after the failure of `attempt` (0-based):
    /// `base_delay * 2^attempt`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Whether a backend failure is worth retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Rate limit or server error; retry with backoff.
    Transient,
    /// Bad request, auth failure, not found; retrying cannot succeed.
    Permanent,
}

impl FailureClass {
    /// Classify an HTTP status code.
    pub fn classify(status: u16) -> Self {
        match status {
            429 | 500 | 503 => Self::Transient,
            _ => Self::Permanent,
        }
    }
}
