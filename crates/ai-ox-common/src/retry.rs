use std::time::Duration;

use backon::BackoffBuilder;

/// How many times a request is attempted and how long to wait in between.
///
/// The wait before retry `n` (1-based) is `base_delay * n`, so a policy of
/// three attempts with a 10 second base waits 10 s and then 20 s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub const fn new(max_attempts: usize, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Policy that makes a single attempt
    pub const fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Delays between consecutive attempts, in order
    pub fn delays(&self) -> LinearBackoff {
        self.build()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(10))
    }
}

impl BackoffBuilder for RetryPolicy {
    type Backoff = LinearBackoff;

    fn build(self) -> Self::Backoff {
        LinearBackoff {
            base_delay: self.base_delay,
            retries_left: self.max_attempts.saturating_sub(1),
            retry: 0,
        }
    }
}

/// Backoff yielding `base, 2 * base, 3 * base, ...` until the retries run out
#[derive(Debug, Clone)]
pub struct LinearBackoff {
    base_delay: Duration,
    retries_left: usize,
    retry: u32,
}

impl Iterator for LinearBackoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if self.retries_left == 0 {
            return None;
        }
        self.retries_left -= 1;
        self.retry = self.retry.saturating_add(1);
        Some(self.base_delay.saturating_mul(self.retry))
    }
}
