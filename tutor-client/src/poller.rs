//! Cancellable polling with backoff
//!
//! Waiting suspends on the tokio timer and wakes early when the
//! cancellation token fires. The delay between checks starts at
//! [`PollPolicy::interval`] and grows by [`PollPolicy::multiplier`] up to
//! [`PollPolicy::max_interval`]; a multiplier of 1 gives a fixed interval.

use std::future::Future;
use std::time::Duration;

use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// How often and for how long to poll a remote job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay before the second check
    pub interval: Duration,

    /// Upper bound for the delay between checks
    pub max_interval: Duration,

    /// Growth factor applied to the delay after each check
    pub multiplier: u32,

    /// Total time to wait before giving up
    pub max_wait: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(8),
            multiplier: 2,
            max_wait: Duration::from_secs(300), // 5 minutes
        }
    }
}

impl PollPolicy {
    /// Policy polling at a fixed interval
    pub fn fixed(interval: Duration, max_wait: Duration) -> Self {
        Self {
            interval,
            max_interval: interval,
            multiplier: 1,
            max_wait,
        }
    }

    /// Delay following `current`, capped at `max_interval`
    pub fn next_delay(&self, current: Duration) -> Duration {
        current
            .saturating_mul(self.multiplier.max(1))
            .min(self.max_interval)
    }

    /// Successive delays this policy produces
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        std::iter::successors(Some(self.interval.min(self.max_interval)), |d| {
            Some(self.next_delay(*d))
        })
    }

    /// Validates the policy
    pub fn validate(&self) -> Result<(), String> {
        if self.interval.is_zero() {
            return Err("poll interval must be greater than 0".to_string());
        }
        if self.max_interval < self.interval {
            return Err("max poll interval must not be below the poll interval".to_string());
        }
        if self.multiplier == 0 {
            return Err("poll multiplier must be at least 1".to_string());
        }
        if self.max_wait.is_zero() {
            return Err("max wait must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Result of waiting for a condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Wait<T> {
    /// The check produced a value
    Ready(T),
    /// `max_wait` elapsed first
    TimedOut,
    /// The cancellation token fired first
    Cancelled,
}

/// Sleeps for `delay` unless `cancel` fires first
///
/// Returns `true` if the sleep was interrupted by cancellation.
pub async fn pause(delay: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => true,
        _ = time::sleep(delay) => false,
    }
}

/// Runs `check` until it yields a value, the policy's deadline passes, or
/// `cancel` fires
///
/// The check runs once more at the deadline before giving up. Errors from
/// the check end the wait immediately.
pub async fn poll_until<T, E, F, Fut>(
    policy: &PollPolicy,
    cancel: &CancellationToken,
    mut check: F,
) -> Result<Wait<T>, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    let deadline = Instant::now() + policy.max_wait;
    let mut delays = policy.delays();
    let mut attempt = 0u32;

    loop {
        if cancel.is_cancelled() {
            return Ok(Wait::Cancelled);
        }

        attempt += 1;
        if let Some(value) = check().await? {
            return Ok(Wait::Ready(value));
        }

        let now = Instant::now();
        if now >= deadline {
            debug!("Gave up after {} check(s)", attempt);
            return Ok(Wait::TimedOut);
        }

        let delay = delays
            .next()
            .unwrap_or(policy.max_interval)
            .min(deadline - now);
        if pause(delay, cancel).await {
            return Ok(Wait::Cancelled);
        }
    }
}
