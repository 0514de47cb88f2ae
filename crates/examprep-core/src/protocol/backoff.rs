//! Linear reconnect backoff with a bounded number of retries.
//!
//! # How the policy works (for beginners)
//!
//! When the connection fails or drops, the client does not retry immediately:
//! hammering a server that is down only makes things worse.  Instead it waits
//! a little longer after each consecutive failure:
//!
//! | Retry | Delay  |
//! |-------|--------|
//! | 1     | 1 s    |
//! | 2     | 2 s    |
//! | 3     | 3 s    |
//! | 4     | 4 s    |
//! | 5     | 5 s    |
//! | 6     | give up |
//!
//! The delay is `base_delay × retry`, capped at `max_delay` (10 s by
//! default, which only matters when `max_retries` is raised above 10).
//!
//! A successful connection resets the counter, so the next outage starts
//! again at 1 s.

use std::time::Duration;

/// Default number of retries after which the client gives up.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Default delay unit; retry `n` waits `n` units.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1_000);

/// Default upper bound for a single delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(10_000);

/// Immutable reconnect parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Number of retries scheduled before giving up.
    pub max_retries: u32,
    /// Delay unit for the linear backoff.
    pub base_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl ReconnectPolicy {
    /// Returns the delay for the given 1-based retry number.
    ///
    /// Saturates instead of overflowing for very large retry numbers.
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay
            .checked_mul(retry)
            .unwrap_or(Duration::MAX)
            .min(self.max_delay)
    }
}

/// Consecutive-failure counter driven by a [`ReconnectPolicy`].
///
/// Owned by exactly one connection session; never shared.
#[derive(Debug, Clone)]
pub struct RetryState {
    policy: ReconnectPolicy,
    count: u32,
}

impl RetryState {
    /// Creates a counter at zero.
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self { policy, count: 0 }
    }

    /// Number of consecutive failures recorded since the last reset.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Clears the counter after a successful open.
    pub fn reset(&mut self) {
        self.count = 0;
    }

    /// Records one failure and returns how long to wait before the next
    /// attempt, or `None` once the retry budget is used up.
    pub fn next_delay(&mut self) -> Option<Duration> {
        self.count = self.count.saturating_add(1);
        if self.count > self.policy.max_retries {
            None
        } else {
            Some(self.policy.delay_for(self.count))
        }
    }

    /// `true` once [`next_delay`](Self::next_delay) has returned `None`.
    pub fn is_exhausted(&self) -> bool {
        self.count > self.policy.max_retries
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
