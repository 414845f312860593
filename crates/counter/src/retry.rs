//! Retry policy for version-conditioned writes
//!
//! Contention on a single counter key is rare (one allocation per number
//! assignment), so the allocators trade perfect availability for bounded
//! latency: a small number of attempts with exponential backoff and full
//! jitter between them. The policy is injected configuration, never a
//! hard-coded constant.

use rand::Rng;
use std::time::Duration;

/// Bounded-retry configuration for the pooled allocator and reclaim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first (must be >= 1)
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles each retry
    pub base_delay: Duration,
    /// Upper bound on any single delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(25),
            max_delay: Duration::from_millis(250),
        }
    }
}

impl RetryPolicy {
    /// A policy that retries without sleeping (test workloads)
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Jittered delay before retrying after `attempt` (1-based) failed
    ///
    /// Full jitter: uniform in `[0, min(max_delay, base_delay * 2^(attempt-1))]`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if self.base_delay.is_zero() {
            return Duration::ZERO;
        }
        let exp = attempt.saturating_sub(1).min(16);
        let ceiling = self
            .base_delay
            .saturating_mul(1u32 << exp)
            .min(self.max_delay);
        if ceiling.is_zero() {
            return Duration::ZERO;
        }
        let nanos = rand::thread_rng().gen_range(0..=ceiling.as_nanos() as u64);
        Duration::from_nanos(nanos)
    }

    /// Sleep for the jittered delay after a failed `attempt`
    pub fn backoff(&self, attempt: u32) {
        let delay = self.delay_for(attempt);
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }
}
