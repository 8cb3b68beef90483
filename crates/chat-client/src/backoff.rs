//! Reconnect backoff

use rand::Rng;
use std::time::Duration;

/// Exponential backoff with jitter and a bounded number of attempts
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    /// Delay before the first retry
    pub initial: Duration,
    /// Growth factor per attempt
    pub multiplier: f64,
    /// Upper bound for any single delay
    pub max_delay: Duration,
    /// Fraction of the delay randomized in either direction, 0.0 to 1.0
    pub jitter: f64,
    /// Retries before the client gives up and reports `Failed`
    pub max_attempts: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(500),
            multiplier: 2.0,
            max_delay: Duration::from_secs(30),
            jitter: 0.2,
            max_attempts: 10,
        }
    }
}

impl BackoffPolicy {
    /// Policy without jitter, for deterministic schedules
    #[must_use]
    pub fn fixed(initial: Duration, multiplier: f64, max_delay: Duration, max_attempts: u32) -> Self {
        Self {
            initial,
            multiplier,
            max_delay,
            jitter: 0.0,
            max_attempts,
        }
    }

    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Delay before retry `attempt` (1-based), before jitter
    #[must_use]
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let millis = self.initial.as_millis() as f64 * self.multiplier.powi(exponent);
        let capped = millis.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }

    /// Delay before retry `attempt` with jitter applied, never above `max_delay`
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        let base = self.base_delay(attempt);
        let jitter = self.jitter.clamp(0.0, 1.0);
        if jitter <= 0.0 {
            return base;
        }

        let factor = rand::thread_rng().gen_range((1.0 - jitter)..=(1.0 + jitter));
        base.mul_f64(factor).min(self.max_delay)
    }

    /// Whether retry `attempt` is past the limit
    #[must_use]
    pub fn is_exhausted(&self, attempt: u32) -> bool {
        attempt > self.max_attempts
    }
}
