//! Exponential backoff with jitter.

use std::time::Duration;
use rand::Rng;

use crate::config::ProberConfig;

/// Calculate exponential backoff delay with jitter.
///
/// `attempt` is 1-based: the first failed attempt waits `base_ms`, each
/// following one multiplies the delay, and the result is clamped to `max_ms`.
pub fn calculate_backoff(attempt: u32, base_ms: u64, multiplier: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exponential_base = multiplier.saturating_pow(attempt - 1);
    let delay_ms = base_ms.saturating_mul(exponential_base);
    let capped_delay = delay_ms.min(max_ms);

    // Apply jitter (0 to 10% of the delay)
    let jitter_range = capped_delay / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay + jitter)
}

/// Backoff policy used between reconnection attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub initial_ms: u64,
    pub max_ms: u64,
    pub multiplier: u64,
}

impl Backoff {
    pub fn new(initial_ms: u64, max_ms: u64, multiplier: u64) -> Self {
        Self {
            initial_ms,
            max_ms,
            multiplier,
        }
    }

    pub fn from_config(config: &ProberConfig) -> Self {
        Self::new(config.initial_delay_ms, config.max_delay_ms, config.multiplier)
    }

    /// Delay to wait after the given failed attempt (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        calculate_backoff(attempt, self.initial_ms, self.multiplier, self.max_ms)
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::from_config(&ProberConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_calculation() {
        let b1 = calculate_backoff(1, 100, 2, 2000);
        assert!(b1.as_millis() >= 100);
        assert!(b1.as_millis() < 110);

        let b2 = calculate_backoff(2, 100, 2, 2000);
        assert!(b2.as_millis() >= 200);
        assert!(b2.as_millis() < 220);

        let max = calculate_backoff(10, 100, 2, 1000);
        assert!(max.as_millis() >= 1000);
        assert!(max.as_millis() < 1100);
    }

    #[test]
    fn test_backoff_clamps_instead_of_wrapping() {
        let backoff = Backoff::default();
        assert_eq!(backoff.initial_ms, 10);
        assert_eq!(backoff.max_ms, 40_000);

        // 10ms * 2^12 = 40960ms would exceed the max.
        let late = backoff.delay(13);
        assert!(late.as_millis() >= 40_000);
        assert!(late.as_millis() < 44_000);

        // Far past the max, the exponent saturates and the delay stays clamped.
        let very_late = backoff.delay(200);
        assert!(very_late.as_millis() >= 40_000);
    }

    #[test]
    fn test_zero_attempt() {
        assert_eq!(calculate_backoff(0, 100, 2, 1000), Duration::ZERO);
    }
}
