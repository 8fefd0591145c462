//! Reconnection Policy
//!
//! Exponential backoff for feed reconnection: each unclean close waits
//! `min(initial * 2^attempt, max_delay)` before the next attempt, up to
//! a configurable attempt cap. Jitter is supported but off by default
//! so the schedule is exact.

use std::time::Duration;

use rand::Rng;

use crate::infrastructure::config::WebSocketSettings;

/// Configuration for reconnection behavior.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt.
    pub initial_delay: Duration,
    /// Maximum delay between reconnection attempts.
    pub max_delay: Duration,
    /// Multiplier applied to the delay after each attempt.
    pub multiplier: f64,
    /// Jitter factor as a fraction (e.g. 0.1 = +/-10% randomization).
    pub jitter_factor: f64,
    /// Maximum number of reconnection attempts (0 = unlimited).
    pub max_attempts: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            jitter_factor: 0.0,
            max_attempts: 10,
        }
    }
}

impl ReconnectConfig {
    /// Create configuration from WebSocket settings.
    #[must_use]
    pub const fn from_settings(settings: &WebSocketSettings) -> Self {
        Self {
            initial_delay: settings.reconnect_delay_initial,
            max_delay: settings.reconnect_delay_max,
            multiplier: settings.reconnect_delay_multiplier,
            jitter_factor: 0.0,
            max_attempts: settings.max_reconnect_attempts,
        }
    }
}

/// Reconnection policy tracking the attempt count and current delay.
///
/// Mutated only by the feed client loop; reset on every successful
/// open so the budget applies to consecutive failures.
#[derive(Debug)]
pub struct ReconnectPolicy {
    config: ReconnectConfig,
    current_delay: Duration,
    attempt_count: u32,
}

impl ReconnectPolicy {
    /// Create a new reconnection policy.
    #[must_use]
    pub const fn new(config: ReconnectConfig) -> Self {
        let initial_delay = config.initial_delay;
        Self {
            config,
            current_delay: initial_delay,
            attempt_count: 0,
        }
    }

    /// Get the next delay, advancing the schedule.
    ///
    /// Returns `None` once the attempt budget is spent; the caller must
    /// stop retrying and surface a terminal failure.
    #[must_use]
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.config.max_attempts > 0 && self.attempt_count >= self.config.max_attempts {
            return None;
        }

        self.attempt_count += 1;

        let delay = self.apply_jitter(self.current_delay);

        #[allow(clippy::cast_precision_loss)]
        let scaled = (self.current_delay.as_millis() as f64 * self.config.multiplier).round();
        let next_millis = if scaled.is_finite() && scaled > 0.0 {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            {
                scaled as u128
            }
        } else {
            0
        };
        let capped = next_millis.min(self.config.max_delay.as_millis());
        self.current_delay = Duration::from_millis(u64::try_from(capped).unwrap_or(u64::MAX));

        Some(delay)
    }

    /// Reset the policy after a successful connection.
    pub const fn reset(&mut self) {
        self.current_delay = self.config.initial_delay;
        self.attempt_count = 0;
    }

    /// Attempts consumed since the last reset.
    #[must_use]
    pub const fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    /// Attempts remaining, `None` when unlimited.
    #[must_use]
    pub const fn attempts_remaining(&self) -> Option<u32> {
        if self.config.max_attempts == 0 {
            None
        } else {
            Some(self.config.max_attempts.saturating_sub(self.attempt_count))
        }
    }

    /// Check whether another attempt is allowed.
    #[must_use]
    pub const fn should_retry(&self) -> bool {
        self.config.max_attempts == 0 || self.attempt_count < self.config.max_attempts
    }

    fn apply_jitter(&self, duration: Duration) -> Duration {
        if self.config.jitter_factor <= 0.0 {
            return duration;
        }

        #[allow(clippy::cast_precision_loss)]
        let base_millis = duration.as_millis() as f64;
        let jitter_range = base_millis * self.config.jitter_factor;
        let mut rng = rand::rng();
        let jitter: f64 = rng.random_range(-jitter_range..=jitter_range);
        let adjusted = (base_millis + jitter).max(1.0);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Duration::from_millis(adjusted as u64)
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn policy(initial_ms: u64, max_secs: u64, max_attempts: u32) -> ReconnectPolicy {
        ReconnectPolicy::new(ReconnectConfig {
            initial_delay: Duration::from_millis(initial_ms),
            max_delay: Duration::from_secs(max_secs),
            multiplier: 2.0,
            jitter_factor: 0.0,
            max_attempts,
        })
    }

    #[test_case(1, 1000; "first attempt waits the initial delay")]
    #[test_case(2, 2000; "second attempt doubles")]
    #[test_case(3, 4000; "third attempt doubles again")]
    #[test_case(4, 8000; "fourth attempt")]
    #[test_case(5, 16000; "fifth attempt")]
    #[test_case(6, 30000; "sixth attempt hits the cap")]
    #[test_case(7, 30000; "cap holds thereafter")]
    fn schedule_is_doubling_with_cap(attempt: u32, expected_ms: u64) {
        let mut policy = policy(1000, 30, 0);
        let mut delay = Duration::ZERO;
        for _ in 0..attempt {
            delay = policy.next_delay().unwrap();
        }
        assert_eq!(delay, Duration::from_millis(expected_ms));
    }

    #[test]
    fn budget_exhausts_after_max_attempts() {
        let mut policy = policy(100, 1, 3);

        assert!(policy.next_delay().is_some());
        assert!(policy.next_delay().is_some());
        assert!(policy.next_delay().is_some());
        assert_eq!(policy.attempt_count(), 3);
        assert_eq!(policy.attempts_remaining(), Some(0));

        assert!(policy.next_delay().is_none());
        assert!(!policy.should_retry());
    }

    #[test]
    fn attempts_remaining_counts_down() {
        let mut policy = policy(100, 1, 3);
        assert_eq!(policy.attempts_remaining(), Some(3));
        let _ = policy.next_delay();
        assert_eq!(policy.attempts_remaining(), Some(2));
    }

    #[test]
    fn unlimited_when_max_attempts_is_zero() {
        let mut policy = policy(10, 1, 0);
        assert_eq!(policy.attempts_remaining(), None);
        for _ in 0..500 {
            assert!(policy.next_delay().is_some());
        }
        assert!(policy.should_retry());
    }

    #[test]
    fn reset_restores_initial_schedule() {
        let mut policy = policy(100, 10, 3);
        let _ = policy.next_delay();
        let _ = policy.next_delay();
        assert_eq!(policy.attempt_count(), 2);

        policy.reset();

        assert_eq!(policy.attempt_count(), 0);
        assert_eq!(policy.next_delay().unwrap(), Duration::from_millis(100));
    }

    #[test]
    fn jitter_stays_within_bounds() {
        for _ in 0..100 {
            let mut policy = ReconnectPolicy::new(ReconnectConfig {
                initial_delay: Duration::from_millis(1000),
                max_delay: Duration::from_secs(10),
                multiplier: 2.0,
                jitter_factor: 0.1,
                max_attempts: 0,
            });

            let millis = policy.next_delay().unwrap().as_millis();
            assert!((900..=1100).contains(&millis), "delay {millis}ms out of bounds");
        }
    }

    #[test]
    fn defaults_match_documented_schedule() {
        let config = ReconnectConfig::default();
        assert_eq!(config.initial_delay, Duration::from_millis(1000));
        assert_eq!(config.max_delay, Duration::from_secs(30));
        assert!((config.multiplier - 2.0).abs() < f64::EPSILON);
        assert!(config.jitter_factor.abs() < f64::EPSILON);
        assert_eq!(config.max_attempts, 10);
    }
}
