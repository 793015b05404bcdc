/*
 * Copyright 2025 Security Union LLC
 *
 * Licensed under either of
 *
 * * Apache License, Version 2.0
 *   (http://www.apache.org/licenses/LICENSE-2.0)
 * * MIT license
 *   (http://opensource.org/licenses/MIT)
 *
 * at your option.
 *
 * Unless you explicitly state otherwise, any contribution intentionally
 * submitted for inclusion in the work by you, as defined in the Apache-2.0
 * license, shall be dual licensed as above, without any additional terms or
 * conditions.
 */

use crate::constants::{RECONNECT_BASE_DELAY_MS, RECONNECT_MAX_ATTEMPTS, RECONNECT_MAX_DELAY_MS};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: RECONNECT_MAX_ATTEMPTS,
            base_delay_ms: RECONNECT_BASE_DELAY_MS,
            max_delay_ms: RECONNECT_MAX_DELAY_MS,
        }
    }
}

impl ReconnectPolicy {
    /// Delay before 1-indexed attempt `n`: `min(2^(n-1) * base, max)`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(32);
        let ms = self
            .base_delay_ms
            .saturating_mul(1u64 << exponent)
            .min(self.max_delay_ms);
        Duration::from_millis(ms)
    }
}

/// Bounded attempt counter. Resets on a successful reconnect.
#[derive(Debug, Clone, Default)]
pub struct ReconnectCounter {
    policy: ReconnectPolicy,
    attempts: u32,
}

impl ReconnectCounter {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            attempts: 0,
        }
    }

    /// Claim the next attempt and its delay, or `None` once exhausted.
    pub fn next_attempt(&mut self) -> Option<(u32, Duration)> {
        if self.attempts >= self.policy.max_attempts {
            return None;
        }
        self.attempts += 1;
        Some((self.attempts, self.policy.delay_for(self.attempts)))
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn max_attempts(&self) -> u32 {
        self.policy.max_attempts
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.policy.max_attempts
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delays_double_and_cap_at_thirty_seconds() {
        let policy = ReconnectPolicy::default();
        let delays: Vec<u64> = (1..=7)
            .map(|n| policy.delay_for(n).as_millis() as u64)
            .collect();
        assert_eq!(delays, vec![1000, 2000, 4000, 8000, 16000, 30000, 30000]);
    }

    #[test]
    fn delay_formula_holds_for_large_attempts() {
        let policy = ReconnectPolicy::default();
        for n in 1..=100 {
            let expected = 2u128
                .checked_pow(n - 1)
                .map(|p| (p * 1000).min(30000))
                .unwrap_or(30000);
            assert_eq!(policy.delay_for(n).as_millis(), expected, "attempt {n}");
        }
    }

    #[test]
    fn counter_is_bounded() {
        let mut counter = ReconnectCounter::default();
        let attempts: Vec<u32> = std::iter::from_fn(|| counter.next_attempt().map(|(n, _)| n)).collect();
        assert_eq!(attempts, vec![1, 2, 3, 4, 5, 6]);
        assert!(counter.is_exhausted());
        assert_eq!(counter.next_attempt(), None);
    }

    #[test]
    fn reset_starts_over() {
        let mut counter = ReconnectCounter::default();
        counter.next_attempt();
        counter.next_attempt();
        counter.reset();
        assert_eq!(counter.attempts(), 0);
        assert_eq!(
            counter.next_attempt(),
            Some((1, Duration::from_millis(1000)))
        );
    }
}
