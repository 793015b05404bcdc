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

use crate::constants::{
    HEARTBEAT_FIRST_JITTER_MAX_MS, HEARTBEAT_INTERVAL_JITTER_MS, HEARTBEAT_INTERVAL_MS,
};
use rand::Rng;
use std::time::Duration;

/// Jittered heartbeat timing, so viewers who arrived together do not beat
/// together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatSchedule {
    pub first_jitter_max: Duration,
    pub interval: Duration,
    pub interval_jitter: Duration,
}

impl Default for HeartbeatSchedule {
    fn default() -> Self {
        Self {
            first_jitter_max: Duration::from_millis(HEARTBEAT_FIRST_JITTER_MAX_MS),
            interval: Duration::from_millis(HEARTBEAT_INTERVAL_MS),
            interval_jitter: Duration::from_millis(HEARTBEAT_INTERVAL_JITTER_MS),
        }
    }
}

impl HeartbeatSchedule {
    /// Uniform in `[0, first_jitter_max]`.
    pub fn first_delay<R: Rng>(&self, rng: &mut R) -> Duration {
        let max = self.first_jitter_max.as_millis() as u64;
        Duration::from_millis(rng.gen_range(0..=max))
    }

    /// Uniform in `[interval - jitter, interval + jitter]`.
    pub fn next_interval<R: Rng>(&self, rng: &mut R) -> Duration {
        let base = self.interval.as_millis() as u64;
        let jitter = self.interval_jitter.as_millis() as u64;
        Duration::from_millis(rng.gen_range(base.saturating_sub(jitter)..=base + jitter))
    }
}
