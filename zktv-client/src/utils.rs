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

use std::time::Duration;

use crate::constants::{REMOTE_TRACK_POLL_ATTEMPTS, REMOTE_TRACK_POLL_INTERVAL_MS};

/// How many times to probe and how long to wait between probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: REMOTE_TRACK_POLL_ATTEMPTS,
            interval: Duration::from_millis(REMOTE_TRACK_POLL_INTERVAL_MS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    Found(T),
    TimedOut { attempts: u32 },
}

impl<T> PollOutcome<T> {
    pub fn found(self) -> Option<T> {
        match self {
            PollOutcome::Found(value) => Some(value),
            PollOutcome::TimedOut { .. } => None,
        }
    }
}

/// Probe until `probe` yields a value or the attempts run out.
///
/// The first probe runs immediately; each later probe waits
/// `policy.interval`. A policy of zero attempts times out without probing.
pub async fn await_condition<T, F>(mut probe: F, policy: PollPolicy) -> PollOutcome<T>
where
    F: FnMut() -> Option<T>,
{
    for attempt in 1..=policy.max_attempts {
        if attempt > 1 {
            tokio::time::sleep(policy.interval).await;
        }
        if let Some(value) = probe() {
            return PollOutcome::Found(value);
        }
    }
    PollOutcome::TimedOut {
        attempts: policy.max_attempts,
    }
}
