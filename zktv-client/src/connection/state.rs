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

use crate::rtc::SdkConnectionState;
use std::fmt;

/// Connection state of a [`LiveSession`](crate::LiveSession).
///
/// `Idle -> Connecting -> Connected -> {Reconnecting -> Connected | Failed}
/// -> Disconnecting -> Disconnected`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Connected,
    Reconnecting {
        attempt: u32,
        max_attempts: u32,
        delay_ms: u64,
    },
    Disconnecting,
    Disconnected,
    /// Terminal until the user reloads or retries `join` by hand.
    Failed {
        reason: String,
    },
}

impl ConnectionState {
    /// States from which `join` may be called.
    pub fn can_join(&self) -> bool {
        matches!(
            self,
            ConnectionState::Idle | ConnectionState::Disconnected | ConnectionState::Failed { .. }
        )
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    pub fn is_reconnecting(&self) -> bool {
        matches!(self, ConnectionState::Reconnecting { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ConnectionState::Failed { .. })
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Idle => write!(f, "idle"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
            ConnectionState::Reconnecting {
                attempt,
                max_attempts,
                ..
            } => write!(f, "reconnecting ({attempt}/{max_attempts})"),
            ConnectionState::Disconnecting => write!(f, "disconnecting"),
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Failed { reason } => write!(f, "failed: {reason}"),
        }
    }
}

/// Whether an SDK transition is a drop the session did not ask for.
///
/// `DISCONNECTING -> DISCONNECTED` is a clean leave and never counts.
pub fn is_unexpected_drop(current: SdkConnectionState, previous: SdkConnectionState) -> bool {
    matches!(
        current,
        SdkConnectionState::Disconnected | SdkConnectionState::Failed
    ) && !matches!(
        previous,
        SdkConnectionState::Disconnected | SdkConnectionState::Disconnecting
    )
}
