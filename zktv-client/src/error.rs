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

//! Error taxonomy of the live-video core.

use crate::media_devices::DeviceKind;
use crate::rtc::{MediaKind, RtcError};
use thiserror::Error;
use zktv_api_client::ApiError;

#[derive(Debug, Error)]
pub enum LiveError {
    /// The selected camera/microphone is no longer enumerated.
    #[error("{kind} '{device_id}' is no longer available, please select another device")]
    DeviceUnavailable { kind: DeviceKind, device_id: String },

    /// A track stayed muted/disabled after the publish-time correction.
    #[error("{kind} track invariant violated: {detail}")]
    TrackInvariantViolation { kind: MediaKind, detail: String },

    /// The RTC connection dropped. `terminal` means the retry budget is
    /// exhausted and only a page reload recovers.
    #[error("connection lost: {reason}")]
    ConnectionLost { reason: String, terminal: bool },

    /// The browser or SDK lacks a capability. Informational, never fatal.
    #[error("{feature} is not supported here. {workaround}")]
    FeatureUnsupported { feature: String, workaround: String },

    /// Desktop capture returned without an audio track.
    #[error("no audio track selected, tick \"share audio\" in the capture dialog")]
    NoAudioTrackSelected,

    /// Anonymous or expired credentials on a presence call.
    #[error("presence call rejected: {0}")]
    AuthTransient(String),

    #[error("a join is already in progress")]
    JoinInProgress,

    #[error("operation not allowed while {0}")]
    InvalidState(String),

    #[error(transparent)]
    Rtc(#[from] RtcError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("session storage error: {0}")]
    Storage(String),
}

impl LiveError {
    pub(crate) fn unsupported(feature: &str, workaround: &str) -> Self {
        LiveError::FeatureUnsupported {
            feature: feature.to_string(),
            workaround: workaround.to_string(),
        }
    }

    /// Whether the caller should show a blocking "reload required" message.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LiveError::ConnectionLost { terminal: true, .. })
    }
}

pub type Result<T> = std::result::Result<T, LiveError>;
