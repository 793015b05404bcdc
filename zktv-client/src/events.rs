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

//! Framework-agnostic events emitted by a live session.
//!
//! UI layers subscribe through [`EventBus`](crate::EventBus) and turn these
//! into toasts, indicators and overlays.

use crate::connection::ConnectionState;
use crate::rtc::MediaKind;

#[derive(Clone, Debug, PartialEq)]
pub enum ClientEvent {
    // === Connection Events ===
    StateChanged(ConnectionState),

    /// Transient "reconnecting" indicator.
    Reconnecting { attempt: u32, delay_ms: u64 },

    Reconnected,

    /// Retry budget exhausted; the user must reload.
    ReloadRequired(String),

    /// SDK `exception` event; informational.
    Exception { code: String, message: String },

    // === Remote Events ===
    RemoteUserJoined(String),
    RemoteUserLeft(String),
    RemoteTrackReady { uid: String, kind: MediaKind },
    RemoteTrackRemoved { uid: String, kind: MediaKind },

    /// `subscribe` resolved but the track object never appeared.
    RemoteTrackMissing { uid: String, kind: MediaKind },

    /// Browser refused audio autoplay; call `resume_audio` from a gesture.
    AudioAutoplayBlocked { uid: String },

    // === Local Track Events ===
    /// A track drifted to muted/disabled around publish and was corrected.
    TrackCorrected { kind: MediaKind, detail: String },

    StreamingStarted,
    StreamingStopped,

    /// Capability missing; show the workaround, never fatal.
    FeatureUnsupported { feature: String, workaround: String },

    // === Device Events ===
    DevicesLoaded,
    DeviceUnavailable(String),
}
