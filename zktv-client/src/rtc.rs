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

//! Boundary to the vendor RTC signaling/media SDK.
//!
//! Everything the session needs from the SDK is expressed as a trait here so
//! the state machine can be driven by the real SDK bindings in production and
//! by in-process fakes in tests.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// SDK error codes that mean the browser refused to start audio without a
/// user gesture.
const AUTOPLAY_CODES: &[&str] = &["NotAllowedError", "AUTOPLAY_NOT_ALLOWED"];

/// An error surfaced by the RTC SDK or a media API.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct RtcError {
    pub code: String,
    pub message: String,
}

impl RtcError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn is_autoplay_blocked(&self) -> bool {
        AUTOPLAY_CODES.contains(&self.code.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientRole {
    /// May publish local tracks.
    Host,
    /// Subscribe only.
    Audience,
}

/// Audience latency level passed along with the audience role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudienceLatency {
    Low,
    UltraLow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Video,
    Audio,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Video => write!(f, "video"),
            MediaKind::Audio => write!(f, "audio"),
        }
    }
}

/// Connection states as reported by the SDK's `connection-state-change`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdkConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    Disconnecting,
    Failed,
}

/// Events emitted by the SDK client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RtcEvent {
    UserPublished { uid: String, kind: MediaKind },
    UserUnpublished { uid: String, kind: MediaKind },
    UserJoined { uid: String },
    UserLeft { uid: String },
    ConnectionStateChange {
        current: SdkConnectionState,
        previous: SdkConnectionState,
        reason: Option<String>,
    },
    Exception { code: String, message: String },
}

/// What the session needs to (re-)join a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinParams {
    pub app_id: String,
    pub channel: String,
    pub token: Option<String>,
    pub uid: Option<String>,
}

/// Camera encoder settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderConfig {
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
    pub bitrate_kbps: u32,
}

impl EncoderConfig {
    pub const HD_720P: EncoderConfig = EncoderConfig {
        width: 1280,
        height: 720,
        frame_rate: 30,
        bitrate_kbps: 2000,
    };

    pub const SD_480P: EncoderConfig = EncoderConfig {
        width: 640,
        height: 480,
        frame_rate: 30,
        bitrate_kbps: 800,
    };
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self::HD_720P
    }
}

/// A locally captured track (camera, microphone, or custom desktop audio).
#[async_trait]
pub trait LocalTrack: Send + Sync {
    fn track_id(&self) -> String;
    fn kind(&self) -> MediaKind;
    fn device_id(&self) -> Option<String>;
    fn is_enabled(&self) -> bool;
    fn is_muted(&self) -> bool;
    async fn set_enabled(&self, enabled: bool) -> Result<(), RtcError>;
    async fn set_muted(&self, muted: bool) -> Result<(), RtcError>;
    /// Hot-swap the capture device on a live track.
    async fn set_device(&self, device_id: &str) -> Result<(), RtcError>;
    /// Volume in 0..=100.
    fn set_volume(&self, volume: u8);
    /// Stop capturing. The device handle is released by `close`.
    fn stop(&self);
    fn close(&self);
}

/// A track received from a remote publisher.
#[async_trait]
pub trait RemoteTrack: Send + Sync {
    fn kind(&self) -> MediaKind;
    fn uid(&self) -> String;
    /// Start audio playback. May fail when autoplay is blocked.
    async fn play(&self) -> Result<(), RtcError>;
    fn stop(&self);
}

/// The SDK client. One instance per session.
#[async_trait]
pub trait RtcClient: Send + Sync {
    async fn set_client_role(
        &self,
        role: ClientRole,
        latency: Option<AudienceLatency>,
    ) -> Result<(), RtcError>;

    /// Join and return the uid the SDK assigned.
    async fn join(
        &self,
        app_id: &str,
        channel: &str,
        token: Option<&str>,
        uid: Option<&str>,
    ) -> Result<String, RtcError>;

    async fn leave(&self) -> Result<(), RtcError>;
    async fn publish(&self, track: Arc<dyn LocalTrack>) -> Result<(), RtcError>;
    async fn unpublish(&self, track: Arc<dyn LocalTrack>) -> Result<(), RtcError>;
    async fn subscribe(&self, uid: &str, kind: MediaKind) -> Result<(), RtcError>;

    /// The remote track object for a subscribed publication. May still be
    /// `None` right after `subscribe` resolves.
    fn remote_track(&self, uid: &str, kind: MediaKind) -> Option<Arc<dyn RemoteTrack>>;
}

/// A system/tab capture obtained from the browser's display picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayCapture {
    pub capture_id: String,
    pub audio_track_ids: Vec<String>,
    pub video_track_ids: Vec<String>,
}

/// Track factories exposed by the SDK.
#[async_trait]
pub trait MediaFactory: Send + Sync {
    async fn create_camera_track(
        &self,
        device_id: &str,
        encoder: &EncoderConfig,
    ) -> Result<Arc<dyn LocalTrack>, RtcError>;

    async fn create_microphone_track(&self, device_id: &str)
        -> Result<Arc<dyn LocalTrack>, RtcError>;

    /// Whether the SDK can wrap an arbitrary audio source as a publishable
    /// track.
    fn supports_custom_audio_track(&self) -> bool;

    async fn capture_display(&self) -> Result<DisplayCapture, RtcError>;

    async fn create_custom_audio_track(
        &self,
        capture: &DisplayCapture,
    ) -> Result<Arc<dyn LocalTrack>, RtcError>;

    /// Stop every track of a capture that is not going to be used.
    fn release_capture(&self, capture: &DisplayCapture);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn autoplay_codes_are_recognised() {
        assert!(RtcError::new("NotAllowedError", "play() failed").is_autoplay_blocked());
        assert!(!RtcError::new("NETWORK_ERROR", "x").is_autoplay_blocked());
    }

    #[test]
    fn default_encoder_is_720p() {
        assert_eq!(EncoderConfig::default(), EncoderConfig::HD_720P);
    }
}
