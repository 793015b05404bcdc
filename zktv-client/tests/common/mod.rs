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

//! In-process fakes for the SDK, the browser media APIs and the backend.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use zktv_api_client::ApiError;
use zktv_client::directory::StreamDirectory;
use zktv_client::events::ClientEvent;
use zktv_client::media_devices::{DeviceEnumerator, DeviceKind, MediaDeviceInfo};
use zktv_client::presence::PresenceStore;
use zktv_client::rtc::{
    AudienceLatency, ClientRole, DisplayCapture, EncoderConfig, LocalTrack, MediaFactory,
    MediaKind, RemoteTrack, RtcClient, RtcError,
};
use zktv_client::tracks::RenderSurface;
use zktv_types::{StreamInfo, ViewerSession};

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap()
}

/// Shared, ordered record of stop/close calls across tracks.
pub type OrderLog = Arc<Mutex<Vec<String>>>;

// === Local tracks ===

pub struct MockTrack {
    id: String,
    kind: MediaKind,
    device: Mutex<Option<String>>,
    enabled: AtomicBool,
    muted: AtomicBool,
    /// When set, `set_muted(false)` is ignored.
    stuck_muted: AtomicBool,
    volume: AtomicU8,
    stopped: AtomicBool,
    closed: AtomicBool,
    log: OrderLog,
}

impl MockTrack {
    pub fn new(id: &str, kind: MediaKind, device: Option<&str>, log: OrderLog) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            kind,
            device: Mutex::new(device.map(str::to_string)),
            enabled: AtomicBool::new(true),
            muted: AtomicBool::new(false),
            stuck_muted: AtomicBool::new(false),
            volume: AtomicU8::new(100),
            stopped: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            log,
        })
    }

    pub fn drift(&self, enabled: bool, muted: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
        self.muted.store(muted, Ordering::SeqCst);
    }

    pub fn stick_muted(&self) {
        self.stuck_muted.store(true, Ordering::SeqCst);
        self.muted.store(true, Ordering::SeqCst);
    }

    pub fn volume(&self) -> u8 {
        self.volume.load(Ordering::SeqCst)
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn current_device(&self) -> Option<String> {
        lock(&self.device).clone()
    }
}

#[async_trait]
impl LocalTrack for MockTrack {
    fn track_id(&self) -> String {
        self.id.clone()
    }

    fn kind(&self) -> MediaKind {
        self.kind
    }

    fn device_id(&self) -> Option<String> {
        self.current_device()
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn is_muted(&self) -> bool {
        self.muted.load(Ordering::SeqCst)
    }

    async fn set_enabled(&self, enabled: bool) -> Result<(), RtcError> {
        self.enabled.store(enabled, Ordering::SeqCst);
        Ok(())
    }

    async fn set_muted(&self, muted: bool) -> Result<(), RtcError> {
        if !muted && self.stuck_muted.load(Ordering::SeqCst) {
            return Ok(());
        }
        self.muted.store(muted, Ordering::SeqCst);
        Ok(())
    }

    async fn set_device(&self, device_id: &str) -> Result<(), RtcError> {
        *lock(&self.device) = Some(device_id.to_string());
        Ok(())
    }

    fn set_volume(&self, volume: u8) {
        self.volume.store(volume, Ordering::SeqCst);
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        lock(&self.log).push(format!("stop:{}", self.id));
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        lock(&self.log).push(format!("close:{}", self.id));
    }
}

// === Remote tracks ===

pub struct MockRemoteTrack {
    uid: String,
    kind: MediaKind,
    autoplay_blocked: AtomicBool,
    plays: AtomicUsize,
    stopped: AtomicBool,
}

impl MockRemoteTrack {
    pub fn new(uid: &str, kind: MediaKind) -> Arc<Self> {
        Arc::new(Self {
            uid: uid.to_string(),
            kind,
            autoplay_blocked: AtomicBool::new(false),
            plays: AtomicUsize::new(0),
            stopped: AtomicBool::new(false),
        })
    }

    pub fn block_autoplay(&self, blocked: bool) {
        self.autoplay_blocked.store(blocked, Ordering::SeqCst);
    }

    pub fn plays(&self) -> usize {
        self.plays.load(Ordering::SeqCst)
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteTrack for MockRemoteTrack {
    fn kind(&self) -> MediaKind {
        self.kind
    }

    fn uid(&self) -> String {
        self.uid.clone()
    }

    async fn play(&self) -> Result<(), RtcError> {
        if self.autoplay_blocked.load(Ordering::SeqCst) {
            return Err(RtcError::new("NotAllowedError", "play() needs a user gesture"));
        }
        self.plays.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

// === RTC client ===

struct PendingRemote {
    ready_at: Instant,
    track: Arc<MockRemoteTrack>,
}

#[derive(Default)]
struct RtcState {
    calls: Vec<String>,
    join_times: Vec<Instant>,
    join_channels: Vec<String>,
    failing_joins: u32,
    failing_publishes: u32,
    failing_unpublishes: u32,
    join_delay: Option<Duration>,
    published: Vec<String>,
    remote: HashMap<(String, MediaKind), PendingRemote>,
    roles: Vec<(ClientRole, Option<AudienceLatency>)>,
}

/// Fake SDK client. Records every call; joins can be made to fail.
#[derive(Default)]
pub struct MockRtc {
    state: Mutex<RtcState>,
    mute_on_publish: AtomicBool,
}

impl MockRtc {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// The next `n` joins fail with a network error.
    pub fn fail_next_joins(&self, n: u32) {
        lock(&self.state).failing_joins = n;
    }

    /// The next `n` publishes fail after being recorded as calls.
    pub fn fail_next_publishes(&self, n: u32) {
        lock(&self.state).failing_publishes = n;
    }

    pub fn fail_next_unpublishes(&self, n: u32) {
        lock(&self.state).failing_unpublishes = n;
    }

    pub fn set_join_delay(&self, delay: Duration) {
        lock(&self.state).join_delay = Some(delay);
    }

    /// Simulate the SDK muting a track while it is being published.
    pub fn mute_on_publish(&self, enabled: bool) {
        self.mute_on_publish.store(enabled, Ordering::SeqCst);
    }

    /// Make a remote track visible `after` the given delay.
    pub fn add_remote_track(
        &self,
        uid: &str,
        kind: MediaKind,
        after: Duration,
    ) -> Arc<MockRemoteTrack> {
        let track = MockRemoteTrack::new(uid, kind);
        lock(&self.state).remote.insert(
            (uid.to_string(), kind),
            PendingRemote {
                ready_at: Instant::now() + after,
                track: track.clone(),
            },
        );
        track
    }

    pub fn calls(&self) -> Vec<String> {
        lock(&self.state).calls.clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        lock(&self.state)
            .calls
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    pub fn join_times(&self) -> Vec<Instant> {
        lock(&self.state).join_times.clone()
    }

    pub fn join_channels(&self) -> Vec<String> {
        lock(&self.state).join_channels.clone()
    }

    pub fn published(&self) -> Vec<String> {
        lock(&self.state).published.clone()
    }

    pub fn roles(&self) -> Vec<(ClientRole, Option<AudienceLatency>)> {
        lock(&self.state).roles.clone()
    }
}

#[async_trait]
impl RtcClient for MockRtc {
    async fn set_client_role(
        &self,
        role: ClientRole,
        latency: Option<AudienceLatency>,
    ) -> Result<(), RtcError> {
        let mut state = lock(&self.state);
        state.calls.push(format!("set_role:{role:?}"));
        state.roles.push((role, latency));
        Ok(())
    }

    async fn join(
        &self,
        _app_id: &str,
        channel: &str,
        _token: Option<&str>,
        uid: Option<&str>,
    ) -> Result<String, RtcError> {
        let delay = {
            let mut state = lock(&self.state);
            state.calls.push(format!("join:{channel}"));
            state.join_times.push(Instant::now());
            state.join_channels.push(channel.to_string());
            state.join_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let mut state = lock(&self.state);
        if state.failing_joins > 0 {
            state.failing_joins -= 1;
            return Err(RtcError::new("NETWORK_ERROR", "join timed out"));
        }
        Ok(uid.unwrap_or("local-uid").to_string())
    }

    async fn leave(&self) -> Result<(), RtcError> {
        lock(&self.state).calls.push("leave".to_string());
        Ok(())
    }

    async fn publish(&self, track: Arc<dyn LocalTrack>) -> Result<(), RtcError> {
        {
            let mut state = lock(&self.state);
            state.calls.push(format!("publish:{}", track.track_id()));
            if state.failing_publishes > 0 {
                state.failing_publishes -= 1;
                return Err(RtcError::new("PUBLISH_FAILED", "peer connection closed"));
            }
            state.published.push(track.track_id());
        }
        if self.mute_on_publish.load(Ordering::SeqCst) {
            track.set_muted(true).await?;
        }
        Ok(())
    }

    async fn unpublish(&self, track: Arc<dyn LocalTrack>) -> Result<(), RtcError> {
        let mut state = lock(&self.state);
        state.calls.push(format!("unpublish:{}", track.track_id()));
        if state.failing_unpublishes > 0 {
            state.failing_unpublishes -= 1;
            return Err(RtcError::new("UNPUBLISH_FAILED", "peer connection closed"));
        }
        let id = track.track_id();
        state.published.retain(|p| p != &id);
        Ok(())
    }

    async fn subscribe(&self, uid: &str, kind: MediaKind) -> Result<(), RtcError> {
        lock(&self.state)
            .calls
            .push(format!("subscribe:{uid}:{kind}"));
        Ok(())
    }

    fn remote_track(&self, uid: &str, kind: MediaKind) -> Option<Arc<dyn RemoteTrack>> {
        let state = lock(&self.state);
        let pending = state.remote.get(&(uid.to_string(), kind))?;
        if Instant::now() < pending.ready_at {
            return None;
        }
        let track: Arc<dyn RemoteTrack> = pending.track.clone();
        Some(track)
    }
}

// === Media factory and devices ===

pub struct MockFactory {
    log: OrderLog,
    created: Mutex<Vec<Arc<MockTrack>>>,
    supports_custom_audio: AtomicBool,
    capture_has_audio: AtomicBool,
    released_captures: AtomicUsize,
    next_id: AtomicUsize,
}

impl MockFactory {
    pub fn new(log: OrderLog) -> Arc<Self> {
        Arc::new(Self {
            log,
            created: Mutex::new(Vec::new()),
            supports_custom_audio: AtomicBool::new(true),
            capture_has_audio: AtomicBool::new(true),
            released_captures: AtomicUsize::new(0),
            next_id: AtomicUsize::new(0),
        })
    }

    pub fn set_supports_custom_audio(&self, supported: bool) {
        self.supports_custom_audio.store(supported, Ordering::SeqCst);
    }

    /// Whether the user ticks "share audio" in the display picker.
    pub fn set_capture_has_audio(&self, has_audio: bool) {
        self.capture_has_audio.store(has_audio, Ordering::SeqCst);
    }

    pub fn created(&self) -> Vec<Arc<MockTrack>> {
        lock(&self.created).clone()
    }

    pub fn last_created(&self, kind: MediaKind) -> Option<Arc<MockTrack>> {
        lock(&self.created)
            .iter()
            .rev()
            .find(|t| t.kind == kind)
            .cloned()
    }

    pub fn released_captures(&self) -> usize {
        self.released_captures.load(Ordering::SeqCst)
    }

    fn make(&self, prefix: &str, kind: MediaKind, device: Option<&str>) -> Arc<dyn LocalTrack> {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let track = MockTrack::new(&format!("{prefix}-{n}"), kind, device, self.log.clone());
        lock(&self.created).push(track.clone());
        track
    }
}

#[async_trait]
impl MediaFactory for MockFactory {
    async fn create_camera_track(
        &self,
        device_id: &str,
        _encoder: &EncoderConfig,
    ) -> Result<Arc<dyn LocalTrack>, RtcError> {
        Ok(self.make("camera", MediaKind::Video, Some(device_id)))
    }

    async fn create_microphone_track(
        &self,
        device_id: &str,
    ) -> Result<Arc<dyn LocalTrack>, RtcError> {
        Ok(self.make("mic", MediaKind::Audio, Some(device_id)))
    }

    fn supports_custom_audio_track(&self) -> bool {
        self.supports_custom_audio.load(Ordering::SeqCst)
    }

    async fn capture_display(&self) -> Result<DisplayCapture, RtcError> {
        let audio = if self.capture_has_audio.load(Ordering::SeqCst) {
            vec!["display-audio".to_string()]
        } else {
            Vec::new()
        };
        Ok(DisplayCapture {
            capture_id: "display".to_string(),
            audio_track_ids: audio,
            video_track_ids: vec!["display-video".to_string()],
        })
    }

    async fn create_custom_audio_track(
        &self,
        _capture: &DisplayCapture,
    ) -> Result<Arc<dyn LocalTrack>, RtcError> {
        Ok(self.make("desktop", MediaKind::Audio, None))
    }

    fn release_capture(&self, _capture: &DisplayCapture) {
        self.released_captures.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct MockDevices {
    devices: Mutex<Vec<MediaDeviceInfo>>,
    enumerations: AtomicUsize,
}

impl MockDevices {
    pub fn with_defaults() -> Arc<Self> {
        let devices = Self::default();
        *lock(&devices.devices) = vec![
            MediaDeviceInfo::new("cam-1", "FaceTime HD Camera", DeviceKind::Camera),
            MediaDeviceInfo::new("cam-2", "OBS Virtual Camera", DeviceKind::Camera),
            MediaDeviceInfo::new("mic-1", "Built-in Microphone", DeviceKind::Microphone),
            MediaDeviceInfo::new("mic-2", "USB Microphone", DeviceKind::Microphone),
        ];
        Arc::new(devices)
    }

    pub fn unplug(&self, device_id: &str) {
        lock(&self.devices).retain(|d| d.device_id != device_id);
    }

    pub fn enumerations(&self) -> usize {
        self.enumerations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeviceEnumerator for MockDevices {
    async fn enumerate_devices(&self) -> Result<Vec<MediaDeviceInfo>, RtcError> {
        self.enumerations.fetch_add(1, Ordering::SeqCst);
        Ok(lock(&self.devices).clone())
    }
}

// === Render surface ===

#[derive(Default)]
pub struct MockSurface {
    attached: Mutex<Vec<String>>,
    previews: Mutex<Vec<String>>,
    detached: Mutex<Vec<String>>,
    pip: AtomicBool,
}

impl MockSurface {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_picture_in_picture() -> Arc<Self> {
        let surface = Self::default();
        surface.pip.store(true, Ordering::SeqCst);
        Arc::new(surface)
    }

    pub fn attached(&self) -> Vec<String> {
        lock(&self.attached).clone()
    }

    pub fn previews(&self) -> Vec<String> {
        lock(&self.previews).clone()
    }

    pub fn detached(&self) -> Vec<String> {
        lock(&self.detached).clone()
    }
}

#[async_trait]
impl RenderSurface for MockSurface {
    fn attach_video(&self, track: Arc<dyn RemoteTrack>) -> Result<(), RtcError> {
        lock(&self.attached).push(track.uid());
        Ok(())
    }

    fn attach_local_preview(&self, track: Arc<dyn LocalTrack>) -> Result<(), RtcError> {
        lock(&self.previews).push(track.track_id());
        Ok(())
    }

    fn detach(&self, uid: &str) {
        lock(&self.detached).push(uid.to_string());
    }

    fn supports_picture_in_picture(&self) -> bool {
        self.pip.load(Ordering::SeqCst)
    }

    async fn enter_picture_in_picture(&self) -> Result<(), RtcError> {
        Ok(())
    }
}

// === Backend ===

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Ok,
    Auth,
    Server,
}

impl Reply {
    fn into_result(self) -> Result<(), ApiError> {
        match self {
            Reply::Ok => Ok(()),
            Reply::Auth => Err(ApiError::NotAuthenticated),
            Reply::Server => Err(ApiError::ServerError {
                status: 503,
                body: "upstream unavailable".to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenceCall {
    Upsert(String),
    Touch(String),
    Deactivate(String),
}

struct PresenceScript {
    upsert: VecDeque<Reply>,
    touch: VecDeque<Reply>,
    default_upsert: Reply,
    default_touch: Reply,
    calls: Vec<(PresenceCall, Instant)>,
}

pub struct MockPresenceStore {
    script: Mutex<PresenceScript>,
}

impl MockPresenceStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(PresenceScript {
                upsert: VecDeque::new(),
                touch: VecDeque::new(),
                default_upsert: Reply::Ok,
                default_touch: Reply::Ok,
                calls: Vec::new(),
            }),
        })
    }

    pub fn queue_upsert(&self, replies: &[Reply]) {
        lock(&self.script).upsert.extend(replies.iter().copied());
    }

    pub fn queue_touch(&self, replies: &[Reply]) {
        lock(&self.script).touch.extend(replies.iter().copied());
    }

    pub fn set_default_touch(&self, reply: Reply) {
        lock(&self.script).default_touch = reply;
    }

    pub fn calls(&self) -> Vec<PresenceCall> {
        lock(&self.script)
            .calls
            .iter()
            .map(|(c, _)| c.clone())
            .collect()
    }

    pub fn timed_calls(&self) -> Vec<(PresenceCall, Instant)> {
        lock(&self.script).calls.clone()
    }

    pub fn touch_times(&self) -> Vec<Instant> {
        lock(&self.script)
            .calls
            .iter()
            .filter(|(c, _)| matches!(c, PresenceCall::Touch(_)))
            .map(|(_, t)| *t)
            .collect()
    }
}

#[async_trait]
impl PresenceStore for MockPresenceStore {
    async fn upsert_session(&self, session: &ViewerSession) -> Result<(), ApiError> {
        let mut script = lock(&self.script);
        script
            .calls
            .push((PresenceCall::Upsert(session.session_id.clone()), Instant::now()));
        let reply = script.upsert.pop_front().unwrap_or(script.default_upsert);
        reply.into_result()
    }

    async fn touch_session(&self, session_id: &str, _stream_id: &str) -> Result<(), ApiError> {
        let mut script = lock(&self.script);
        script
            .calls
            .push((PresenceCall::Touch(session_id.to_string()), Instant::now()));
        let reply = script.touch.pop_front().unwrap_or(script.default_touch);
        reply.into_result()
    }

    async fn deactivate_session(&self, session_id: &str, _stream_id: &str) -> Result<(), ApiError> {
        lock(&self.script).calls.push((
            PresenceCall::Deactivate(session_id.to_string()),
            Instant::now(),
        ));
        Ok(())
    }
}

#[derive(Default)]
pub struct MockDirectory {
    streams: Mutex<Vec<StreamInfo>>,
    lookups: AtomicUsize,
}

impl MockDirectory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_streams(&self, streams: Vec<StreamInfo>) {
        *lock(&self.streams) = streams;
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StreamDirectory for MockDirectory {
    async fn active_stream(&self, channel: &str) -> Result<Option<StreamInfo>, ApiError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(lock(&self.streams)
            .iter()
            .find(|s| s.channel_name == channel && s.is_active)
            .cloned())
    }

    async fn stream_by_id(&self, stream_id: &str) -> Result<Option<StreamInfo>, ApiError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(lock(&self.streams)
            .iter()
            .find(|s| s.id == stream_id)
            .cloned())
    }
}

pub fn stream(id: &str, channel: &str, active: bool, viewers: u64) -> StreamInfo {
    StreamInfo {
        id: id.to_string(),
        title: format!("stream {id}"),
        channel_name: channel.to_string(),
        is_active: active,
        viewer_count: viewers,
        hls_url: None,
    }
}

/// Drain every event currently queued on a receiver.
pub fn drain(rx: &mut async_broadcast::Receiver<ClientEvent>) -> Vec<ClientEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
