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

//! The live session: one RTC client, its join/leave lifecycle, bounded
//! reconnection, host publishing and audience subscription.
//!
//! Small mutable state lives behind a `std::sync::Mutex` that is never held
//! across an `.await`. State transitions queue their notifications and the
//! queue is flushed after the lock is released, so callbacks may call back
//! into the session.

use super::backoff::{ReconnectCounter, ReconnectPolicy};
use super::state::{is_unexpected_drop, ConnectionState};
use crate::config::LiveConfig;
use crate::constants::{DEFAULT_CHANNEL, PUBLISH_RECHECK_DELAY_MS};
use crate::error::{LiveError, Result};
use crate::event_bus::EventBus;
use crate::events::ClientEvent;
use crate::media_devices::{DeviceKind, MediaDeviceInfo};
use crate::platform::{spawn, spawn_detached, TaskHandle};
use crate::rtc::{
    AudienceLatency, ClientRole, EncoderConfig, JoinParams, MediaKind, RemoteTrack, RtcClient,
    RtcError, RtcEvent, SdkConnectionState,
};
use crate::tracks::{
    publish_checked, request_picture_in_picture, LocalTrackManager, RemoteTracks, RenderSurface,
};
use crate::utils::{await_condition, PollPolicy};
use log::{debug, error, info, warn};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc;
use zktv_types::Callback;

/// Options for [`LiveSession`].
#[derive(Debug, Clone)]
pub struct LiveSessionOptions {
    pub app_id: String,

    /// The physical channel every join goes to, whatever the caller asks for.
    pub channel: String,

    pub role: ClientRole,

    pub audience_latency: AudienceLatency,

    pub reconnect: ReconnectPolicy,

    /// Delay of the second invariant check after `publish` resolves.
    pub publish_recheck_delay: Duration,

    /// Polling of remote track objects after `subscribe` resolves.
    pub remote_track_poll: PollPolicy,

    pub encoder: EncoderConfig,

    /// Called on every connection state transition.
    pub on_state_changed: Callback<ConnectionState>,

    /// Called once when reconnection gives up and only a reload helps.
    pub on_reload_required: Callback<String>,
}

impl LiveSessionOptions {
    pub fn new(app_id: &str, role: ClientRole) -> Self {
        Self {
            app_id: app_id.to_string(),
            channel: DEFAULT_CHANNEL.to_string(),
            role,
            audience_latency: AudienceLatency::Low,
            reconnect: ReconnectPolicy::default(),
            publish_recheck_delay: Duration::from_millis(PUBLISH_RECHECK_DELAY_MS),
            remote_track_poll: PollPolicy::default(),
            encoder: EncoderConfig::default(),
            on_state_changed: Callback::noop(),
            on_reload_required: Callback::noop(),
        }
    }

    pub fn from_config(config: &LiveConfig, role: ClientRole) -> Self {
        let mut options = Self::new(&config.rtc_app_id, role);
        options.channel = config.rtc_channel.clone();
        options.reconnect.max_attempts = config.reconnect_max_attempts;
        options
    }
}

enum Notice {
    State(ConnectionState),
    Event(ClientEvent),
    ReloadRequired(String),
}

struct SessionState {
    connection: ConnectionState,
    joining: bool,
    last_join: Option<JoinParams>,
    local_uid: Option<String>,
    streaming: bool,
    intentional_leave: bool,
    disposed: bool,
    // Bumped by leave/dispose; continuations holding an older value are stale.
    epoch: u64,
    counter: ReconnectCounter,
    reconnect_task: Option<TaskHandle>,
    reload_notified: bool,
    remote: RemoteTracks,
    notices: Vec<Notice>,
}

impl SessionState {
    fn set_connection(&mut self, next: ConnectionState) {
        if self.connection == next {
            return;
        }
        debug!("connection {} -> {}", self.connection, next);
        self.connection = next.clone();
        self.notices.push(Notice::State(next));
    }

    fn emit(&mut self, event: ClientEvent) {
        self.notices.push(Notice::Event(event));
    }

    fn is_stale(&self, epoch: u64) -> bool {
        self.epoch != epoch || self.disposed || self.intentional_leave
    }
}

struct Inner {
    options: LiveSessionOptions,
    rtc: Arc<dyn RtcClient>,
    surface: Arc<dyn RenderSurface>,
    tracks: tokio::sync::Mutex<LocalTrackManager>,
    state: Mutex<SessionState>,
    events: EventBus,
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Mutate the state, then deliver whatever it queued with the lock
    /// released.
    fn update<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        let (result, notices) = {
            let mut state = self.lock_state();
            let result = f(&mut state);
            (result, std::mem::take(&mut state.notices))
        };
        for notice in notices {
            match notice {
                Notice::State(state) => {
                    self.options.on_state_changed.emit(state.clone());
                    self.events.emit(ClientEvent::StateChanged(state));
                }
                Notice::Event(event) => self.events.emit(event),
                Notice::ReloadRequired(message) => {
                    self.options.on_reload_required.emit(message.clone());
                    self.events.emit(ClientEvent::ReloadRequired(message));
                }
            }
        }
        result
    }
}

/// Clears the in-flight join flag on every exit path, cancellation included.
struct JoiningFlag<'a>(&'a Inner);

impl Drop for JoiningFlag<'_> {
    fn drop(&mut self) {
        self.0.lock_state().joining = false;
    }
}

/// Releases the in-flight claim of a remote subscribe on every exit path.
struct SubscribeClaim<'a> {
    inner: &'a Inner,
    uid: String,
    kind: MediaKind,
}

impl Drop for SubscribeClaim<'_> {
    fn drop(&mut self) {
        self.inner
            .lock_state()
            .remote
            .finish_subscribe(&self.uid, self.kind);
    }
}

/// A live-video session. Cheap to clone; all clones drive the same session.
///
/// ```ignore
/// let session = LiveSession::new(options, rtc, surface, tracks);
/// let _events = session.spawn_event_loop(rtc_events);
/// session.join(session.join_params(None, None)).await?;
/// session.start_stream(&camera_id, Some(&mic_id)).await?;
/// ...
/// session.dispose().await;
/// ```
#[derive(Clone)]
pub struct LiveSession {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for LiveSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveSession")
            .field("role", &self.inner.options.role)
            .field("state", &self.state())
            .finish()
    }
}

impl LiveSession {
    pub fn new(
        options: LiveSessionOptions,
        rtc: Arc<dyn RtcClient>,
        surface: Arc<dyn RenderSurface>,
        tracks: LocalTrackManager,
    ) -> Self {
        let counter = ReconnectCounter::new(options.reconnect);
        Self {
            inner: Arc::new(Inner {
                options,
                rtc,
                surface,
                tracks: tokio::sync::Mutex::new(tracks),
                state: Mutex::new(SessionState {
                    connection: ConnectionState::Idle,
                    joining: false,
                    last_join: None,
                    local_uid: None,
                    streaming: false,
                    intentional_leave: false,
                    disposed: false,
                    epoch: 0,
                    counter,
                    reconnect_task: None,
                    reload_notified: false,
                    remote: RemoteTracks::default(),
                    notices: Vec::new(),
                }),
                events: EventBus::new(),
            }),
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    pub fn role(&self) -> ClientRole {
        self.inner.options.role
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.lock_state().connection.clone()
    }

    pub fn is_streaming(&self) -> bool {
        self.inner.lock_state().streaming
    }

    pub fn local_uid(&self) -> Option<String> {
        self.inner.lock_state().local_uid.clone()
    }

    pub fn reconnect_attempts(&self) -> u32 {
        self.inner.lock_state().counter.attempts()
    }

    pub fn remote_track_count(&self) -> usize {
        self.inner.lock_state().remote.track_count()
    }

    pub fn remote_users(&self) -> Vec<String> {
        self.inner.lock_state().remote.users()
    }

    /// Join parameters for the configured app and channel.
    pub fn join_params(&self, token: Option<String>, uid: Option<String>) -> JoinParams {
        JoinParams {
            app_id: self.inner.options.app_id.clone(),
            channel: self.inner.options.channel.clone(),
            token,
            uid,
        }
    }

    // === Lifecycle ===

    /// Set the role, then join the fixed channel. Returns the SDK uid.
    pub async fn join(&self, params: JoinParams) -> Result<String> {
        let epoch = self.inner.update(|s| {
            if s.disposed {
                return Err(LiveError::InvalidState("disposed".to_string()));
            }
            if s.joining {
                return Err(LiveError::JoinInProgress);
            }
            if !s.connection.can_join() {
                return Err(LiveError::InvalidState(s.connection.to_string()));
            }
            s.joining = true;
            s.intentional_leave = false;
            if s.connection.is_failed() {
                s.counter.reset();
                s.reload_notified = false;
            }
            s.set_connection(ConnectionState::Connecting);
            Ok(s.epoch)
        })?;
        let _joining = JoiningFlag(&self.inner);

        let params = self.pin_channel(params);
        info!(
            "joining channel {} as {:?}",
            params.channel, self.inner.options.role
        );
        let result = self.connect_rtc(&params).await;

        if self.inner.lock_state().is_stale(epoch) {
            if result.is_ok() {
                if let Err(e) = self.inner.rtc.leave().await {
                    debug!("leave after stale join failed: {e}");
                }
            }
            return Err(LiveError::InvalidState(
                "session was left while joining".to_string(),
            ));
        }

        match result {
            Ok(uid) => {
                info!("joined {} as uid {uid}", params.channel);
                self.inner.update(|s| {
                    s.last_join = Some(params);
                    s.local_uid = Some(uid.clone());
                    s.counter.reset();
                    s.set_connection(ConnectionState::Connected);
                });
                Ok(uid)
            }
            Err(e) => {
                error!("join failed: {e}");
                self.inner
                    .update(|s| s.set_connection(ConnectionState::Disconnected));
                Err(e.into())
            }
        }
    }

    /// Intentional leave: cancel reconnection, release every track, then
    /// leave the RTC channel.
    pub async fn leave(&self) -> Result<()> {
        let (previous, was_streaming, remote, reconnect_task) = self.inner.update(|s| {
            s.epoch += 1;
            s.intentional_leave = true;
            let previous = s.connection.clone();
            if !matches!(
                previous,
                ConnectionState::Idle | ConnectionState::Disconnected
            ) {
                s.set_connection(ConnectionState::Disconnecting);
            }
            (
                previous,
                std::mem::replace(&mut s.streaming, false),
                s.remote.clear(),
                s.reconnect_task.take(),
            )
        });
        drop(reconnect_task);

        self.release_remote(remote);
        self.inner.tracks.lock().await.teardown();

        if matches!(
            previous,
            ConnectionState::Idle | ConnectionState::Disconnected
        ) {
            return Ok(());
        }

        let result = self.inner.rtc.leave().await;
        if let Err(e) = &result {
            warn!("rtc leave failed: {e}");
        }
        self.inner.update(|s| {
            s.local_uid = None;
            s.set_connection(ConnectionState::Disconnected);
            if was_streaming {
                s.emit(ClientEvent::StreamingStopped);
            }
        });
        info!("left channel");
        result.map_err(Into::into)
    }

    /// Leave and mark the session unmounted. Pending continuations become
    /// no-ops.
    pub async fn dispose(&self) {
        self.inner.update(|s| s.disposed = true);
        if let Err(e) = self.leave().await {
            debug!("leave during dispose failed: {e}");
        }
    }

    // === Host ===

    /// Create the camera (and optionally microphone) track and publish them.
    pub async fn start_stream(&self, camera_id: &str, microphone_id: Option<&str>) -> Result<()> {
        if self.inner.options.role != ClientRole::Host {
            return Err(LiveError::InvalidState(
                "audience sessions cannot publish".to_string(),
            ));
        }
        let epoch = {
            let s = self.inner.lock_state();
            if !s.connection.is_connected() {
                return Err(LiveError::InvalidState(s.connection.to_string()));
            }
            if s.streaming {
                return Err(LiveError::InvalidState("already streaming".to_string()));
            }
            s.epoch
        };

        let mut manager = self.inner.tracks.lock().await;
        let video = self
            .report(
                manager
                    .create_video_track(camera_id, self.inner.options.encoder)
                    .await,
            )?;
        if let Err(e) = self.inner.surface.attach_local_preview(video) {
            warn!("local preview unavailable: {e}");
        }
        if let Some(microphone_id) = microphone_id {
            self.report(manager.create_audio_track(microphone_id).await)?;
        }
        for track in manager.held_tracks() {
            publish_checked(
                self.inner.rtc.as_ref(),
                track,
                self.inner.options.publish_recheck_delay,
                &self.inner.events,
            )
            .await?;
        }
        drop(manager);

        self.inner.update(|s| {
            if s.is_stale(epoch) {
                return Err(LiveError::InvalidState(
                    "session was left while publishing".to_string(),
                ));
            }
            s.streaming = true;
            s.emit(ClientEvent::StreamingStarted);
            Ok(())
        })?;
        info!("streaming started");
        Ok(())
    }

    /// Unpublish and release every local track. The session stays joined.
    pub async fn stop_stream(&self) -> Result<()> {
        let mut manager = self.inner.tracks.lock().await;
        for track in manager.held_tracks() {
            if let Err(e) = self.inner.rtc.unpublish(track).await {
                warn!("unpublish failed: {e}");
            }
        }
        manager.teardown();
        drop(manager);

        self.inner.update(|s| {
            if std::mem::replace(&mut s.streaming, false) {
                s.emit(ClientEvent::StreamingStopped);
            }
        });
        Ok(())
    }

    /// Capture desktop audio and, when streaming, publish it.
    pub async fn start_desktop_audio(&self) -> Result<()> {
        let streaming = self.is_streaming();
        let mut manager = self.inner.tracks.lock().await;
        let track = self.report(manager.start_desktop_audio().await)?;
        if streaming {
            publish_checked(
                self.inner.rtc.as_ref(),
                track,
                self.inner.options.publish_recheck_delay,
                &self.inner.events,
            )
            .await?;
        }
        Ok(())
    }

    pub async fn stop_desktop_audio(&self) -> Result<()> {
        let streaming = self.is_streaming();
        let mut manager = self.inner.tracks.lock().await;
        if let (true, Some(track)) = (streaming, manager.desktop_audio()) {
            if let Err(e) = self.inner.rtc.unpublish(track).await {
                warn!("unpublish of desktop audio failed: {e}");
            }
        }
        manager.stop_desktop_audio();
        Ok(())
    }

    /// Switch camera or microphone. Hot-swaps while streaming.
    pub async fn switch_device(&self, kind: DeviceKind, device_id: &str) -> Result<()> {
        let streaming = self.is_streaming();
        let mut manager = self.inner.tracks.lock().await;
        let track = self.report(manager.switch_device(kind, device_id, streaming).await)?;
        if !streaming && kind == DeviceKind::Camera {
            if let Err(e) = self.inner.surface.attach_local_preview(track) {
                warn!("local preview unavailable: {e}");
            }
        }
        Ok(())
    }

    pub async fn set_microphone_volume(&self, volume: u32) -> u8 {
        self.inner.tracks.lock().await.set_microphone_volume(volume)
    }

    /// Enumerate devices. Returns `(cameras, microphones)`.
    pub async fn load_devices(&self) -> Result<(Vec<MediaDeviceInfo>, Vec<MediaDeviceInfo>)> {
        let mut manager = self.inner.tracks.lock().await;
        manager.devices_mut().load().await?;
        let devices = manager.devices();
        let lists = (
            devices.video_inputs.devices().to_vec(),
            devices.audio_inputs.devices().to_vec(),
        );
        self.inner.events.emit(ClientEvent::DevicesLoaded);
        Ok(lists)
    }

    // === Audience ===

    /// Retry audio playback that the browser blocked. Call from a user
    /// gesture. Returns how many tracks started playing.
    pub async fn resume_audio(&self) -> usize {
        let pending: Vec<(String, Arc<dyn RemoteTrack>)> = self.inner.update(|s| {
            s.remote
                .take_autoplay_blocked()
                .into_iter()
                .filter_map(|uid| {
                    let track = s.remote.get(&uid, MediaKind::Audio)?;
                    Some((uid, track))
                })
                .collect()
        });

        let mut resumed = 0;
        for (uid, track) in pending {
            match track.play().await {
                Ok(()) => {
                    resumed += 1;
                    self.inner.events.emit(ClientEvent::RemoteTrackReady {
                        uid,
                        kind: MediaKind::Audio,
                    });
                }
                Err(e) => {
                    warn!("audio for {uid} still blocked: {e}");
                    if e.is_autoplay_blocked() {
                        self.inner.update(|s| s.remote.mark_autoplay_blocked(&uid));
                    }
                }
            }
        }
        resumed
    }

    pub async fn request_picture_in_picture(&self) -> Result<()> {
        self.report(request_picture_in_picture(self.inner.surface.as_ref()).await)
    }

    // === SDK events ===

    /// Feed SDK events to the session. `UserPublished` handling runs on its
    /// own task so a slow subscribe never delays a state change.
    pub fn spawn_event_loop(&self, mut events: mpsc::UnboundedReceiver<RtcEvent>) -> TaskHandle {
        let session = self.clone();
        spawn(async move {
            while let Some(event) = events.recv().await {
                if matches!(event, RtcEvent::UserPublished { .. }) {
                    let session = session.clone();
                    spawn_detached(async move { session.handle_event(event).await });
                } else {
                    session.handle_event(event).await;
                }
            }
            debug!("rtc event stream closed");
        })
    }

    pub async fn handle_event(&self, event: RtcEvent) {
        if self.inner.lock_state().disposed {
            return;
        }
        match event {
            RtcEvent::UserPublished { uid, kind } => {
                let epoch = self.inner.update(|s| {
                    s.remote.note_published(&uid, kind);
                    s.epoch
                });
                self.subscribe_remote(uid, kind, epoch).await;
            }
            RtcEvent::UserUnpublished { uid, kind } => {
                let track = self.inner.update(|s| s.remote.remove(&uid, kind));
                if let Some(track) = track {
                    track.stop();
                }
                if kind == MediaKind::Video {
                    self.inner.surface.detach(&uid);
                }
                debug!("{uid} unpublished {kind}");
                self.inner
                    .events
                    .emit(ClientEvent::RemoteTrackRemoved { uid, kind });
            }
            RtcEvent::UserJoined { uid } => {
                info!("remote user {uid} joined");
                self.inner.events.emit(ClientEvent::RemoteUserJoined(uid));
            }
            RtcEvent::UserLeft { uid } => {
                let tracks = self.inner.update(|s| s.remote.remove_user(&uid));
                for track in tracks {
                    track.stop();
                }
                self.inner.surface.detach(&uid);
                info!("remote user {uid} left");
                self.inner.events.emit(ClientEvent::RemoteUserLeft(uid));
            }
            RtcEvent::ConnectionStateChange {
                current,
                previous,
                reason,
            } => self.on_sdk_state_change(current, previous, reason),
            RtcEvent::Exception { code, message } => {
                warn!("rtc exception {code}: {message}");
                self.inner
                    .events
                    .emit(ClientEvent::Exception { code, message });
            }
        }
    }

    fn on_sdk_state_change(
        &self,
        current: SdkConnectionState,
        previous: SdkConnectionState,
        reason: Option<String>,
    ) {
        if !is_unexpected_drop(current, previous) {
            debug!("sdk connection {previous:?} -> {current:?}");
            return;
        }
        let reason = reason.unwrap_or_else(|| format!("{previous:?} -> {current:?}"));
        self.inner.update(|s| {
            if s.disposed || s.intentional_leave || !s.connection.is_connected() {
                debug!("ignoring drop ({reason}) while {}", s.connection);
                return;
            }
            warn!("connection dropped: {reason}");
            let epoch = s.epoch;
            match self.claim_attempt(s, &reason) {
                Some(delay) => {
                    let task = spawn(self.clone().reconnect_loop(epoch, delay));
                    s.reconnect_task = Some(task);
                }
                None => spawn_detached(self.clone().enter_safe_state()),
            }
        });
    }

    // === Internals ===

    fn pin_channel(&self, mut params: JoinParams) -> JoinParams {
        let fixed = &self.inner.options.channel;
        if &params.channel != fixed {
            warn!(
                "requested channel {} ignored, every stream is broadcast on {fixed}",
                params.channel
            );
            params.channel = fixed.clone();
        }
        if params.app_id.is_empty() {
            params.app_id = self.inner.options.app_id.clone();
        }
        params
    }

    async fn connect_rtc(&self, params: &JoinParams) -> std::result::Result<String, RtcError> {
        let rtc = &self.inner.rtc;
        match self.inner.options.role {
            ClientRole::Host => rtc.set_client_role(ClientRole::Host, None).await?,
            ClientRole::Audience => {
                rtc.set_client_role(
                    ClientRole::Audience,
                    Some(self.inner.options.audience_latency),
                )
                .await?
            }
        }
        rtc.join(
            &params.app_id,
            &params.channel,
            params.token.as_deref(),
            params.uid.as_deref(),
        )
        .await
    }

    /// Claim the next reconnect attempt, or fail terminally when the budget
    /// is spent. Returns the delay before the claimed attempt.
    fn claim_attempt(&self, s: &mut SessionState, reason: &str) -> Option<Duration> {
        let max_attempts = s.counter.max_attempts();
        match s.counter.next_attempt() {
            Some((attempt, delay)) => {
                let delay_ms = delay.as_millis() as u64;
                info!("reconnect attempt {attempt}/{max_attempts} in {delay_ms} ms");
                s.set_connection(ConnectionState::Reconnecting {
                    attempt,
                    max_attempts,
                    delay_ms,
                });
                s.emit(ClientEvent::Reconnecting { attempt, delay_ms });
                Some(delay)
            }
            None => {
                error!("giving up after {max_attempts} reconnect attempts: {reason}");
                s.set_connection(ConnectionState::Failed {
                    reason: reason.to_string(),
                });
                s.streaming = false;
                if !s.reload_notified {
                    s.reload_notified = true;
                    s.notices.push(Notice::ReloadRequired(
                        LiveError::ConnectionLost {
                            reason: reason.to_string(),
                            terminal: true,
                        }
                        .to_string()
                            + ", please reload the page",
                    ));
                }
                None
            }
        }
    }

    async fn reconnect_loop(self, epoch: u64, first_delay: Duration) {
        let mut delay = first_delay;
        loop {
            tokio::time::sleep(delay).await;
            let params = {
                let s = self.inner.lock_state();
                if s.is_stale(epoch) {
                    return;
                }
                s.last_join.clone()
            };
            let Some(params) = params else {
                warn!("nothing to reconnect to");
                return;
            };

            if let Err(e) = self.inner.rtc.leave().await {
                debug!("leave before rejoin failed: {e}");
            }
            let reason = match self.connect_rtc(&params).await {
                Ok(uid) => {
                    if self.inner.lock_state().is_stale(epoch) {
                        if let Err(e) = self.inner.rtc.leave().await {
                            debug!("leave after stale rejoin failed: {e}");
                        }
                        return;
                    }
                    match self.on_reconnected(uid, epoch).await {
                        Ok(()) => return,
                        Err(reason) => reason,
                    }
                }
                Err(e) => e.to_string(),
            };

            warn!("reconnect failed: {reason}");
            let next = self.inner.update(|s| {
                if s.is_stale(epoch) {
                    return None;
                }
                Some(self.claim_attempt(s, &reason))
            });
            match next {
                Some(Some(next_delay)) => delay = next_delay,
                Some(None) => {
                    self.enter_safe_state().await;
                    return;
                }
                None => return,
            }
        }
    }

    /// Restore what the dropped connection carried. A failed republish
    /// fails the attempt, so the caller counts it and retries.
    async fn on_reconnected(&self, uid: String, epoch: u64) -> std::result::Result<(), String> {
        let streaming = self.inner.update(|s| {
            s.local_uid = Some(uid.clone());
            s.streaming
        });

        if self.inner.options.role == ClientRole::Host && streaming {
            let manager = self.inner.tracks.lock().await;
            for track in manager.held_tracks() {
                publish_checked(
                    self.inner.rtc.as_ref(),
                    track,
                    self.inner.options.publish_recheck_delay,
                    &self.inner.events,
                )
                .await
                .map_err(|e| format!("republish after reconnect failed: {e}"))?;
            }
        }

        let restored = self.inner.update(|s| {
            if s.is_stale(epoch) {
                return None;
            }
            s.counter.reset();
            s.set_connection(ConnectionState::Connected);
            s.emit(ClientEvent::Reconnected);
            Some((s.remote.take_tracks(), s.remote.publications()))
        });
        let Some((stale_tracks, publications)) = restored else {
            return Ok(());
        };
        info!("reconnected as uid {uid}");

        // Track objects of the dropped connection are dead; subscribe afresh.
        self.release_remote(stale_tracks);
        if self.inner.options.role == ClientRole::Audience {
            for (uid, kind) in publications {
                let session = self.clone();
                spawn_detached(async move { session.subscribe_remote(uid, kind, epoch).await });
            }
        }
        Ok(())
    }

    /// Stop everything after terminal failure. The state stays `Failed`.
    async fn enter_safe_state(self) {
        let remote = self.inner.update(|s| s.remote.clear());
        self.release_remote(remote);
        self.inner.tracks.lock().await.teardown();
        if let Err(e) = self.inner.rtc.leave().await {
            debug!("leave after terminal failure failed: {e}");
        }
    }

    async fn subscribe_remote(&self, uid: String, kind: MediaKind, epoch: u64) {
        if self.inner.options.role == ClientRole::Host {
            debug!("host ignores {kind} published by {uid}");
            return;
        }
        if !self
            .inner
            .update(|s| s.remote.begin_subscribe(&uid, kind))
        {
            debug!("{uid} {kind} already subscribed");
            return;
        }
        let _claim = SubscribeClaim {
            inner: &self.inner,
            uid: uid.clone(),
            kind,
        };

        let rtc = self.inner.rtc.clone();
        if let Err(e) = rtc.subscribe(&uid, kind).await {
            warn!("subscribe to {uid} {kind} failed: {e}");
            self.inner.events.emit(ClientEvent::Exception {
                code: e.code,
                message: e.message,
            });
            return;
        }

        let outcome = await_condition(
            || rtc.remote_track(&uid, kind),
            self.inner.options.remote_track_poll,
        )
        .await;
        if self.inner.lock_state().is_stale(epoch) {
            return;
        }
        let Some(track) = outcome.found() else {
            warn!("{kind} track of {uid} never appeared after subscribe");
            self.inner
                .events
                .emit(ClientEvent::RemoteTrackMissing { uid, kind });
            return;
        };
        let replaced = self
            .inner
            .update(|s| s.remote.insert(&uid, kind, track.clone()));
        if let Some(previous) = replaced {
            if !std::ptr::addr_eq(Arc::as_ptr(&previous), Arc::as_ptr(&track)) {
                previous.stop();
            }
        }

        match kind {
            MediaKind::Video => match self.inner.surface.attach_video(track) {
                Ok(()) => self
                    .inner
                    .events
                    .emit(ClientEvent::RemoteTrackReady { uid, kind }),
                Err(e) => warn!("rendering video of {uid} failed: {e}"),
            },
            MediaKind::Audio => match track.play().await {
                Ok(()) => self
                    .inner
                    .events
                    .emit(ClientEvent::RemoteTrackReady { uid, kind }),
                Err(e) if e.is_autoplay_blocked() => {
                    warn!("audio autoplay blocked for {uid}");
                    self.inner.update(|s| {
                        s.remote.mark_autoplay_blocked(&uid);
                        s.emit(ClientEvent::AudioAutoplayBlocked { uid: uid.clone() });
                    });
                }
                Err(e) => warn!("audio playback of {uid} failed: {e}"),
            },
        }
    }

    fn release_remote(&self, tracks: Vec<Arc<dyn RemoteTrack>>) {
        for track in tracks {
            track.stop();
            self.inner.surface.detach(&track.uid());
        }
    }

    /// Turn user-facing errors into events on their way out.
    fn report<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            match e {
                LiveError::DeviceUnavailable { .. } => self
                    .inner
                    .events
                    .emit(ClientEvent::DeviceUnavailable(e.to_string())),
                LiveError::FeatureUnsupported {
                    feature,
                    workaround,
                } => self.inner.events.emit(ClientEvent::FeatureUnsupported {
                    feature: feature.clone(),
                    workaround: workaround.clone(),
                }),
                _ => {}
            }
        }
        result
    }
}
