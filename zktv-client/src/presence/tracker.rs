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

use super::schedule::HeartbeatSchedule;
use super::session_id::{regenerate_session_id, session_id_for, SessionIdStore};
use super::PresenceStore;
use crate::config::LiveConfig;
use crate::constants::PRESENCE_AUTH_ERROR_THRESHOLD;
use crate::error::{LiveError, Result};
use crate::platform::{spawn, TaskHandle};
use log::{debug, info, trace, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::{Arc, Mutex, MutexGuard};
use zktv_api_client::ApiError;
use zktv_types::ViewerSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenceOptions {
    pub schedule: HeartbeatSchedule,
    /// Consecutive auth-class failures swallowed before the session is
    /// recreated.
    pub auth_error_threshold: u32,
    /// Fixed jitter seed. `None` seeds from the OS.
    pub rng_seed: Option<u64>,
}

impl Default for PresenceOptions {
    fn default() -> Self {
        Self {
            schedule: HeartbeatSchedule::default(),
            auth_error_threshold: PRESENCE_AUTH_ERROR_THRESHOLD,
            rng_seed: None,
        }
    }
}

impl PresenceOptions {
    pub fn from_config(config: &LiveConfig) -> Self {
        Self {
            auth_error_threshold: config.presence_auth_error_threshold,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceState {
    Uninitialized,
    Tracked,
}

/// What one heartbeat did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BeatOutcome {
    /// Light path succeeded.
    Touched,
    /// The session row was (re-)created from `Uninitialized`.
    Upserted,
    /// Light path failed, heavy upsert brought the row back.
    Recovered,
    AuthErrorSwallowed { count: u32 },
    /// Auth threshold reached; a fresh session was created.
    Recreated,
    /// Nothing worked; the next beat starts from `Uninitialized`.
    Failed(String),
}

struct TrackerState {
    presence: PresenceState,
    session: ViewerSession,
    auth_errors: u32,
}

struct TrackerInner {
    store: Arc<dyn PresenceStore>,
    ids: Arc<dyn SessionIdStore>,
    channel: String,
    options: PresenceOptions,
    state: Mutex<TrackerState>,
}

/// Keeps one viewer session alive for one mounted page.
///
/// At most one heartbeat loop runs per tracker; dropping the tracker cancels
/// it.
pub struct ViewerPresenceTracker {
    inner: Arc<TrackerInner>,
    task: Mutex<Option<TaskHandle>>,
}

impl ViewerPresenceTracker {
    pub fn new(
        store: Arc<dyn PresenceStore>,
        ids: Arc<dyn SessionIdStore>,
        channel: &str,
        stream_id: &str,
        user_id: Option<String>,
        options: PresenceOptions,
    ) -> Self {
        let session_id = session_id_for(ids.as_ref(), channel);
        Self {
            inner: Arc::new(TrackerInner {
                store,
                ids,
                channel: channel.to_string(),
                options,
                state: Mutex::new(TrackerState {
                    presence: PresenceState::Uninitialized,
                    session: ViewerSession::new(session_id, stream_id.to_string(), user_id),
                    auth_errors: 0,
                }),
            }),
            task: Mutex::new(None),
        }
    }

    pub fn session_id(&self) -> String {
        self.inner.lock().session.session_id.clone()
    }

    pub fn state(&self) -> PresenceState {
        self.inner.lock().presence
    }

    pub fn auth_error_count(&self) -> u32 {
        self.inner.lock().auth_errors
    }

    /// Upsert this viewer's session row. Safe to call repeatedly.
    pub async fn track_viewer(&self) -> Result<()> {
        self.inner.upsert().await.map_err(classify)
    }

    /// Run a single heartbeat step.
    pub async fn beat(&self) -> BeatOutcome {
        self.inner.beat().await
    }

    /// Start tracking: upsert now, first heartbeat after the jittered first
    /// delay, then every jittered interval. Returns `false` when a loop is
    /// already running.
    pub fn start(&self) -> bool {
        let mut task = self.task.lock().unwrap_or_else(|p| p.into_inner());
        if task.as_ref().is_some_and(|t| !t.is_finished()) {
            debug!("heartbeat loop already running");
            return false;
        }
        let inner = self.inner.clone();
        *task = Some(spawn(async move {
            let mut rng = match inner.options.rng_seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            if let Err(e) = inner.upsert().await {
                debug!("initial viewer upsert failed: {e}");
            }
            let mut delay = inner.options.schedule.first_delay(&mut rng);
            loop {
                tokio::time::sleep(delay).await;
                let outcome = inner.beat().await;
                trace!("heartbeat: {outcome:?}");
                delay = inner.options.schedule.next_interval(&mut rng);
            }
        }));
        info!("viewer presence tracking started");
        true
    }

    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .as_ref()
            .is_some_and(|t| !t.is_finished())
    }

    /// Cancel the loop and mark the session inactive (best effort).
    pub async fn stop(&self) {
        let task = self.task.lock().unwrap_or_else(|p| p.into_inner()).take();
        drop(task);

        let (session_id, stream_id) = {
            let mut state = self.inner.lock();
            state.presence = PresenceState::Uninitialized;
            state.session.is_active = false;
            (
                state.session.session_id.clone(),
                state.session.stream_id.clone(),
            )
        };
        if let Err(e) = self
            .inner
            .store
            .deactivate_session(&session_id, &stream_id)
            .await
        {
            debug!("marking viewer session inactive failed: {e}");
        }
        info!("viewer presence tracking stopped");
    }
}

impl TrackerInner {
    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    async fn upsert(&self) -> std::result::Result<(), ApiError> {
        let session = {
            let mut state = self.lock();
            state.session.touch();
            state.session.is_active = true;
            state.session.clone()
        };
        let result = self.store.upsert_session(&session).await;
        let mut state = self.lock();
        match &result {
            Ok(()) => {
                state.presence = PresenceState::Tracked;
                state.auth_errors = 0;
            }
            Err(_) => state.presence = PresenceState::Uninitialized,
        }
        result
    }

    async fn beat(&self) -> BeatOutcome {
        let (presence, session_id, stream_id) = {
            let state = self.lock();
            (
                state.presence,
                state.session.session_id.clone(),
                state.session.stream_id.clone(),
            )
        };

        if presence == PresenceState::Uninitialized {
            return match self.upsert().await {
                Ok(()) => BeatOutcome::Upserted,
                Err(e) if e.is_auth_error() => self.swallow_auth_error(e).await,
                Err(e) => {
                    warn!("viewer upsert failed: {e}");
                    BeatOutcome::Failed(e.to_string())
                }
            };
        }

        match self.store.touch_session(&session_id, &stream_id).await {
            Ok(()) => {
                let mut state = self.lock();
                state.auth_errors = 0;
                state.session.touch();
                BeatOutcome::Touched
            }
            Err(e) if e.is_auth_error() => self.swallow_auth_error(e).await,
            Err(e) => {
                warn!("heartbeat failed ({e}), re-creating session row");
                match self.upsert().await {
                    Ok(()) => BeatOutcome::Recovered,
                    Err(e) => {
                        warn!("viewer upsert failed: {e}");
                        BeatOutcome::Failed(e.to_string())
                    }
                }
            }
        }
    }

    async fn swallow_auth_error(&self, error: ApiError) -> BeatOutcome {
        let count = {
            let mut state = self.lock();
            state.auth_errors += 1;
            state.auth_errors
        };
        if count < self.options.auth_error_threshold {
            debug!("presence auth error {count} swallowed: {error}");
            return BeatOutcome::AuthErrorSwallowed { count };
        }

        let session_id = regenerate_session_id(self.ids.as_ref(), &self.channel);
        info!("{count} presence auth errors, recreating viewer session");
        {
            let mut state = self.lock();
            let stream_id = state.session.stream_id.clone();
            let user_id = state.session.user_id.clone();
            state.session = ViewerSession::new(session_id, stream_id, user_id);
            state.presence = PresenceState::Uninitialized;
            state.auth_errors = 0;
        }
        match self.upsert().await {
            Ok(()) => BeatOutcome::Recreated,
            Err(e) => {
                debug!("recreating viewer session failed: {e}");
                BeatOutcome::Failed(e.to_string())
            }
        }
    }
}

fn classify(error: ApiError) -> LiveError {
    if error.is_auth_error() {
        LiveError::AuthTransient(error.to_string())
    } else {
        LiveError::Api(error)
    }
}
