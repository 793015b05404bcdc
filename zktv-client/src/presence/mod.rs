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

//! Viewer presence: a per-page session row kept alive by jittered heartbeats.

mod schedule;
mod session_id;
mod tracker;

pub use schedule::HeartbeatSchedule;
pub use session_id::{
    regenerate_session_id, session_id_for, session_key, FileSessionStore, MemorySessionStore,
    SessionIdStore,
};
pub use tracker::{BeatOutcome, PresenceOptions, PresenceState, ViewerPresenceTracker};

use async_trait::async_trait;
use zktv_api_client::ApiError;
use zktv_types::ViewerSession;

/// The backend's viewer-session table and heartbeat RPC.
#[async_trait]
pub trait PresenceStore: Send + Sync {
    /// Idempotent upsert keyed by `(session_id, stream_id)`.
    async fn upsert_session(&self, session: &ViewerSession) -> Result<(), ApiError>;

    /// Lightweight "touch last heartbeat" call.
    async fn touch_session(&self, session_id: &str, stream_id: &str) -> Result<(), ApiError>;

    async fn deactivate_session(&self, session_id: &str, stream_id: &str)
        -> Result<(), ApiError>;
}
