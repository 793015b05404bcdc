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

//! Viewer presence rows and RPC payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A viewer's presence in one stream, keyed by `(session_id, stream_id)`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ViewerSession {
    pub session_id: String,
    pub stream_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub last_heartbeat: DateTime<Utc>,
    pub is_active: bool,
}

impl ViewerSession {
    pub fn new(session_id: String, stream_id: String, user_id: Option<String>) -> Self {
        Self {
            session_id,
            stream_id,
            user_id,
            last_heartbeat: Utc::now(),
            is_active: true,
        }
    }

    /// Refresh the heartbeat timestamp and mark active.
    pub fn touch(&mut self) {
        self.last_heartbeat = Utc::now();
        self.is_active = true;
    }
}

/// Arguments of the `update_viewer_heartbeat` RPC.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HeartbeatRequest {
    pub p_session_id: String,
    pub p_stream_id: String,
}

/// Body of the PATCH that retires a session.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionActivePatch {
    pub is_active: bool,
    pub last_heartbeat: DateTime<Utc>,
}
