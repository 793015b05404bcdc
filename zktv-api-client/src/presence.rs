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
 */

//! Viewer presence endpoints: upsert, heartbeat touch, retire.

use chrono::Utc;
use zktv_types::presence::{HeartbeatRequest, SessionActivePatch};
use zktv_types::ViewerSession;

use crate::error::ApiError;
use crate::{parse_status_only, BackendClient};

const SESSIONS_PATH: &str = "/rest/v1/viewer_sessions";
const HEARTBEAT_RPC_PATH: &str = "/rest/v1/rpc/update_viewer_heartbeat";

impl BackendClient {
    /// Insert or refresh a viewer session row. Idempotent.
    ///
    /// Calls `POST /rest/v1/viewer_sessions?on_conflict=session_id,stream_id`
    /// with `Prefer: resolution=merge-duplicates`.
    pub async fn upsert_viewer_session(&self, session: &ViewerSession) -> Result<(), ApiError> {
        let response = self
            .post(SESSIONS_PATH)
            .query(&[("on_conflict", "session_id,stream_id")])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(session)
            .send()
            .await?;
        parse_status_only(response).await
    }

    /// Lightweight liveness touch for an existing session.
    ///
    /// Calls `POST /rest/v1/rpc/update_viewer_heartbeat`.
    pub async fn touch_heartbeat(&self, session_id: &str, stream_id: &str) -> Result<(), ApiError> {
        let body = HeartbeatRequest {
            p_session_id: session_id.to_string(),
            p_stream_id: stream_id.to_string(),
        };
        let response = self.post(HEARTBEAT_RPC_PATH).json(&body).send().await?;
        parse_status_only(response).await
    }

    /// Mark a session inactive. The row itself is never deleted client-side.
    ///
    /// Calls `PATCH /rest/v1/viewer_sessions?session_id=eq.{..}&stream_id=eq.{..}`.
    pub async fn deactivate_viewer_session(
        &self,
        session_id: &str,
        stream_id: &str,
    ) -> Result<(), ApiError> {
        let body = SessionActivePatch {
            is_active: false,
            last_heartbeat: Utc::now(),
        };
        let response = self
            .patch(SESSIONS_PATH)
            .query(&[
                ("session_id", format!("eq.{session_id}")),
                ("stream_id", format!("eq.{stream_id}")),
            ])
            .header("Prefer", "return=minimal")
            .json(&body)
            .send()
            .await?;
        parse_status_only(response).await
    }
}
