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

//! The REST backend as the live core's directory and presence store.

use crate::directory::StreamDirectory;
use crate::presence::PresenceStore;
use async_trait::async_trait;
use zktv_api_client::{ApiError, BackendClient};
use zktv_types::{StreamInfo, ViewerSession};

#[async_trait]
impl StreamDirectory for BackendClient {
    async fn active_stream(&self, channel: &str) -> Result<Option<StreamInfo>, ApiError> {
        BackendClient::active_stream(self, channel).await
    }

    async fn stream_by_id(&self, stream_id: &str) -> Result<Option<StreamInfo>, ApiError> {
        BackendClient::stream_by_id(self, stream_id).await
    }
}

#[async_trait]
impl PresenceStore for BackendClient {
    async fn upsert_session(&self, session: &ViewerSession) -> Result<(), ApiError> {
        self.upsert_viewer_session(session).await
    }

    async fn touch_session(&self, session_id: &str, stream_id: &str) -> Result<(), ApiError> {
        self.touch_heartbeat(session_id, stream_id).await
    }

    async fn deactivate_session(
        &self,
        session_id: &str,
        stream_id: &str,
    ) -> Result<(), ApiError> {
        self.deactivate_viewer_session(session_id, stream_id).await
    }
}
