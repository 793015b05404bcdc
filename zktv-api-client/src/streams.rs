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

//! Stream directory reads.

use zktv_types::StreamInfo;

use crate::error::ApiError;
use crate::{parse_json, BackendClient};

const STREAMS_PATH: &str = "/rest/v1/live_streams";
const STREAM_COLUMNS: &str = "id,title,channel_name,is_active,viewer_count,hls_url";

impl BackendClient {
    /// The active stream broadcasting on `channel`, if any.
    ///
    /// Calls `GET /rest/v1/live_streams?channel_name=eq.{channel}&is_active=eq.true`.
    pub async fn active_stream(&self, channel: &str) -> Result<Option<StreamInfo>, ApiError> {
        let response = self
            .get(STREAMS_PATH)
            .query(&[
                ("select", STREAM_COLUMNS.to_string()),
                ("channel_name", format!("eq.{channel}")),
                ("is_active", "eq.true".to_string()),
                ("order", "created_at.desc".to_string()),
                ("limit", "1".to_string()),
            ])
            .send()
            .await?;
        let rows: Vec<StreamInfo> = parse_json(response).await?;
        Ok(rows.into_iter().next())
    }

    /// A stream row by id, active or not.
    ///
    /// Calls `GET /rest/v1/live_streams?id=eq.{stream_id}`.
    pub async fn stream_by_id(&self, stream_id: &str) -> Result<Option<StreamInfo>, ApiError> {
        let response = self
            .get(STREAMS_PATH)
            .query(&[
                ("select", STREAM_COLUMNS.to_string()),
                ("id", format!("eq.{stream_id}")),
                ("limit", "1".to_string()),
            ])
            .send()
            .await?;
        let rows: Vec<StreamInfo> = parse_json(response).await?;
        Ok(rows.into_iter().next())
    }
}
