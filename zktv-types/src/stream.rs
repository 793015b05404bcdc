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

//! Stream directory rows.

use serde::{Deserialize, Serialize};

/// A row of the `live_streams` table as the client sees it.
///
/// The client treats this as read-mostly: it is replaced wholesale by
/// directory lookups and patched by realtime events.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct StreamInfo {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub channel_name: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub viewer_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hls_url: Option<String>,
}

impl StreamInfo {
    /// Whether a viewer should try to join this stream at all.
    pub fn is_live(&self) -> bool {
        self.is_active && !self.channel_name.is_empty()
    }
}
