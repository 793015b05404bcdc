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

//! Events pushed by the realtime bus (or synthesized by polling).

use crate::stream::StreamInfo;
use serde::{Deserialize, Serialize};

/// Broadcast event name for a full stream row update.
pub const STREAM_UPDATED: &str = "stream-updated";
/// Broadcast event name for a viewer count change.
pub const VIEWER_COUNT_UPDATED: &str = "viewer-count-updated";

/// A stream state change, keyed by stream id.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "event", content = "payload", rename_all = "kebab-case")]
pub enum RealtimeEvent {
    StreamUpdated(StreamInfo),
    ViewerCountUpdated { stream_id: String, viewer_count: u64 },
}

impl RealtimeEvent {
    pub fn stream_id(&self) -> &str {
        match self {
            RealtimeEvent::StreamUpdated(stream) => &stream.id,
            RealtimeEvent::ViewerCountUpdated { stream_id, .. } => stream_id,
        }
    }

    /// Apply this event to a cached row. Returns `false` when the event
    /// belongs to another stream.
    pub fn apply_to(&self, stream: &mut StreamInfo) -> bool {
        if self.stream_id() != stream.id {
            return false;
        }
        match self {
            RealtimeEvent::StreamUpdated(updated) => *stream = updated.clone(),
            RealtimeEvent::ViewerCountUpdated { viewer_count, .. } => {
                stream.viewer_count = *viewer_count
            }
        }
        true
    }
}
