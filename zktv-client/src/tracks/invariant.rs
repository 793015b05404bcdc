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

//! The enabled/unmuted invariant of published local tracks.
//!
//! The SDK has been seen flipping a track to muted or disabled right around
//! `publish`, so the invariant is asserted before the call and again shortly
//! after it resolves.

use crate::error::{LiveError, Result};
use crate::event_bus::EventBus;
use crate::events::ClientEvent;
use crate::rtc::{LocalTrack, RtcClient};
use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;

/// Force `enabled && !muted`. Returns what had to be corrected, if anything.
pub async fn ensure_live(track: &dyn LocalTrack) -> Result<Option<String>> {
    let mut fixes = Vec::new();
    if !track.is_enabled() {
        track.set_enabled(true).await?;
        fixes.push("was disabled");
    }
    if track.is_muted() {
        track.set_muted(false).await?;
        fixes.push("was muted");
    }
    if fixes.is_empty() {
        return Ok(None);
    }
    if !track.is_enabled() || track.is_muted() {
        return Err(LiveError::TrackInvariantViolation {
            kind: track.kind(),
            detail: format!("{} and the correction did not stick", fixes.join(", ")),
        });
    }
    Ok(Some(fixes.join(", ")))
}

/// Publish `track` with the invariant checked before and `recheck` after.
pub async fn publish_checked(
    rtc: &dyn RtcClient,
    track: Arc<dyn LocalTrack>,
    recheck: Duration,
    events: &EventBus,
) -> Result<()> {
    correct(track.as_ref(), "before publish", events).await?;
    rtc.publish(track.clone()).await?;
    tokio::time::sleep(recheck).await;
    correct(track.as_ref(), "after publish", events).await?;
    debug!("published {} track {}", track.kind(), track.track_id());
    Ok(())
}

async fn correct(track: &dyn LocalTrack, phase: &str, events: &EventBus) -> Result<()> {
    if let Some(detail) = ensure_live(track).await? {
        let detail = format!("{detail} {phase}");
        warn!("corrected {} track {}: {detail}", track.kind(), track.track_id());
        events.emit(ClientEvent::TrackCorrected {
            kind: track.kind(),
            detail,
        });
    }
    Ok(())
}
