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

//! Where video ends up on screen.
//!
//! A surface always fills its container and owns its own stacking order;
//! nothing outside the implementation styles the video element.

use crate::error::{LiveError, Result};
use crate::rtc::{LocalTrack, RemoteTrack, RtcError};
use async_trait::async_trait;
use std::sync::Arc;

pub const PIP_WORKAROUND: &str = "keep this tab visible or use the browser's own video controls";

#[async_trait]
pub trait RenderSurface: Send + Sync {
    /// Render a remote video track.
    fn attach_video(&self, track: Arc<dyn RemoteTrack>) -> std::result::Result<(), RtcError>;

    /// Render the host's own camera as a preview.
    fn attach_local_preview(&self, track: Arc<dyn LocalTrack>)
        -> std::result::Result<(), RtcError>;

    /// Stop rendering whatever belongs to `uid`.
    fn detach(&self, uid: &str);

    fn supports_picture_in_picture(&self) -> bool;

    async fn enter_picture_in_picture(&self) -> std::result::Result<(), RtcError>;
}

pub async fn request_picture_in_picture(surface: &dyn RenderSurface) -> Result<()> {
    if !surface.supports_picture_in_picture() {
        return Err(LiveError::unsupported("Picture-in-Picture", PIP_WORKAROUND));
    }
    surface.enter_picture_in_picture().await?;
    Ok(())
}
