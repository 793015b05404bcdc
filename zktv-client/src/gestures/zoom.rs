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

pub const MIN_SCALE: f64 = 1.0;
pub const MAX_SCALE: f64 = 3.0;
pub const LOCK_ABOVE: f64 = 1.05;
pub const UNLOCK_BELOW: f64 = 0.98;
pub const EXIT_FULLSCREEN_BELOW: f64 = 0.95;

/// Result of one pinch move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomUpdate {
    /// Clamped scale to apply.
    pub scale: f64,
    /// Unclamped scale relative to the gesture start.
    pub raw: f64,
    pub lock_changed: Option<bool>,
    pub exit_fullscreen: bool,
}

/// Two-finger pinch zoom.
///
/// Lock thresholds are compared against the raw pinch ratio, so a pinch-in
/// at scale 1.0 can still unlock and leave fullscreen.
#[derive(Debug, Clone)]
pub struct PinchZoom {
    scale: f64,
    start_distance: Option<f64>,
    start_scale: f64,
    locked: bool,
}

impl Default for PinchZoom {
    fn default() -> Self {
        Self {
            scale: MIN_SCALE,
            start_distance: None,
            start_scale: MIN_SCALE,
            locked: false,
        }
    }
}

impl PinchZoom {
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn is_pinching(&self) -> bool {
        self.start_distance.is_some()
    }

    pub fn begin(&mut self, distance: f64) {
        self.start_distance = Some(distance.max(1.0));
        self.start_scale = self.scale;
    }

    pub fn update(&mut self, distance: f64) -> Option<ZoomUpdate> {
        let start = self.start_distance?;
        let raw = self.start_scale * (distance.max(0.0) / start);
        self.scale = raw.clamp(MIN_SCALE, MAX_SCALE);

        let mut lock_changed = None;
        let mut exit_fullscreen = false;
        if !self.locked && raw > LOCK_ABOVE {
            self.locked = true;
            lock_changed = Some(true);
        } else if self.locked && raw < UNLOCK_BELOW {
            self.locked = false;
            lock_changed = Some(false);
            exit_fullscreen = raw < EXIT_FULLSCREEN_BELOW;
        }
        Some(ZoomUpdate {
            scale: self.scale,
            raw,
            lock_changed,
            exit_fullscreen,
        })
    }

    pub fn end(&mut self) {
        self.start_distance = None;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
