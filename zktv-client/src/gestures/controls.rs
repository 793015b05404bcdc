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

use super::{FitMode, OverlayAction};

pub const AUTO_HIDE_MS: u64 = 3_000;
pub const DOUBLE_TAP_MS: u64 = 300;

/// Overlay controls: shown on interaction, hidden after [`AUTO_HIDE_MS`] of
/// inactivity on mobile or in fullscreen, always shown otherwise.
#[derive(Debug, Clone)]
pub struct ControlsVisibility {
    visible: bool,
    hide_at: Option<u64>,
    mobile: bool,
    fullscreen: bool,
}

impl ControlsVisibility {
    pub fn new(mobile: bool) -> Self {
        Self {
            visible: true,
            hide_at: None,
            mobile,
            fullscreen: false,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn hide_at(&self) -> Option<u64> {
        self.hide_at
    }

    fn auto_hides(&self) -> bool {
        self.mobile || self.fullscreen
    }

    pub fn interact(&mut self, now_ms: u64) -> Vec<OverlayAction> {
        let mut actions = Vec::new();
        if !self.visible {
            self.visible = true;
            actions.push(OverlayAction::ShowControls);
        }
        if self.auto_hides() {
            let at_ms = now_ms + AUTO_HIDE_MS;
            self.hide_at = Some(at_ms);
            actions.push(OverlayAction::ScheduleHide { at_ms });
        } else if self.hide_at.take().is_some() {
            actions.push(OverlayAction::CancelHide);
        }
        actions
    }

    /// A swipe flips visibility.
    pub fn toggle(&mut self, now_ms: u64) -> Vec<OverlayAction> {
        if self.visible && self.auto_hides() {
            self.visible = false;
            self.hide_at = None;
            vec![OverlayAction::HideControls]
        } else {
            self.interact(now_ms)
        }
    }

    pub fn tick(&mut self, now_ms: u64) -> Option<OverlayAction> {
        match self.hide_at {
            Some(at) if now_ms >= at && self.auto_hides() => {
                self.hide_at = None;
                self.visible = false;
                Some(OverlayAction::HideControls)
            }
            _ => None,
        }
    }

    pub fn set_fullscreen(&mut self, fullscreen: bool, now_ms: u64) -> Vec<OverlayAction> {
        self.fullscreen = fullscreen;
        self.interact(now_ms)
    }
}

/// Two taps within [`DOUBLE_TAP_MS`] toggle contain/cover.
#[derive(Debug, Clone)]
pub struct DoubleTap {
    last_tap: Option<u64>,
    fit: FitMode,
}

impl Default for DoubleTap {
    fn default() -> Self {
        Self {
            last_tap: None,
            fit: FitMode::Contain,
        }
    }
}

impl DoubleTap {
    pub fn fit(&self) -> FitMode {
        self.fit
    }

    pub fn tap(&mut self, now_ms: u64) -> Option<FitMode> {
        match self.last_tap.take() {
            Some(last) if now_ms.saturating_sub(last) < DOUBLE_TAP_MS => {
                self.fit = self.fit.toggled();
                Some(self.fit)
            }
            _ => {
                self.last_tap = Some(now_ms);
                None
            }
        }
    }
}
