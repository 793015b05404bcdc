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

//! Touch handling for the video overlay.
//!
//! Everything here is a pure state machine: callers feed touch input with
//! a timestamp and apply the returned [`OverlayAction`]s to the view.

mod controls;
mod pan;
mod swipe;
mod zoom;

pub use controls::{ControlsVisibility, DoubleTap, AUTO_HIDE_MS, DOUBLE_TAP_MS};
pub use pan::{clamp_pan, max_pan, Pan};
pub use swipe::{SwipeDetector, SwipeDirection};
pub use zoom::{PinchZoom, ZoomUpdate, MAX_SCALE, MIN_SCALE};

/// Finger travel below which a touch counts as a tap.
const TAP_SLOP_PX: f64 = 10.0;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitMode {
    Contain,
    Cover,
}

impl FitMode {
    pub fn toggled(self) -> Self {
        match self {
            FitMode::Contain => FitMode::Cover,
            FitMode::Cover => FitMode::Contain,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OverlayAction {
    SetTransform { scale: f64, offset: Point },
    ZoomLocked(bool),
    ShowControls,
    HideControls,
    /// (Re)arm the hide timer; call [`GestureController::tick`] at `at_ms`.
    ScheduleHide { at_ms: u64 },
    CancelHide,
    SetFitMode(FitMode),
    EnterFullscreen,
    ExitFullscreen,
    LockLandscape,
    UnlockOrientation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    Start,
    Move,
    End,
}

/// One touch event. For `Start`/`Move`, `points` are the fingers currently
/// down; for `End` they are the fingers just lifted.
#[derive(Debug, Clone, PartialEq)]
pub struct TouchInput {
    pub phase: TouchPhase,
    pub points: Vec<Point>,
    pub time_ms: u64,
}

impl TouchInput {
    pub fn new(phase: TouchPhase, points: Vec<Point>, time_ms: u64) -> Self {
        Self {
            phase,
            points,
            time_ms,
        }
    }
}

/// Combines zoom, pan, swipe, tap and fullscreen handling for one overlay.
#[derive(Debug, Clone)]
pub struct GestureController {
    container: Size,
    zoom: PinchZoom,
    pan: Pan,
    swipe: SwipeDetector,
    controls: ControlsVisibility,
    taps: DoubleTap,
    fullscreen: bool,
    touch_origin: Option<Point>,
    multi_touch: bool,
}

impl GestureController {
    pub fn new(container: Size, mobile: bool) -> Self {
        Self {
            container,
            zoom: PinchZoom::default(),
            pan: Pan::default(),
            swipe: SwipeDetector::default(),
            controls: ControlsVisibility::new(mobile),
            taps: DoubleTap::default(),
            fullscreen: false,
            touch_origin: None,
            multi_touch: false,
        }
    }

    pub fn scale(&self) -> f64 {
        self.zoom.scale()
    }

    pub fn offset(&self) -> Point {
        self.pan.offset()
    }

    pub fn fit_mode(&self) -> FitMode {
        self.taps.fit()
    }

    pub fn is_zoom_locked(&self) -> bool {
        self.zoom.is_locked()
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    pub fn controls_visible(&self) -> bool {
        self.controls.is_visible()
    }

    pub fn resize(&mut self, container: Size) -> Vec<OverlayAction> {
        self.container = container;
        let offset = self.pan.rescale(container, self.zoom.scale());
        vec![self.transform(offset)]
    }

    pub fn on_touch(&mut self, input: &TouchInput) -> Vec<OverlayAction> {
        match input.phase {
            TouchPhase::Start => self.touch_start(input),
            TouchPhase::Move => self.touch_move(input),
            TouchPhase::End => self.touch_end(input),
        }
    }

    pub fn tick(&mut self, now_ms: u64) -> Vec<OverlayAction> {
        self.controls.tick(now_ms).into_iter().collect()
    }

    /// Non-touch activity such as a mouse move.
    pub fn interact(&mut self, now_ms: u64) -> Vec<OverlayAction> {
        self.controls.interact(now_ms)
    }

    pub fn enter_fullscreen(&mut self, now_ms: u64) -> Vec<OverlayAction> {
        if self.fullscreen {
            return Vec::new();
        }
        self.fullscreen = true;
        let mut actions = vec![OverlayAction::EnterFullscreen, OverlayAction::LockLandscape];
        actions.extend(self.controls.set_fullscreen(true, now_ms));
        actions
    }

    pub fn exit_fullscreen(&mut self, now_ms: u64) -> Vec<OverlayAction> {
        if !self.fullscreen {
            return Vec::new();
        }
        self.fullscreen = false;
        let mut actions = vec![OverlayAction::ExitFullscreen, OverlayAction::UnlockOrientation];
        actions.extend(self.controls.set_fullscreen(false, now_ms));
        actions
    }

    pub fn toggle_fullscreen(&mut self, now_ms: u64) -> Vec<OverlayAction> {
        if self.fullscreen {
            self.exit_fullscreen(now_ms)
        } else {
            self.enter_fullscreen(now_ms)
        }
    }

    fn transform(&self, offset: Point) -> OverlayAction {
        OverlayAction::SetTransform {
            scale: self.zoom.scale(),
            offset,
        }
    }

    fn touch_start(&mut self, input: &TouchInput) -> Vec<OverlayAction> {
        let actions = self.controls.interact(input.time_ms);
        match input.points.as_slice() {
            [single] => {
                self.multi_touch = false;
                self.touch_origin = Some(*single);
                self.swipe.touch_start(*single, input.time_ms, 1);
                if self.zoom.scale() > MIN_SCALE {
                    self.pan.begin(*single);
                }
            }
            [a, b, ..] => {
                self.multi_touch = true;
                self.touch_origin = None;
                self.swipe.cancel();
                self.pan.end();
                self.zoom.begin(a.distance_to(b));
            }
            [] => {}
        }
        actions
    }

    fn touch_move(&mut self, input: &TouchInput) -> Vec<OverlayAction> {
        self.swipe.touch_move(input.points.len());
        match input.points.as_slice() {
            [a, b, ..] => {
                if !self.zoom.is_pinching() {
                    self.multi_touch = true;
                    self.touch_origin = None;
                    self.pan.end();
                    self.zoom.begin(a.distance_to(b));
                    return Vec::new();
                }
                let Some(update) = self.zoom.update(a.distance_to(b)) else {
                    return Vec::new();
                };
                let offset = self.pan.rescale(self.container, update.scale);
                let mut actions = vec![self.transform(offset)];
                if let Some(locked) = update.lock_changed {
                    actions.push(OverlayAction::ZoomLocked(locked));
                }
                if update.exit_fullscreen {
                    actions.extend(self.exit_fullscreen(input.time_ms));
                }
                actions
            }
            [single] if !self.multi_touch && self.zoom.scale() > MIN_SCALE => self
                .pan
                .update(*single, self.container, self.zoom.scale())
                .map(|offset| vec![self.transform(offset)])
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    fn touch_end(&mut self, input: &TouchInput) -> Vec<OverlayAction> {
        let now = input.time_ms;
        if self.multi_touch {
            self.zoom.end();
            self.pan.end();
            self.swipe.cancel();
            self.multi_touch = false;
            self.touch_origin = None;
            return Vec::new();
        }
        self.pan.end();
        let Some(lifted) = input.points.first().copied() else {
            return Vec::new();
        };
        let origin = self.touch_origin.take();

        // Swipes only toggle controls at scale 1; when zoomed the finger pans.
        let swipe = self.swipe.touch_end(lifted, now);
        if swipe.is_some() && self.zoom.scale() <= MIN_SCALE {
            return self.controls.toggle(now);
        }

        let is_tap = origin.is_some_and(|o| o.distance_to(&lifted) < TAP_SLOP_PX);
        if is_tap {
            if let Some(fit) = self.taps.tap(now) {
                return vec![OverlayAction::SetFitMode(fit)];
            }
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTAINER: Size = Size {
        width: 400.0,
        height: 300.0,
    };

    fn start(points: &[(f64, f64)], t: u64) -> TouchInput {
        TouchInput::new(
            TouchPhase::Start,
            points.iter().map(|&(x, y)| Point::new(x, y)).collect(),
            t,
        )
    }

    fn moved(points: &[(f64, f64)], t: u64) -> TouchInput {
        TouchInput {
            phase: TouchPhase::Move,
            ..start(points, t)
        }
    }

    fn end(points: &[(f64, f64)], t: u64) -> TouchInput {
        TouchInput {
            phase: TouchPhase::End,
            ..start(points, t)
        }
    }

    fn pinch(ctl: &mut GestureController, from: f64, to: f64, t: u64) -> Vec<OverlayAction> {
        ctl.on_touch(&start(&[(0.0, 0.0), (from, 0.0)], t));
        let actions = ctl.on_touch(&moved(&[(0.0, 0.0), (to, 0.0)], t + 50));
        ctl.on_touch(&end(&[(0.0, 0.0)], t + 100));
        actions
    }

    #[test]
    fn pinch_zoom_emits_transform_and_lock() {
        let mut ctl = GestureController::new(CONTAINER, true);
        let actions = pinch(&mut ctl, 100.0, 200.0, 0);
        assert!(actions.contains(&OverlayAction::SetTransform {
            scale: 2.0,
            offset: Point::default()
        }));
        assert!(actions.contains(&OverlayAction::ZoomLocked(true)));
        assert!(ctl.is_zoom_locked());
    }

    #[test]
    fn pan_only_when_zoomed() {
        let mut ctl = GestureController::new(CONTAINER, false);
        ctl.on_touch(&start(&[(100.0, 100.0)], 0));
        assert!(ctl.on_touch(&moved(&[(150.0, 100.0)], 10)).is_empty());
        ctl.on_touch(&end(&[(150.0, 100.0)], 20));

        pinch(&mut ctl, 100.0, 200.0, 1_000);
        ctl.on_touch(&start(&[(100.0, 100.0)], 2_000));
        let actions = ctl.on_touch(&moved(&[(1_000.0, 100.0)], 2_010));
        assert_eq!(
            actions,
            vec![OverlayAction::SetTransform {
                scale: 2.0,
                offset: Point::new(200.0, 0.0)
            }]
        );
    }

    #[test]
    fn pinch_in_while_locked_leaves_fullscreen() {
        let mut ctl = GestureController::new(CONTAINER, true);
        ctl.enter_fullscreen(0);
        pinch(&mut ctl, 100.0, 150.0, 100);
        assert!(ctl.is_zoom_locked());

        let actions = pinch(&mut ctl, 100.0, 30.0, 1_000);
        assert!(actions.contains(&OverlayAction::ZoomLocked(false)));
        assert!(actions.contains(&OverlayAction::ExitFullscreen));
        assert!(actions.contains(&OverlayAction::UnlockOrientation));
        assert!(!ctl.is_fullscreen());
    }

    #[test]
    fn swipe_toggles_controls_single_finger_only() {
        let mut ctl = GestureController::new(CONTAINER, true);
        ctl.on_touch(&start(&[(200.0, 250.0)], 0));
        let actions = ctl.on_touch(&end(&[(200.0, 100.0)], 200));
        assert_eq!(actions, vec![OverlayAction::HideControls]);
        assert!(!ctl.controls_visible());

        ctl.on_touch(&start(&[(200.0, 250.0), (220.0, 250.0)], 1_000));
        let actions = ctl.on_touch(&end(&[(200.0, 100.0)], 1_100));
        assert!(actions.is_empty());
    }

    #[test]
    fn double_tap_toggles_fit_mode() {
        let mut ctl = GestureController::new(CONTAINER, false);
        ctl.on_touch(&start(&[(50.0, 50.0)], 0));
        ctl.on_touch(&end(&[(51.0, 50.0)], 40));
        ctl.on_touch(&start(&[(50.0, 50.0)], 150));
        let actions = ctl.on_touch(&end(&[(50.0, 52.0)], 200));
        assert_eq!(actions, vec![OverlayAction::SetFitMode(FitMode::Cover)]);
        assert_eq!(ctl.fit_mode(), FitMode::Cover);
    }

    #[test]
    fn fullscreen_locks_landscape_and_auto_hides() {
        let mut ctl = GestureController::new(CONTAINER, false);
        let actions = ctl.enter_fullscreen(1_000);
        assert_eq!(
            actions,
            vec![
                OverlayAction::EnterFullscreen,
                OverlayAction::LockLandscape,
                OverlayAction::ScheduleHide { at_ms: 4_000 },
            ]
        );
        assert!(ctl.enter_fullscreen(1_500).is_empty());
        assert_eq!(ctl.tick(4_000), vec![OverlayAction::HideControls]);

        let actions = ctl.toggle_fullscreen(5_000);
        assert_eq!(
            actions,
            vec![
                OverlayAction::ExitFullscreen,
                OverlayAction::UnlockOrientation,
                OverlayAction::ShowControls,
            ]
        );
        assert!(ctl.tick(60_000).is_empty());
    }
}
