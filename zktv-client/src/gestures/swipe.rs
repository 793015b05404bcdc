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

use super::Point;

pub const SWIPE_MIN_DISTANCE_PX: f64 = 60.0;
pub const SWIPE_MIN_VELOCITY_PX_PER_MS: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDirection {
    Up,
    Down,
}

/// Single-finger vertical swipe. Any second finger cancels the gesture.
#[derive(Debug, Clone, Default)]
pub struct SwipeDetector {
    start: Option<(Point, u64)>,
}

impl SwipeDetector {
    pub fn touch_start(&mut self, point: Point, time_ms: u64, touches: usize) {
        self.start = (touches == 1).then_some((point, time_ms));
    }

    pub fn touch_move(&mut self, touches: usize) {
        if touches > 1 {
            self.cancel();
        }
    }

    pub fn cancel(&mut self) {
        self.start = None;
    }

    pub fn touch_end(&mut self, point: Point, time_ms: u64) -> Option<SwipeDirection> {
        let (start, started_at) = self.start.take()?;
        let dx = point.x - start.x;
        let dy = point.y - start.y;
        let elapsed = time_ms.saturating_sub(started_at).max(1) as f64;
        let distance = dy.abs();
        if distance <= SWIPE_MIN_DISTANCE_PX
            || distance / elapsed <= SWIPE_MIN_VELOCITY_PX_PER_MS
            || dx.abs() > distance
        {
            return None;
        }
        Some(if dy < 0.0 {
            SwipeDirection::Up
        } else {
            SwipeDirection::Down
        })
    }
}
