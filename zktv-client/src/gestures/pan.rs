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

use super::{Point, Size};

/// Largest offset that keeps a zoomed video covering its container.
pub fn max_pan(container: Size, scale: f64) -> Point {
    let excess = (scale - 1.0).max(0.0) / 2.0;
    Point {
        x: container.width * excess,
        y: container.height * excess,
    }
}

pub fn clamp_pan(offset: Point, container: Size, scale: f64) -> Point {
    let max = max_pan(container, scale);
    Point {
        x: offset.x.clamp(-max.x, max.x),
        y: offset.y.clamp(-max.y, max.y),
    }
}

/// One-finger drag of a zoomed video.
#[derive(Debug, Clone, Default)]
pub struct Pan {
    offset: Point,
    start_touch: Option<Point>,
    start_offset: Point,
}

impl Pan {
    pub fn offset(&self) -> Point {
        self.offset
    }

    pub fn begin(&mut self, touch: Point) {
        self.start_touch = Some(touch);
        self.start_offset = self.offset;
    }

    /// Returns the new offset, or `None` when not panning. At scale 1 the
    /// offset snaps back to the origin.
    pub fn update(&mut self, touch: Point, container: Size, scale: f64) -> Option<Point> {
        let start = self.start_touch?;
        if scale <= 1.0 {
            self.offset = Point::default();
            return Some(self.offset);
        }
        let wanted = Point {
            x: self.start_offset.x + touch.x - start.x,
            y: self.start_offset.y + touch.y - start.y,
        };
        self.offset = clamp_pan(wanted, container, scale);
        Some(self.offset)
    }

    /// Re-clamp after the scale changed under a fixed offset.
    pub fn rescale(&mut self, container: Size, scale: f64) -> Point {
        self.offset = clamp_pan(self.offset, container, scale);
        self.offset
    }

    pub fn end(&mut self) {
        self.start_touch = None;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
