//! Capsule and slot geometry

use lucent_core::{floor_to_pixels, Point, Rect};
use serde::{Deserialize, Serialize};

/// Placement of the capsule inside its container
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct CapsuleMetrics {
    pub side_inset: f32,
    pub height: f32,
    pub bottom_padding: f32,
}

impl Default for CapsuleMetrics {
    fn default() -> Self {
        Self {
            side_inset: 26.0,
            height: 60.0,
            bottom_padding: 20.0,
        }
    }
}

impl CapsuleMetrics {
    /// Capsule frame for a container, sitting above the bottom safe-area inset
    pub fn capsule_in(&self, container: Rect, bottom_inset: f32) -> Rect {
        let y = (container.height() - bottom_inset - self.height - self.bottom_padding).max(0.0);
        Rect::new(
            container.min_x() + self.side_inset,
            container.min_y() + y,
            (container.width() - 2.0 * self.side_inset).max(0.0),
            self.height,
        )
    }
}

/// Equal-width slots laid out left to right across the capsule
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TabLayout {
    pub capsule: Rect,
    pub count: usize,
    /// Device pixels per point
    pub pixel_scale: f32,
    /// Width used to derive the drag reference velocity
    pub screen_width: f32,
}

impl TabLayout {
    pub fn new(capsule: Rect, count: usize, pixel_scale: f32) -> Self {
        Self {
            capsule,
            count,
            pixel_scale,
            screen_width: capsule.width(),
        }
    }

    pub fn with_screen_width(mut self, screen_width: f32) -> Self {
        self.screen_width = screen_width;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0 || self.capsule.is_empty()
    }

    /// Width of one slot, floored to the pixel grid
    pub fn slot_width(&self) -> f32 {
        if self.count == 0 {
            return 0.0;
        }
        floor_to_pixels(self.capsule.width() / self.count as f32, self.pixel_scale)
    }

    /// Canonical frame of slot `index`; `None` when out of range
    pub fn slot_frame(&self, index: usize) -> Option<Rect> {
        if index >= self.count || self.is_empty() {
            return None;
        }
        let width = self.slot_width();
        let x = floor_to_pixels(self.capsule.min_x() + index as f32 * width, self.pixel_scale);
        Some(Rect::new(x, self.capsule.min_y(), width, self.capsule.height()))
    }

    /// Slot whose centre is closest to `x`
    pub fn nearest_index(&self, x: f32) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        let width = self.slot_width().max(f32::EPSILON);
        let raw = ((x - self.capsule.min_x()) / width).floor();
        Some((raw.max(0.0) as usize).min(self.count - 1))
    }

    /// Slot under a point, only if the point lies inside the capsule
    pub fn index_at(&self, x: f32, y: f32) -> Option<usize> {
        if !self.capsule.contains(Point::new(x, y)) {
            return None;
        }
        self.nearest_index(x)
    }

    pub fn clamp_index(&self, index: usize) -> Option<usize> {
        if self.is_empty() {
            None
        } else {
            Some(index.min(self.count - 1))
        }
    }
}
