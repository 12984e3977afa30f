//! Pointer input delivered by the host's gesture recognizers
//!
//! The lens never talks to a platform event loop directly. Hosts translate
//! their recognizer callbacks into these plain values and forward them.

use crate::geometry::Point;

/// Phase of a continuous gesture (pan or press)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GesturePhase {
    Began,
    Changed,
    Ended,
    Cancelled,
}

/// One pointer sample in the host's outer coordinate space.
///
/// `time` is in seconds on the same monotonic clock passed to every tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerSample {
    pub position: Point,
    pub time: f64,
}

impl PointerSample {
    pub fn new(x: f32, y: f32, time: f64) -> Self {
        Self {
            position: Point::new(x, y),
            time,
        }
    }
}

/// A pan recognizer callback
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PanEvent {
    pub phase: GesturePhase,
    pub sample: PointerSample,
}

/// A press (touch-down or long-press) recognizer callback
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PressEvent {
    pub phase: GesturePhase,
    pub sample: PointerSample,
}
