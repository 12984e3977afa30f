//! Lens motion phases
//!
//! Exactly one phase is active at a time. Each variant carries everything its
//! frame function needs, so nothing leaks from one phase into the next.

use lucent_core::Rect;

/// The active motion phase
#[derive(Clone, Debug, Default, PartialEq)]
pub enum MotionState {
    #[default]
    Idle,
    TapMove(TapMove),
    Drag(DragMotion),
    DragReleaseSettle(Settle),
}

/// Discriminant of [`MotionState`], for logging and assertions
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MotionPhase {
    Idle,
    TapMove,
    Drag,
    DragReleaseSettle,
}

impl MotionState {
    pub fn phase(&self) -> MotionPhase {
        match self {
            MotionState::Idle => MotionPhase::Idle,
            MotionState::TapMove(_) => MotionPhase::TapMove,
            MotionState::Drag(_) => MotionPhase::Drag,
            MotionState::DragReleaseSettle(_) => MotionPhase::DragReleaseSettle,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, MotionState::Idle)
    }
}

/// Timed travel between two slot positions.
///
/// A bounce is a tap-move whose endpoints coincide.
#[derive(Clone, Debug, PartialEq)]
pub struct TapMove {
    pub from_x: f32,
    pub to_x: f32,
    /// Target slot frame; only its y and size are used while moving
    pub base_frame: Rect,
    pub start: f64,
    pub duration: f32,
    /// Travel speed normalised against the reference velocity, 0..=1
    pub speed: f32,
    pub target_index: Option<usize>,
}

impl TapMove {
    pub fn progress(&self, now: f64) -> f32 {
        phase_progress(self.start, self.duration, now)
    }
}

/// The lens follows the pointer
#[derive(Clone, Debug, PartialEq)]
pub struct DragMotion {
    pub target_center_x: f32,
    pub current_center_x: f32,
    /// Smoothed horizontal pointer velocity in points per second
    pub velocity: f32,
    pub base_frame: Rect,
    pub started: f64,
    /// Fast follow applies until this time
    pub catch_up_until: f64,
    pub last_x: f32,
    pub last_time: f64,
    /// Values of the most recent frame, handed to the release settle
    pub last_delta: f32,
    pub last_brightness: f32,
}

/// Release settle from the drag's last frame to a slot
#[derive(Clone, Debug, PartialEq)]
pub struct Settle {
    pub from_x: f32,
    pub to_x: f32,
    pub base_frame: Rect,
    pub start_delta: f32,
    pub start_uniform: f32,
    pub start_brightness: f32,
    pub start: f64,
    pub duration: f32,
    pub target_index: usize,
}

impl Settle {
    pub fn progress(&self, now: f64) -> f32 {
        phase_progress(self.start, self.duration, now)
    }
}

fn phase_progress(start: f64, duration: f32, now: f64) -> f32 {
    if duration <= 0.0 {
        return 1.0;
    }
    (((now - start) / duration as f64) as f32).clamp(0.0, 1.0)
}

/// What the host draws for the lens on the current frame
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LensVisual {
    /// Pixel-snapped on-screen frame
    pub frame: Rect,
    pub alpha: f32,
    pub brightness: f32,
    pub delta: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_clamps() {
        let mv = TapMove {
            from_x: 0.0,
            to_x: 150.0,
            base_frame: Rect::new(150.0, 0.0, 75.0, 60.0),
            start: 1.0,
            duration: 0.5,
            speed: 0.4,
            target_index: Some(2),
        };
        assert_eq!(mv.progress(0.5), 0.0);
        assert!((mv.progress(1.25) - 0.5).abs() < 1e-6);
        assert_eq!(mv.progress(9.0), 1.0);
    }

    #[test]
    fn zero_duration_is_complete() {
        assert_eq!(phase_progress(0.0, 0.0, 0.0), 1.0);
    }

    #[test]
    fn phases() {
        assert_eq!(MotionState::default().phase(), MotionPhase::Idle);
        assert!(MotionState::Idle.is_idle());
    }
}
