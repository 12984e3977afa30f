//! Tap versus drag arbitration
//!
//! The host runs a tap (or long-press) recognizer and a pan recognizer side by
//! side. The arbiter decides when a pan turns into a lens drag and keeps
//! trailing taps from re-selecting right after a drag.

use lucent_core::{PointerSample, Rect};

use crate::config::GestureConfig;

/// What the controller should do with a pan callback
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanDecision {
    /// Not a lens drag (yet); let the tap recognizer have it
    Ignore,
    /// The deadzone was crossed; cancel the tap recognizer and start dragging
    BeginDrag { started_on_lens: bool },
    UpdateDrag,
    EndDrag { cancelled: bool },
}

#[derive(Clone, Debug)]
pub struct GestureArbiter {
    config: GestureConfig,
    armed: bool,
    started_on_lens: bool,
    dragging: bool,
    start: Option<PointerSample>,
    suppress_tap_until: f64,
}

impl GestureArbiter {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            armed: false,
            started_on_lens: false,
            dragging: false,
            start: None,
            suppress_tap_until: f64::NEG_INFINITY,
        }
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// A pan started. It arms only inside the capsule's hit region.
    pub fn pan_began(&mut self, sample: PointerSample, capsule: Rect, lens: Option<Rect>) -> PanDecision {
        self.reset();
        let hit = capsule.inset(0.0, -self.config.hit_slop_y);
        if !hit.contains(sample.position) {
            return PanDecision::Ignore;
        }

        let slop = self.config.lens_hit_slop;
        self.armed = true;
        self.started_on_lens = lens
            .map(|frame| frame.inset(-slop.x, -slop.y).contains(sample.position))
            .unwrap_or(false);
        self.start = Some(sample);
        PanDecision::Ignore
    }

    pub fn pan_changed(&mut self, sample: PointerSample) -> PanDecision {
        if !self.armed {
            return PanDecision::Ignore;
        }
        if self.dragging {
            return PanDecision::UpdateDrag;
        }
        let Some(start) = self.start else {
            return PanDecision::Ignore;
        };
        if start.position.distance(sample.position) <= self.config.drag_deadzone {
            return PanDecision::Ignore;
        }

        self.dragging = true;
        self.suppress_until(sample.time);
        PanDecision::BeginDrag {
            started_on_lens: self.started_on_lens,
        }
    }

    pub fn pan_ended(&mut self, sample: PointerSample, cancelled: bool) -> PanDecision {
        let was_dragging = self.dragging;
        self.reset();
        if !was_dragging {
            return PanDecision::Ignore;
        }
        self.suppress_until(sample.time);
        PanDecision::EndDrag { cancelled }
    }

    /// Whether a tap arriving at `now` may change the selection
    pub fn tap_allowed(&self, now: f64) -> bool {
        !self.dragging && now >= self.suppress_tap_until
    }

    fn suppress_until(&mut self, now: f64) {
        self.suppress_tap_until = self.suppress_tap_until.max(now + self.config.tap_suppression as f64);
    }

    fn reset(&mut self) {
        self.armed = false;
        self.started_on_lens = false;
        self.dragging = false;
        self.start = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capsule() -> Rect {
        Rect::new(0.0, 100.0, 300.0, 60.0)
    }

    #[test]
    fn pan_outside_capsule_never_drags() {
        let mut arbiter = GestureArbiter::new(GestureConfig::default());
        arbiter.pan_began(PointerSample::new(50.0, 20.0, 0.0), capsule(), None);
        assert!(!arbiter.is_armed());
        assert_eq!(arbiter.pan_changed(PointerSample::new(150.0, 20.0, 0.1)), PanDecision::Ignore);
    }

    #[test]
    fn vertical_slop_arms() {
        let mut arbiter = GestureArbiter::new(GestureConfig::default());
        arbiter.pan_began(PointerSample::new(50.0, 90.0, 0.0), capsule(), None);
        assert!(arbiter.is_armed());
    }

    #[test]
    fn deadzone_then_drag() {
        let mut arbiter = GestureArbiter::new(GestureConfig::default());
        let lens = Rect::new(0.0, 100.0, 75.0, 60.0);
        arbiter.pan_began(PointerSample::new(30.0, 130.0, 0.0), capsule(), Some(lens));

        assert_eq!(arbiter.pan_changed(PointerSample::new(38.0, 130.0, 0.02)), PanDecision::Ignore);
        assert!(arbiter.tap_allowed(0.02));

        assert_eq!(
            arbiter.pan_changed(PointerSample::new(45.0, 130.0, 0.04)),
            PanDecision::BeginDrag { started_on_lens: true }
        );
        assert!(!arbiter.tap_allowed(0.05));
        assert_eq!(arbiter.pan_changed(PointerSample::new(90.0, 130.0, 0.06)), PanDecision::UpdateDrag);

        assert_eq!(
            arbiter.pan_ended(PointerSample::new(90.0, 130.0, 0.30), false),
            PanDecision::EndDrag { cancelled: false }
        );
        assert!(!arbiter.tap_allowed(0.45));
        assert!(arbiter.tap_allowed(0.51));
    }

    #[test]
    fn drag_away_from_lens_is_flagged() {
        let mut arbiter = GestureArbiter::new(GestureConfig::default());
        let lens = Rect::new(0.0, 100.0, 75.0, 60.0);
        arbiter.pan_began(PointerSample::new(200.0, 130.0, 0.0), capsule(), Some(lens));
        assert_eq!(
            arbiter.pan_changed(PointerSample::new(230.0, 130.0, 0.05)),
            PanDecision::BeginDrag { started_on_lens: false }
        );
    }

    #[test]
    fn short_pan_end_is_ignored() {
        let mut arbiter = GestureArbiter::new(GestureConfig::default());
        arbiter.pan_began(PointerSample::new(30.0, 130.0, 0.0), capsule(), None);
        assert_eq!(arbiter.pan_ended(PointerSample::new(32.0, 130.0, 0.1), false), PanDecision::Ignore);
        assert!(arbiter.tap_allowed(0.1));
    }
}
