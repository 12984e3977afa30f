//! Easing functions for animations

/// Easing function type
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Easing {
    #[default]
    Linear,
    EaseOutQuad,
    EaseInCubic,
    EaseOutCubic,
    EaseInOutCubic,
    /// Ease-out with an overshoot past 1.0 before settling.
    ///
    /// The payload is the overshoot constant; larger values overshoot further.
    EaseOutBack(f32),
}

impl Easing {
    /// Apply the easing function to a progress value (0.0 to 1.0)
    pub fn apply(&self, t: f32) -> f32 {
        match self {
            Easing::Linear => t,
            Easing::EaseOutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::EaseInCubic => t * t * t,
            Easing::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
            Easing::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Easing::EaseOutBack(overshoot) => ease_out_back(t, *overshoot),
        }
    }

    /// Apply after clamping `t` into 0..=1
    pub fn apply_clamped(&self, t: f32) -> f32 {
        self.apply(t.clamp(0.0, 1.0))
    }
}

/// `1 + (s + 1)(x - 1)^3 + s(x - 1)^2`
///
/// Starts at 0, ends at 1, and peaks above 1 for any positive `s`.
#[inline]
pub fn ease_out_back(x: f32, s: f32) -> f32 {
    let t = x - 1.0;
    1.0 + (s + 1.0) * t * t * t + s * t * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_are_exact() {
        for easing in [
            Easing::Linear,
            Easing::EaseOutQuad,
            Easing::EaseInCubic,
            Easing::EaseOutCubic,
            Easing::EaseInOutCubic,
            Easing::EaseOutBack(2.4),
        ] {
            assert!(easing.apply(0.0).abs() < 1e-6, "{easing:?} at 0");
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-6, "{easing:?} at 1");
        }
    }

    #[test]
    fn ease_out_back_overshoots() {
        let peak = (1..100)
            .map(|i| ease_out_back(i as f32 / 100.0, 2.0))
            .fold(0.0_f32, f32::max);
        assert!(peak > 1.0);
    }

    #[test]
    fn ease_out_cubic_front_loads_progress() {
        assert!(Easing::EaseOutCubic.apply(0.5) > 0.8);
    }
}
