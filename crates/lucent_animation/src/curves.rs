//! Jelly deformation curves
//!
//! The lens squashes and stretches by a single signed deformation `delta`:
//! width scales by `base - delta` and height by `base + delta`, so positive
//! values make the lens taller and narrower. Every curve here is a pure
//! function of phase progress and time, which keeps frame output reproducible
//! for a given clock.

use crate::easing::{ease_out_back, Easing};
use std::f32::consts::PI;

/// Converts between a signed deformation and absolute per-axis scales
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Deformation {
    pub base_scale: f32,
    /// Deformation is always clamped to `-delta_range..=delta_range`
    pub delta_range: f32,
}

impl Deformation {
    pub fn new(base_scale: f32, delta_range: f32) -> Self {
        Self {
            base_scale,
            delta_range: delta_range.abs(),
        }
    }

    pub fn clamp(&self, delta: f32) -> f32 {
        delta.max(-self.delta_range).min(self.delta_range)
    }

    /// `(scale_x, scale_y)` for a deformation
    pub fn scales(&self, delta: f32) -> (f32, f32) {
        let d = self.clamp(delta);
        (self.base_scale - d, self.base_scale + d)
    }

    /// Recover the deformation from a pair of absolute scales
    pub fn delta_from_scales(&self, scale_x: f32, scale_y: f32) -> f32 {
        self.clamp((scale_y - scale_x) * 0.5)
    }

    /// Magnitude of `delta` as a fraction of the range, in 0..=1
    pub fn intensity(&self, delta: f32) -> f32 {
        if self.delta_range <= f32::EPSILON {
            return 0.0;
        }
        (delta.abs() / self.delta_range).min(1.0)
    }
}

/// Sinusoidal jiggle superimposed on the deformation
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Wobble {
    /// Amplitude at full speed
    pub amplitude: f32,
    pub frequency_hz: f32,
}

impl Wobble {
    /// Wobble offset at absolute time `now`, scaled by `strength` in 0..=1
    pub fn sample(&self, now: f64, strength: f32) -> f32 {
        let phase = (now * std::f64::consts::TAU * self.frequency_hz as f64).sin() as f32;
        phase * self.amplitude * strength
    }
}

/// `|velocity| / reference` clamped to 0..=1
pub fn speed_factor(velocity: f32, reference: f32) -> f32 {
    (velocity.abs() / reference.max(1.0)).clamp(0.0, 1.0)
}

/// Symmetric bump, 0 at both ends and 1 in the middle
pub fn mid_bump(t: f32) -> f32 {
    (PI * t.clamp(0.0, 1.0)).sin()
}

/// Deformation during a tap-move: a speed-scaled bump plus wobble
pub fn tap_delta(
    deformation: &Deformation,
    wobble: &Wobble,
    t: f32,
    speed: f32,
    now: f64,
) -> f32 {
    let bump = mid_bump(t);
    let target = deformation.delta_range * speed * bump;
    deformation.clamp(target + wobble.sample(now, speed * bump))
}

/// Deformation while dragging; `deform` is ramp times speed factor
pub fn drag_delta(deformation: &Deformation, wobble: &Wobble, deform: f32, now: f64) -> f32 {
    let deform = deform.clamp(0.0, 1.0);
    deformation.clamp(deformation.delta_range * deform + wobble.sample(now, deform))
}

/// Two-phase back-eased settle of the deformation after a drag release
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SettleCurve {
    /// Fraction of the settle spent easing toward the overshoot
    pub phase1_end: f32,
    /// Deformation reached at the end of phase 1
    pub overshoot_delta: f32,
    pub back_phase1: f32,
    pub back_phase2: f32,
}

impl SettleCurve {
    /// Deformation at progress `t`, starting from `start_delta` and resting at 0
    pub fn delta(&self, deformation: &Deformation, t: f32, start_delta: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        let t1 = self.phase1_end.clamp(f32::EPSILON, 1.0 - f32::EPSILON);
        let d1 = self.overshoot_delta;
        if t <= t1 {
            let p = (t / t1).clamp(0.0, 1.0);
            let k = ease_out_back(p, self.back_phase1);
            deformation.clamp(start_delta + (d1 - start_delta) * k)
        } else {
            let p = ((t - t1) / (1.0 - t1)).clamp(0.0, 1.0);
            let k = ease_out_back(p, self.back_phase2);
            deformation.clamp(d1 - d1 * k)
        }
    }

    /// Uniform scale at progress `t`.
    ///
    /// Phase 1 eases from `start_uniform` toward `min_uniform`, the scale at
    /// which the lens matches the slot; phase 2 back-eases up to 1.
    pub fn uniform(&self, t: f32, start_uniform: f32, min_uniform: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        let t1 = self.phase1_end.clamp(f32::EPSILON, 1.0 - f32::EPSILON);
        if t <= t1 {
            let p = Easing::EaseOutCubic.apply_clamped(t / t1);
            start_uniform + (min_uniform - start_uniform) * p
        } else {
            let p = ((t - t1) / (1.0 - t1)).clamp(0.0, 1.0);
            min_uniform + (1.0 - min_uniform) * ease_out_back(p, self.back_phase2)
        }
    }
}

/// Overlay alpha during a tap-move.
///
/// Ramps in linearly until `fade_in_end`, holds at 1, then ramps out from
/// `fade_out_start`. While `hold` is set the ramp-out never starts.
pub fn tap_alpha(t: f32, fade_in_end: f32, fade_out_start: f32, hold: bool) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t <= fade_in_end {
        if fade_in_end <= f32::EPSILON {
            return 1.0;
        }
        (t / fade_in_end).clamp(0.0, 1.0)
    } else if t < fade_out_start || hold {
        1.0
    } else {
        fade_out(t, fade_out_start)
    }
}

/// Overlay alpha during a settle: 1 until `fade_start`, then linear to 0
pub fn settle_alpha(t: f32, fade_start: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < fade_start {
        1.0
    } else {
        fade_out(t, fade_start)
    }
}

fn fade_out(t: f32, start: f32) -> f32 {
    let span = (1.0 - start).max(f32::EPSILON);
    1.0 - ((t - start) / span).clamp(0.0, 1.0)
}

/// Ease-out-cubic ramp from 0 to 1 over `duration` seconds
pub fn ramp_in(elapsed: f64, duration: f32) -> f32 {
    if duration <= 0.0 {
        return 1.0;
    }
    Easing::EaseOutCubic.apply_clamped((elapsed / duration as f64) as f32)
}

/// Per-frame exponential follow factor for an arbitrary step `dt`.
///
/// `k_per_frame` is tuned for 60 Hz; the result moves the same share of the
/// remaining distance per second regardless of the actual frame rate.
pub fn follow_factor(k_per_frame: f32, dt: f64) -> f32 {
    let k = k_per_frame.clamp(0.0, 1.0);
    if k >= 1.0 {
        return 1.0;
    }
    let frames = (dt.max(0.0) * 60.0) as f32;
    1.0 - (1.0 - k).powf(frames)
}
