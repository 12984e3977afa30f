//! Lens tuning configuration (lens.toml)
//!
//! Every timing and shaping constant of the lens is tunable. Missing sections
//! and fields fall back to the defaults below.

use std::fs;
use std::path::Path;

use lucent_core::EdgeInsets;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration loading failures
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the file
    #[error("Failed to read lens config: {0}")]
    Io(#[from] std::io::Error),

    /// TOML was malformed or had wrong types
    #[error("Failed to parse lens config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Values parsed but are unusable
    #[error("Invalid lens config: {0}")]
    Invalid(String),
}

/// Top-level lens configuration
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct LensConfig {
    #[serde(default)]
    pub snapshot: SnapshotConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub motion: MotionConfig,
    #[serde(default)]
    pub gesture: GestureConfig,
}

/// Snapshot cache settings
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct SnapshotConfig {
    /// Re-capture rate limit; 0 disables it
    #[serde(default = "default_max_fps")]
    pub max_fps: f32,
    /// Extra area captured around each requested rect
    #[serde(default = "default_margin")]
    pub margin: EdgeInsets,
    /// Emit once-per-second counters at debug level
    #[serde(default)]
    pub stats_enabled: bool,
}

fn default_max_fps() -> f32 {
    60.0
}

fn default_margin() -> EdgeInsets {
    EdgeInsets::new(18.0, 44.0, 18.0, 44.0)
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            max_fps: default_max_fps(),
            margin: default_margin(),
            stats_enabled: false,
        }
    }
}

/// Outline of the lens mask
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LensShape {
    /// Rounded rect with `height / 2 + corner_radius_extra` corners
    #[default]
    Capsule,
    /// Circle inscribed in the lens frame
    Circle,
}

/// Shader look
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderConfig {
    pub downscale: f32,
    pub refraction: f32,
    pub chroma: f32,
    pub rim_thickness: f32,
    pub rim_strength: f32,
    pub edge_start: f32,
    pub edge_exponent: f32,
    /// Lens corner radius is `height / 2 + corner_radius_extra`
    pub corner_radius_extra: f32,
    pub shape: LensShape,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            downscale: 0.55,
            refraction: 0.16,
            chroma: 0.16,
            rim_thickness: 1.6,
            rim_strength: 1.05,
            edge_start: 0.45,
            edge_exponent: 6.0,
            corner_radius_extra: 20.0,
            shape: LensShape::Capsule,
        }
    }
}

/// Animation timing and deformation
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MotionConfig {
    pub frame_rate_hz: f32,
    pub tap_move_duration: f32,
    pub settle_duration: f32,
    /// Fraction of the settle spent easing toward the overshoot
    pub settle_phase1_end: f32,
    pub settle_overshoot_delta: f32,
    pub settle_back_phase1: f32,
    pub settle_back_phase2: f32,
    pub base_scale: f32,
    pub delta_range: f32,
    /// Reference speed in points per second per point of screen width
    pub reference_velocity_per_width: f32,
    /// Tap-moves use a reference velocity this many times larger
    pub tap_velocity_boost: f32,
    pub wobble_amplitude: f32,
    pub wobble_frequency_hz: f32,
    pub tap_fade_in_end: f32,
    pub tap_fade_out_start: f32,
    pub settle_fade_start: f32,
    pub tap_brightness: f32,
    pub drag_max_brightness: f32,
    pub drag_ramp_duration: f32,
    /// Weight of the newest sample in the velocity moving average
    pub velocity_smoothing: f32,
    /// Per-60Hz-frame follow factor right after a drag starts off the lens
    pub follow_catch_up: f32,
    pub follow_steady: f32,
    pub catch_up_duration: f32,
    pub prime_max_scale: f32,
    pub force_prime_delay: f32,
    pub bounce_delta: f32,
    pub bounce_duration: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            frame_rate_hz: 60.0,
            tap_move_duration: 0.5,
            settle_duration: 0.2,
            settle_phase1_end: 0.6,
            settle_overshoot_delta: -0.04,
            settle_back_phase1: 2.4,
            settle_back_phase2: 2.0,
            base_scale: 1.0,
            delta_range: 0.16,
            reference_velocity_per_width: 3.0,
            tap_velocity_boost: 1.4,
            wobble_amplitude: 0.025,
            wobble_frequency_hz: 6.0,
            tap_fade_in_end: 0.18,
            tap_fade_out_start: 0.70,
            settle_fade_start: 0.70,
            tap_brightness: 0.08,
            drag_max_brightness: 0.30,
            drag_ramp_duration: 0.2,
            velocity_smoothing: 0.2,
            follow_catch_up: 0.90,
            follow_steady: 0.35,
            catch_up_duration: 0.10,
            prime_max_scale: 1.6,
            force_prime_delay: 0.05,
            bounce_delta: 0.06,
            bounce_duration: 0.35,
        }
    }
}

/// Gesture arbitration thresholds
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct GestureConfig {
    /// Pointer travel before a pan engages the drag
    #[serde(default = "default_drag_deadzone")]
    pub drag_deadzone: f32,
    /// Taps are ignored for this long after a drag starts or ends
    #[serde(default = "default_tap_suppression")]
    pub tap_suppression: f32,
    /// Vertical slop around the capsule that still arms a drag
    #[serde(default = "default_hit_slop_y")]
    pub hit_slop_y: f32,
    /// Slop around the lens for "drag started on the lens"
    #[serde(default = "default_lens_hit_slop")]
    pub lens_hit_slop: HitSlop,
}

/// Horizontal and vertical hit slop in points
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct HitSlop {
    pub x: f32,
    pub y: f32,
}

fn default_drag_deadzone() -> f32 {
    10.0
}

fn default_tap_suppression() -> f32 {
    0.20
}

fn default_hit_slop_y() -> f32 {
    18.0
}

fn default_lens_hit_slop() -> HitSlop {
    HitSlop { x: 18.0, y: 12.0 }
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            drag_deadzone: default_drag_deadzone(),
            tap_suppression: default_tap_suppression(),
            hit_slop_y: default_hit_slop_y(),
            lens_hit_slop: default_lens_hit_slop(),
        }
    }
}

impl LensConfig {
    /// Parse and validate TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: LensConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file; a missing file yields the defaults
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Reject values the motion model cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let m = &self.motion;
        for (name, value) in [
            ("motion.frame_rate_hz", m.frame_rate_hz),
            ("motion.tap_move_duration", m.tap_move_duration),
            ("motion.settle_duration", m.settle_duration),
            ("motion.bounce_duration", m.bounce_duration),
            ("motion.base_scale", m.base_scale),
            ("motion.reference_velocity_per_width", m.reference_velocity_per_width),
            ("render.downscale", self.render.downscale),
        ] {
            if !(value > 0.0) {
                return Err(ConfigError::Invalid(format!("{name} must be positive, got {value}")));
            }
        }

        for (name, value) in [
            ("motion.settle_phase1_end", m.settle_phase1_end),
            ("motion.tap_fade_in_end", m.tap_fade_in_end),
            ("motion.tap_fade_out_start", m.tap_fade_out_start),
            ("motion.settle_fade_start", m.settle_fade_start),
        ] {
            if !(value > 0.0 && value < 1.0) {
                return Err(ConfigError::Invalid(format!("{name} must be inside (0, 1), got {value}")));
            }
        }

        if m.tap_fade_in_end >= m.tap_fade_out_start {
            return Err(ConfigError::Invalid(
                "motion.tap_fade_in_end must come before motion.tap_fade_out_start".into(),
            ));
        }

        for (name, value) in [
            ("motion.velocity_smoothing", m.velocity_smoothing),
            ("motion.follow_catch_up", m.follow_catch_up),
            ("motion.follow_steady", m.follow_steady),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!("{name} must be within [0, 1], got {value}")));
            }
        }

        if m.delta_range < 0.0 || m.delta_range >= m.base_scale {
            return Err(ConfigError::Invalid(format!(
                "motion.delta_range must be within [0, base_scale), got {}",
                m.delta_range
            )));
        }
        Ok(())
    }
}
