//! Lucent Motion
//!
//! Drives the glass lens over a tab bar capsule: tap-moves between slots,
//! direct drags with jelly deformation and the release settle, plus the
//! gesture arbitration and debounced selection commits around them.
//!
//! # Example
//!
//! ```rust
//! use image::RgbaImage;
//! use lucent_animation::ManualLink;
//! use lucent_core::Rect;
//! use lucent_gpu::{LensSurface, RenderParameters};
//! use lucent_motion::{LensConfig, LensOverlay, MotionController, TabLayout};
//! use lucent_snapshot::ImageCaptureSource;
//!
//! struct Discard;
//!
//! impl LensSurface for Discard {
//!     fn update_background(&mut self, _background: &RgbaImage) {}
//!     fn draw(&mut self, _params: &RenderParameters) -> bool {
//!         true
//!     }
//! }
//!
//! let config = LensConfig::default();
//! let mut overlay = LensOverlay::from_config(Box::new(Discard), &config, 2.0);
//! overlay
//!     .cache_mut()
//!     .set_capture_source(Box::new(ImageCaptureSource::new(RgbaImage::new(780, 200), 2.0)));
//!
//! let layout = TabLayout::new(Rect::new(0.0, 20.0, 300.0, 60.0), 4, 2.0);
//! let mut lens = MotionController::new(config, layout, Some(0), Box::new(ManualLink), overlay);
//!
//! lens.move_to(2, 0.0);
//! let mut now = 0.0;
//! while lens.tick(now) {
//!     now += 1.0 / 60.0;
//! }
//! assert_eq!(lens.visual().frame, Rect::new(150.0, 20.0, 75.0, 60.0));
//! ```

pub mod config;
pub mod controller;
pub mod gesture;
pub mod layout;
pub mod overlay;
pub mod state;

pub use config::{
    ConfigError, GestureConfig, HitSlop, LensConfig, LensShape, MotionConfig, RenderConfig,
    SnapshotConfig,
};
pub use controller::{CommitHandler, ContextGestureHandler, MotionController};
pub use gesture::{GestureArbiter, PanDecision};
pub use layout::{CapsuleMetrics, TabLayout};
pub use overlay::{LensOverlay, MIN_VISIBLE_ALPHA};
pub use state::{DragMotion, LensVisual, MotionPhase, MotionState, Settle, TapMove};
