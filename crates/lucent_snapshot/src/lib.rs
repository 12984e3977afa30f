//! Lucent Snapshot Cache
//!
//! Captures the screen behind the lens rarely and serves cheap per-frame crops:
//!
//! - [`SnapshotCache`]: single-slot cache with priming and rate-limited refresh
//! - [`CaptureSource`]: injected rasterizer; [`HidingCaptureSource`] hides the
//!   overlay while capturing, [`ImageCaptureSource`] reads from an in-memory
//!   screen image
//! - [`SnapshotStats`]: counters with an optional once-per-second debug report
//!
//! # Example
//!
//! ```rust
//! use image::RgbaImage;
//! use lucent_core::{EdgeInsets, Rect};
//! use lucent_snapshot::{ImageCaptureSource, SnapshotCache};
//!
//! let mut cache = SnapshotCache::new(60.0);
//! cache.set_capture_source(Box::new(ImageCaptureSource::new(RgbaImage::new(400, 200), 1.0)));
//!
//! let a = Rect::new(0.0, 0.0, 100.0, 50.0);
//! let b = Rect::new(150.0, 0.0, 100.0, 50.0);
//! assert!(cache.prime(&[a, b], 1.0, EdgeInsets::uniform(8.0), 0.0));
//!
//! let crop = cache.cropped_image(Rect::new(40.0, 10.0, 120.0, 30.0), 1.0, EdgeInsets::ZERO, 0.001);
//! assert_eq!(crop.map(|c| c.dimensions()), Some((120, 30)));
//! ```

pub mod cache;
pub mod capture;
pub mod stats;

pub use cache::{Snapshot, SnapshotCache, SCALE_EPSILON};
pub use capture::{
    expected_pixel_size, CaptureSource, HidingCaptureSource, ImageCaptureSource,
    OverlayVisibility, Rasterizer,
};
pub use image::RgbaImage as Bitmap;
pub use stats::{MissReason, SnapshotCounters, SnapshotStats};
