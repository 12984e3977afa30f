//! Single-slot snapshot cache
//!
//! Capturing the screen is far more expensive than cropping a bitmap, so the
//! cache captures a generous region rarely and serves cheap per-frame crops
//! out of it. Re-capture is rate limited by wall-clock time since the cached
//! snapshot was taken, never by how often crops are requested.

use std::sync::Arc;

use image::imageops;
use image::RgbaImage;
use lucent_core::{EdgeInsets, Rect};
use tracing::{debug, trace, warn};

use crate::capture::{expected_pixel_size, CaptureSource};
use crate::stats::{MissReason, SnapshotStats};

/// Scales closer than this are treated as equal
pub const SCALE_EPSILON: f32 = 1e-4;

/// One captured bitmap and where it came from.
///
/// Replaced wholesale on every capture; never mutated in place.
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub bitmap: Arc<RgbaImage>,
    /// Captured region in the outer coordinate space
    pub source_rect: Rect,
    /// Pixels per point of `bitmap`
    pub scale: f32,
    /// Capture time in seconds
    pub timestamp: f64,
}

impl Snapshot {
    pub fn matches_scale(&self, scale: f32) -> bool {
        (self.scale - scale).abs() <= SCALE_EPSILON
    }

    /// Crop `rect` out of the bitmap.
    ///
    /// The rect is mapped into pixel space with the snapshot's own scale,
    /// expanded to whole pixels and clamped to the bitmap. Results under one
    /// pixel in either dimension are rejected.
    pub fn crop(&self, rect: &Rect) -> Option<RgbaImage> {
        let px = rect
            .offset(-self.source_rect.x(), -self.source_rect.y())
            .scaled(self.scale)
            .integral();

        let (bw, bh) = self.bitmap.dimensions();
        let x0 = px.min_x().max(0.0);
        let y0 = px.min_y().max(0.0);
        let x1 = px.max_x().min(bw as f32);
        let y1 = px.max_y().min(bh as f32);
        if x1 - x0 < 1.0 || y1 - y0 < 1.0 {
            return None;
        }

        let (x, y) = (x0 as u32, y0 as u32);
        let (w, h) = ((x1 - x0) as u32, (y1 - y0) as u32);
        Some(imageops::crop_imm(self.bitmap.as_ref(), x, y, w, h).to_image())
    }
}

/// Shared snapshot cache feeding the lens renderer
pub struct SnapshotCache {
    source: Option<Box<dyn CaptureSource>>,
    snapshot: Option<Snapshot>,
    max_snapshot_fps: f32,
    stats: SnapshotStats,
}

impl SnapshotCache {
    /// Create an empty cache. `max_snapshot_fps <= 0` disables rate limiting.
    pub fn new(max_snapshot_fps: f32) -> Self {
        Self {
            source: None,
            snapshot: None,
            max_snapshot_fps,
            stats: SnapshotStats::default(),
        }
    }

    pub fn with_stats(mut self, enabled: bool) -> Self {
        self.stats.set_enabled(enabled);
        self
    }

    pub fn set_capture_source(&mut self, source: Box<dyn CaptureSource>) {
        self.source = Some(source);
    }

    /// Detach the capture source; the cached snapshot is kept
    pub fn clear_capture_source(&mut self) {
        self.source = None;
    }

    pub fn has_capture_source(&self) -> bool {
        self.source.is_some()
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    pub fn stats(&self) -> &SnapshotStats {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut SnapshotStats {
        &mut self.stats
    }

    pub fn max_snapshot_fps(&self) -> f32 {
        self.max_snapshot_fps
    }

    pub fn set_max_snapshot_fps(&mut self, fps: f32) {
        self.max_snapshot_fps = fps;
    }

    /// Drop the cached snapshot so the next query captures again
    pub fn invalidate(&mut self) {
        self.snapshot = None;
    }

    /// Capture the union of `rects` expanded by `margin`, ignoring the rate limit.
    ///
    /// Used before a motion starts so the whole trajectory is covered.
    pub fn prime(&mut self, rects: &[Rect], scale: f32, margin: EdgeInsets, now: f64) -> bool {
        let Some(union) = rects.iter().copied().reduce(|acc, r| acc.union(&r)) else {
            return false;
        };
        if self.source.is_none() || scale <= 0.0 {
            return false;
        }
        let rect = union.outset_by(margin);
        debug!(?rect, scale, count = rects.len(), "snapshot prime");
        self.capture(rect, scale, now)
    }

    /// Crop for one frame, re-capturing when the cache does not cover `rect`.
    ///
    /// Returns `None` when the frame cannot be served; callers skip the
    /// redraw and keep their last texture.
    pub fn cropped_image(
        &mut self,
        rect: Rect,
        scale: f32,
        margin: EdgeInsets,
        now: f64,
    ) -> Option<RgbaImage> {
        self.stats.crop_call();
        self.stats.report_if_due(now);

        if rect.width() <= 1.0 || rect.height() <= 1.0 || self.source.is_none() {
            return None;
        }

        match self.fast_crop(&rect, scale) {
            Ok(image) => return Some(image),
            Err(reason) => {
                trace!(?reason, ?rect, "snapshot miss");
                self.stats.miss(reason);
            }
        }

        if self.snapshot.is_none() || self.can_refresh(now) {
            self.stats.recapture_request();
            let expanded = rect.outset_by(margin);
            let capture_rect = match &self.snapshot {
                Some(s) if s.matches_scale(scale) => s.source_rect.union(&expanded),
                _ => expanded,
            };
            self.capture(capture_rect, scale, now);
        }

        match self.fast_crop(&rect, scale) {
            Ok(image) => Some(image),
            Err(reason) => {
                self.stats.miss(reason);
                None
            }
        }
    }

    /// True when the rate limit allows a new capture at `now`
    pub fn can_refresh(&self, now: f64) -> bool {
        if self.max_snapshot_fps <= 0.0 {
            return true;
        }
        match &self.snapshot {
            None => true,
            Some(s) => now - s.timestamp >= 1.0 / self.max_snapshot_fps as f64,
        }
    }

    fn fast_crop(&self, rect: &Rect, scale: f32) -> Result<RgbaImage, MissReason> {
        let snapshot = self.snapshot.as_ref().ok_or(MissReason::NoSnapshot)?;
        if !snapshot.matches_scale(scale) {
            return Err(MissReason::ScaleMismatch);
        }
        if !snapshot.source_rect.contains_rect(rect) {
            return Err(MissReason::OutsideRect);
        }
        snapshot.crop(rect).ok_or(MissReason::CropFailed)
    }

    fn capture(&mut self, rect: Rect, scale: f32, now: f64) -> bool {
        let Some(source) = self.source.as_mut() else {
            return false;
        };

        let captured = source.capture(rect, scale);
        self.stats.capture_attempt(captured.is_some());
        let Some(bitmap) = captured else {
            debug!(?rect, scale, "snapshot capture failed");
            return false;
        };

        let (ew, eh) = expected_pixel_size(&rect, scale);
        let (bw, bh) = bitmap.dimensions();
        if ew.abs_diff(bw) > 1 || eh.abs_diff(bh) > 1 {
            warn!(
                ?rect,
                scale,
                expected = ?(ew, eh),
                actual = ?(bw, bh),
                "captured bitmap size disagrees with rect"
            );
        }

        debug!(?rect, scale, width = bw, height = bh, "snapshot captured");
        self.snapshot = Some(Snapshot {
            bitmap: Arc::new(bitmap),
            source_rect: rect,
            scale,
            timestamp: now,
        });
        true
    }
}
