//! Glass overlay: snapshot crop plus GPU draw for one lens frame

use lucent_core::{EdgeInsets, Rect};
use lucent_gpu::{LensSurface, RenderParameters, ShapeKind};
use lucent_snapshot::SnapshotCache;
use tracing::trace;

use crate::config::{LensConfig, LensShape, RenderConfig};

/// Skip rendering below this overlay alpha
pub const MIN_VISIBLE_ALPHA: f32 = 0.001;

/// Binds a snapshot cache to a lens surface.
///
/// The controller hands it the lens frame each tick; the overlay crops the
/// background under that frame and draws the refracted result.
pub struct LensOverlay {
    cache: SnapshotCache,
    surface: Box<dyn LensSurface>,
    render: RenderConfig,
    screen_scale: f32,
    margin: EdgeInsets,
    frames_drawn: u64,
}

impl LensOverlay {
    pub fn new(cache: SnapshotCache, surface: Box<dyn LensSurface>, config: &LensConfig, screen_scale: f32) -> Self {
        Self {
            cache,
            surface,
            render: config.render.clone(),
            screen_scale,
            margin: config.snapshot.margin,
            frames_drawn: 0,
        }
    }

    /// Overlay with a fresh cache built from the snapshot section
    pub fn from_config(surface: Box<dyn LensSurface>, config: &LensConfig, screen_scale: f32) -> Self {
        let cache = SnapshotCache::new(config.snapshot.max_fps).with_stats(config.snapshot.stats_enabled);
        Self::new(cache, surface, config, screen_scale)
    }

    pub fn cache(&self) -> &SnapshotCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut SnapshotCache {
        &mut self.cache
    }

    pub fn screen_scale(&self) -> f32 {
        self.screen_scale
    }

    pub fn set_screen_scale(&mut self, screen_scale: f32) {
        self.screen_scale = screen_scale;
    }

    pub fn margin(&self) -> EdgeInsets {
        self.margin
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    /// Pixels per point of the captured background
    pub fn capture_scale(&self) -> f32 {
        self.screen_scale * self.render.downscale
    }

    /// Capture `rects` ahead of a motion so per-frame crops stay on the fast path
    pub fn prime(&mut self, rects: &[Rect], now: f64) -> bool {
        let scale = self.capture_scale();
        self.cache.prime(rects, scale, self.margin, now)
    }

    /// Draw the lens at `frame`. Returns whether a frame was submitted.
    pub fn render(&mut self, frame: Rect, alpha: f32, brightness: f32, now: f64) -> bool {
        if alpha <= MIN_VISIBLE_ALPHA || frame.is_empty() {
            return false;
        }
        let scale = self.capture_scale();
        let Some(background) = self.cache.cropped_image(frame, scale, self.margin, now) else {
            trace!(?frame, "lens frame skipped, no background");
            return false;
        };
        self.surface.update_background(&background);

        let params = self.parameters(frame, alpha, brightness);
        let drawn = self.surface.draw(&params);
        if drawn {
            self.frames_drawn += 1;
        }
        drawn
    }

    fn parameters(&self, frame: Rect, alpha: f32, brightness: f32) -> RenderParameters {
        let output = (
            (frame.width() * self.screen_scale).round().max(1.0) as u32,
            (frame.height() * self.screen_scale).round().max(1.0) as u32,
        );
        let shape = match self.render.shape {
            LensShape::Capsule => ShapeKind::RoundedRect {
                corner_radius: (frame.height() * 0.5 + self.render.corner_radius_extra) * self.capture_scale(),
            },
            LensShape::Circle => ShapeKind::Circle,
        };
        RenderParameters {
            output_size: output,
            shape,
            refraction: self.render.refraction,
            chroma: self.render.chroma,
            rim_thickness: self.render.rim_thickness,
            rim_strength: self.render.rim_strength,
            alpha,
            brightness_boost: brightness,
            downscale: self.render.downscale,
            edge_start: self.render.edge_start,
            edge_exponent: self.render.edge_exponent,
        }
        .clamped()
    }
}
