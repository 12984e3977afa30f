//! Capture sources
//!
//! A capture source rasterizes a region of the real screen into an RGBA
//! bitmap. Rects are in the host's outer coordinate space (points) and
//! `scale` is pixels per point of the returned bitmap.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use image::imageops::{self, FilterType};
use image::RgbaImage;
use lucent_core::{Point, Rect, Size};
use tracing::{debug, trace};

/// Rasterizes a region of the screen
pub trait CaptureSource {
    /// Capture `rect` at `scale` pixels per point.
    ///
    /// Returns `None` when nothing can be captured (no window attached,
    /// empty rect). The bitmap should be `round(rect.size * scale)` pixels.
    fn capture(&mut self, rect: Rect, scale: f32) -> Option<RgbaImage>;
}

impl<F> CaptureSource for F
where
    F: FnMut(Rect, f32) -> Option<RgbaImage>,
{
    fn capture(&mut self, rect: Rect, scale: f32) -> Option<RgbaImage> {
        self(rect, scale)
    }
}

/// Pixel dimensions a capture of `rect` at `scale` is expected to have
pub fn expected_pixel_size(rect: &Rect, scale: f32) -> (u32, u32) {
    let w = (rect.width() * scale).round().max(0.0) as u32;
    let h = (rect.height() * scale).round().max(0.0) as u32;
    (w, h)
}

/// The host window's rasterizer
pub trait Rasterizer {
    fn rasterize(&mut self, rect: Rect, scale: f32) -> Option<RgbaImage>;
}

/// Visibility controls of the overlay that must not appear in its own capture
pub trait OverlayVisibility {
    fn is_hidden(&self) -> bool;
    fn set_hidden(&mut self, hidden: bool);
    fn alpha(&self) -> f32;
    fn set_alpha(&mut self, alpha: f32);
}

/// Captures through the host rasterizer with the overlay hidden.
///
/// Both handles are non-owning and are only valid while the host keeps the
/// window and overlay attached. They are upgraded on every capture; once
/// either side is gone the source yields `None`.
pub struct HidingCaptureSource {
    rasterizer: Weak<RefCell<dyn Rasterizer>>,
    overlay: Weak<RefCell<dyn OverlayVisibility>>,
}

impl HidingCaptureSource {
    pub fn new(
        rasterizer: Weak<RefCell<dyn Rasterizer>>,
        overlay: Weak<RefCell<dyn OverlayVisibility>>,
    ) -> Self {
        Self {
            rasterizer,
            overlay,
        }
    }
}

impl CaptureSource for HidingCaptureSource {
    fn capture(&mut self, rect: Rect, scale: f32) -> Option<RgbaImage> {
        let rasterizer = self.rasterizer.upgrade()?;
        let overlay = self.overlay.upgrade()?;

        let _guard = HiddenOverlay::hide(overlay);
        let image = rasterizer.borrow_mut().rasterize(rect, scale);
        trace!(?rect, scale, captured = image.is_some(), "hidden capture");
        image
    }
}

/// Restores the overlay's previous visibility when dropped, including
/// during unwinding out of the rasterizer.
struct HiddenOverlay {
    overlay: Rc<RefCell<dyn OverlayVisibility>>,
    was_hidden: bool,
    alpha: f32,
}

impl HiddenOverlay {
    fn hide(overlay: Rc<RefCell<dyn OverlayVisibility>>) -> Self {
        let (was_hidden, alpha) = {
            let mut o = overlay.borrow_mut();
            let saved = (o.is_hidden(), o.alpha());
            o.set_hidden(true);
            o.set_alpha(0.0);
            saved
        };
        Self {
            overlay,
            was_hidden,
            alpha,
        }
    }
}

impl Drop for HiddenOverlay {
    fn drop(&mut self) {
        if let Ok(mut o) = self.overlay.try_borrow_mut() {
            o.set_hidden(self.was_hidden);
            o.set_alpha(self.alpha);
        }
    }
}

/// Software capture source backed by a full-screen RGBA image.
///
/// The image covers `origin .. origin + size / native_scale` in points.
/// Regions outside the screen come back transparent.
pub struct ImageCaptureSource {
    screen: RgbaImage,
    native_scale: f32,
    origin: Point,
}

impl ImageCaptureSource {
    pub fn new(screen: RgbaImage, native_scale: f32) -> Self {
        Self {
            screen,
            native_scale: native_scale.max(f32::EPSILON),
            origin: Point::ZERO,
        }
    }

    pub fn with_origin(mut self, origin: Point) -> Self {
        self.origin = origin;
        self
    }

    /// Swap in a new screen image, e.g. after the host redraws
    pub fn set_screen(&mut self, screen: RgbaImage) {
        self.screen = screen;
    }

    pub fn screen(&self) -> &RgbaImage {
        &self.screen
    }

    /// Screen bounds in points
    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(
            self.origin,
            Size::new(
                self.screen.width() as f32 / self.native_scale,
                self.screen.height() as f32 / self.native_scale,
            ),
        )
    }
}

impl CaptureSource for ImageCaptureSource {
    fn capture(&mut self, rect: Rect, scale: f32) -> Option<RgbaImage> {
        if scale <= 0.0 {
            return None;
        }
        let (out_w, out_h) = expected_pixel_size(&rect, scale);
        if out_w == 0 || out_h == 0 {
            return None;
        }

        let mut out = RgbaImage::new(out_w, out_h);
        let Some(visible) = rect.intersection(&self.bounds()) else {
            debug!(?rect, "capture outside screen bounds");
            return Some(out);
        };

        // Source pixels on the screen image
        let src = visible
            .offset(-self.origin.x, -self.origin.y)
            .scaled(self.native_scale)
            .integral();
        let sx = src.min_x().max(0.0) as u32;
        let sy = src.min_y().max(0.0) as u32;
        let sw = (src.max_x() as u32).min(self.screen.width()).saturating_sub(sx);
        let sh = (src.max_y() as u32).min(self.screen.height()).saturating_sub(sy);
        if sw == 0 || sh == 0 {
            return Some(out);
        }

        // Destination pixels in the output bitmap
        let dx = ((visible.min_x() - rect.min_x()) * scale).round() as i64;
        let dy = ((visible.min_y() - rect.min_y()) * scale).round() as i64;
        let dw = ((visible.width() * scale).round() as u32).clamp(1, out_w);
        let dh = ((visible.height() * scale).round() as u32).clamp(1, out_h);

        let region = imageops::crop_imm(&self.screen, sx, sy, sw, sh).to_image();
        let region = if (sw, sh) == (dw, dh) {
            region
        } else {
            imageops::resize(&region, dw, dh, FilterType::Triangle)
        };
        imageops::replace(&mut out, &region, dx, dy);
        Some(out)
    }
}
