//! Per-frame lens parameters and their GPU uniform layout

use bytemuck::{Pod, Zeroable};

/// Lens silhouette
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ShapeKind {
    /// Circle inscribed in the background bitmap
    Circle,
    /// Rounded rect filling the bitmap; radius in bitmap pixels
    RoundedRect { corner_radius: f32 },
}

impl ShapeKind {
    fn shape_type(&self) -> u32 {
        match self {
            ShapeKind::Circle => 0,
            ShapeKind::RoundedRect { .. } => 1,
        }
    }

    fn corner_radius(&self) -> f32 {
        match self {
            ShapeKind::Circle => 0.0,
            ShapeKind::RoundedRect { corner_radius } => *corner_radius,
        }
    }
}

/// Everything the fragment stage needs for one frame.
///
/// Shape and rim sizes are in pixels of the background bitmap, not display
/// points, so the same parameters stay correct at any downscale factor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderParameters {
    /// Output target size in pixels
    pub output_size: (u32, u32),
    pub shape: ShapeKind,
    /// Peak refraction offset as a fraction of the shape radius
    pub refraction: f32,
    /// Red/blue split relative to the green offset at the rim
    pub chroma: f32,
    pub rim_thickness: f32,
    pub rim_strength: f32,
    /// Overall overlay opacity
    pub alpha: f32,
    pub brightness_boost: f32,
    /// Capture resolution relative to the display
    pub downscale: f32,
    /// Normalised radius where refraction starts rising
    pub edge_start: f32,
    /// Sharpness of the rise toward the rim
    pub edge_exponent: f32,
}

impl Default for RenderParameters {
    fn default() -> Self {
        Self {
            output_size: (1, 1),
            shape: ShapeKind::RoundedRect {
                corner_radius: 0.0,
            },
            refraction: 0.12,
            chroma: 0.10,
            rim_thickness: 1.5,
            rim_strength: 0.9,
            alpha: 1.0,
            brightness_boost: 0.0,
            downscale: 0.6,
            edge_start: 0.45,
            edge_exponent: 6.0,
        }
    }
}

impl RenderParameters {
    pub const MAX_BRIGHTNESS_BOOST: f32 = 0.3;
    pub const MAX_RIM_THICKNESS: f32 = 32.0;
    pub const MAX_RIM_STRENGTH: f32 = 2.0;

    /// Copy with every field clamped to the range the shader assumes.
    ///
    /// NaN inputs collapse to the lower bound.
    pub fn clamped(&self) -> Self {
        let shape = match self.shape {
            ShapeKind::Circle => ShapeKind::Circle,
            ShapeKind::RoundedRect { corner_radius } => ShapeKind::RoundedRect {
                corner_radius: clamp(corner_radius, 0.0, f32::MAX),
            },
        };
        Self {
            output_size: (self.output_size.0.max(1), self.output_size.1.max(1)),
            shape,
            refraction: clamp(self.refraction, 0.0, 1.0),
            chroma: clamp(self.chroma, 0.0, 1.0),
            rim_thickness: clamp(self.rim_thickness, 0.0, Self::MAX_RIM_THICKNESS),
            rim_strength: clamp(self.rim_strength, 0.0, Self::MAX_RIM_STRENGTH),
            alpha: clamp(self.alpha, 0.0, 1.0),
            brightness_boost: clamp(self.brightness_boost, 0.0, Self::MAX_BRIGHTNESS_BOOST),
            downscale: clamp(self.downscale, 0.05, 1.0),
            edge_start: clamp(self.edge_start, 0.0, 0.99),
            edge_exponent: clamp(self.edge_exponent, 0.5, 16.0),
        }
    }
}

fn clamp(value: f32, min: f32, max: f32) -> f32 {
    if value.is_nan() {
        return min;
    }
    value.max(min).min(max)
}

/// Uniform block for the lens shader
///
/// Memory layout (64 bytes, matches `LensUniforms` in the WGSL):
/// - size: vec2<f32>          (8 bytes)  - background size in pixels
/// - center: vec2<f32>        (8 bytes)  - shape centre in UV space
/// - refraction: f32          (4 bytes)
/// - chroma: f32              (4 bytes)
/// - rim_thickness: f32       (4 bytes)
/// - rim_strength: f32        (4 bytes)
/// - alpha: f32               (4 bytes)
/// - brightness_boost: f32    (4 bytes)
/// - shape_type: u32          (4 bytes)  - 0 circle, 1 rounded rect
/// - corner_radius: f32       (4 bytes)
/// - edge_start: f32          (4 bytes)
/// - edge_exponent: f32       (4 bytes)
/// - _pad: vec2<f32>          (8 bytes)
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct LensUniforms {
    pub size: [f32; 2],
    pub center: [f32; 2],
    pub refraction: f32,
    pub chroma: f32,
    pub rim_thickness: f32,
    pub rim_strength: f32,
    pub alpha: f32,
    pub brightness_boost: f32,
    pub shape_type: u32,
    pub corner_radius: f32,
    pub edge_start: f32,
    pub edge_exponent: f32,
    pub _pad: [f32; 2],
}

impl LensUniforms {
    /// Build uniforms for a background of `background_size` pixels.
    ///
    /// Parameters are clamped first so the shader never sees out-of-range values.
    pub fn from_parameters(params: &RenderParameters, background_size: (u32, u32)) -> Self {
        let p = params.clamped();
        Self {
            size: [background_size.0.max(1) as f32, background_size.1.max(1) as f32],
            center: [0.5, 0.5],
            refraction: p.refraction,
            chroma: p.chroma,
            rim_thickness: p.rim_thickness,
            rim_strength: p.rim_strength,
            alpha: p.alpha,
            brightness_boost: p.brightness_boost,
            shape_type: p.shape.shape_type(),
            corner_radius: p.shape.corner_radius(),
            edge_start: p.edge_start,
            edge_exponent: p.edge_exponent,
            _pad: [0.0; 2],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniforms_are_64_bytes() {
        assert_eq!(std::mem::size_of::<LensUniforms>(), 64);
    }

    #[test]
    fn clamped_bounds_every_field() {
        let wild = RenderParameters {
            output_size: (0, 0),
            shape: ShapeKind::RoundedRect {
                corner_radius: -4.0,
            },
            refraction: 3.0,
            chroma: -1.0,
            rim_thickness: 100.0,
            rim_strength: f32::NAN,
            alpha: 1.5,
            brightness_boost: 0.9,
            downscale: 0.0,
            edge_start: 1.2,
            edge_exponent: 0.0,
        };
        let p = wild.clamped();
        assert_eq!(p.output_size, (1, 1));
        assert_eq!(p.shape, ShapeKind::RoundedRect { corner_radius: 0.0 });
        assert_eq!(p.refraction, 1.0);
        assert_eq!(p.chroma, 0.0);
        assert_eq!(p.rim_thickness, RenderParameters::MAX_RIM_THICKNESS);
        assert_eq!(p.rim_strength, 0.0);
        assert_eq!(p.alpha, 1.0);
        assert_eq!(p.brightness_boost, 0.3);
        assert_eq!(p.downscale, 0.05);
        assert_eq!(p.edge_start, 0.99);
        assert_eq!(p.edge_exponent, 0.5);
    }

    #[test]
    fn uniforms_carry_shape_and_size() {
        let params = RenderParameters {
            shape: ShapeKind::RoundedRect {
                corner_radius: 27.5,
            },
            alpha: 0.4,
            ..Default::default()
        };
        let u = LensUniforms::from_parameters(&params, (120, 44));
        assert_eq!(u.size, [120.0, 44.0]);
        assert_eq!(u.center, [0.5, 0.5]);
        assert_eq!(u.shape_type, 1);
        assert_eq!(u.corner_radius, 27.5);
        assert_eq!(u.alpha, 0.4);

        let circle = LensUniforms::from_parameters(
            &RenderParameters {
                shape: ShapeKind::Circle,
                ..params
            },
            (64, 64),
        );
        assert_eq!(circle.shape_type, 0);
        assert_eq!(circle.corner_radius, 0.0);
    }
}
