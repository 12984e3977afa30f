//! Lucent GPU Renderer
//!
//! wgpu pipeline that refracts a background bitmap through a glass lens:
//! edge-weighted refraction, chromatic fringing at the rim, a soft rim
//! highlight and a thin border, masked to a circle or rounded rect.
//!
//! # Example
//!
//! ```rust,no_run
//! use image::RgbaImage;
//! use lucent_gpu::{LensRenderer, LensSurface, RenderParameters, RendererConfig, ShapeKind};
//!
//! let mut renderer = pollster::block_on(LensRenderer::headless(RendererConfig::default()))?;
//! renderer.update_background(&RgbaImage::new(132, 66));
//! renderer.draw(&RenderParameters {
//!     output_size: (240, 120),
//!     shape: ShapeKind::RoundedRect { corner_radius: 33.0 },
//!     ..Default::default()
//! });
//! assert!(renderer.take_dirty());
//! # Ok::<(), lucent_gpu::RendererError>(())
//! ```

pub mod params;
pub mod renderer;
pub mod shader;
pub mod texture;

pub use params::{LensUniforms, RenderParameters, ShapeKind};
pub use renderer::{LensRenderer, LensSurface, RendererConfig, RendererError};
pub use shader::{validate_lens_shader, LENS_SHADER};
pub use texture::{BackgroundTexture, OutputTarget, BACKGROUND_FORMAT};
