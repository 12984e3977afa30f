//! GPU textures for the lens background and output
//!
//! The background is re-uploaded every frame the lens moves, so the texture is
//! reused while the crop size stays the same and only recreated on resize.

use image::RgbaImage;
use wgpu::util::DeviceExt;

/// Format of the uploaded background bitmap
pub const BACKGROUND_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// A sampled RGBA texture holding the current background crop
pub struct BackgroundTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl BackgroundTexture {
    /// Create a texture initialised with `image`
    pub fn from_image(device: &wgpu::Device, queue: &wgpu::Queue, image: &RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some("Lens Background"),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: BACKGROUND_FORMAT,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            image.as_raw(),
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            texture,
            view,
            width,
            height,
        }
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Overwrite the whole texture. The image must match the texture size.
    pub fn write(&self, queue: &wgpu::Queue, image: &RgbaImage) -> bool {
        if image.dimensions() != (self.width, self.height) {
            return false;
        }
        let Some(layout) = packed_layout(image) else {
            return false;
        };

        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            image.as_raw(),
            layout,
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
        true
    }
}

/// Tightly packed layout of an RGBA image. `Queue::write_texture` has no row
/// alignment requirement, so rows are uploaded as stored.
fn packed_layout(image: &RgbaImage) -> Option<wgpu::ImageDataLayout> {
    let (width, height) = image.dimensions();
    let row_bytes = width.checked_mul(4)?;
    let required_len = (row_bytes as usize).checked_mul(height as usize)?;
    if image.as_raw().len() < required_len {
        return None;
    }
    Some(wgpu::ImageDataLayout {
        offset: 0,
        bytes_per_row: Some(row_bytes),
        rows_per_image: Some(height),
    })
}

/// Offscreen render target the lens is drawn into
pub struct OutputTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    size: (u32, u32),
}

impl OutputTarget {
    pub fn new(device: &wgpu::Device, size: (u32, u32), format: wgpu::TextureFormat) -> Self {
        let max_dim = device.limits().max_texture_dimension_2d;
        let size = (size.0.clamp(1, max_dim), size.1.clamp(1, max_dim));
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Lens Output"),
            size: wgpu::Extent3d {
                width: size.0,
                height: size.1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            size,
        }
    }

    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }
}
