//! wgpu lens renderer
//!
//! Draws the lens into an offscreen target (or any caller-provided view).
//! Submission is fire-and-forget: `draw` enqueues one command buffer and
//! returns without waiting for the GPU.

use std::sync::Arc;

use image::RgbaImage;
use thiserror::Error;
use tracing::{debug, info, trace};

use crate::params::{LensUniforms, RenderParameters};
use crate::shader::{validate_lens_shader, LENS_SHADER};
use crate::texture::{BackgroundTexture, OutputTarget};

/// Renderer initialisation failures.
///
/// All of these are startup preconditions; none occur while drawing.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("No suitable GPU adapter found")]
    AdapterNotFound,
    #[error("Failed to request GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("Failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("Shader compilation error: {0}")]
    ShaderError(String),
}

/// Anything that can turn a background bitmap plus parameters into a lens frame
pub trait LensSurface {
    /// Replace the background the next draw samples from
    fn update_background(&mut self, background: &RgbaImage);

    /// Render one frame. Returns `false` without drawing when no background
    /// has been supplied yet.
    fn draw(&mut self, params: &RenderParameters) -> bool;
}

/// Renderer configuration
#[derive(Clone, Debug)]
pub struct RendererConfig {
    /// Output target format
    pub texture_format: wgpu::TextureFormat,
    /// Upper bound for either output dimension
    pub max_output_dimension: u32,
    pub power_preference: wgpu::PowerPreference,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            texture_format: wgpu::TextureFormat::Rgba8UnormSrgb,
            max_output_dimension: 4096,
            power_preference: wgpu::PowerPreference::LowPower,
        }
    }
}

fn env_u32(name: &str) -> Option<u32> {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u32>().ok())
}

impl RendererConfig {
    /// Apply `LUCENT_MAX_OUTPUT_DIM` if set
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(dim) = env_u32("LUCENT_MAX_OUTPUT_DIM") {
            info!(dim, "lens renderer max output dimension override");
            self.max_output_dimension = dim.max(1);
        }
        self
    }
}

/// GPU lens renderer
pub struct LensRenderer {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: RendererConfig,
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    uniforms: wgpu::Buffer,
    background: Option<BackgroundTexture>,
    bind_group: Option<wgpu::BindGroup>,
    output: Option<OutputTarget>,
    dirty: bool,
}

impl LensRenderer {
    fn preferred_backends() -> wgpu::Backends {
        #[cfg(target_os = "macos")]
        {
            wgpu::Backends::METAL
        }
        #[cfg(target_os = "windows")]
        {
            wgpu::Backends::DX12
        }
        #[cfg(not(any(target_os = "macos", target_os = "windows")))]
        {
            wgpu::Backends::PRIMARY
        }
    }

    /// Create a renderer on its own device without a surface
    pub async fn headless(config: RendererConfig) -> Result<Self, RendererError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: Self::preferred_backends(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: config.power_preference,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RendererError::AdapterNotFound)?;

        let (device, queue) = Self::request_device(&adapter).await?;
        Self::from_device(Arc::new(device), Arc::new(queue), config)
    }

    /// Create a renderer together with a surface for `window`
    pub async fn with_surface<W>(
        window: Arc<W>,
        config: RendererConfig,
    ) -> Result<(Self, wgpu::Surface<'static>), RendererError>
    where
        W: raw_window_handle::HasWindowHandle
            + raw_window_handle::HasDisplayHandle
            + Send
            + Sync
            + 'static,
    {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: Self::preferred_backends(),
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: config.power_preference,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RendererError::AdapterNotFound)?;

        let caps = surface.get_capabilities(&adapter);
        debug!(formats = ?caps.formats, "surface capabilities");
        let mut config = config;
        if let Some(format) = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first())
        {
            config.texture_format = *format;
        }

        let (device, queue) = Self::request_device(&adapter).await?;
        let renderer = Self::from_device(Arc::new(device), Arc::new(queue), config)?;
        Ok((renderer, surface))
    }

    async fn request_device(
        adapter: &wgpu::Adapter,
    ) -> Result<(wgpu::Device, wgpu::Queue), RendererError> {
        let info = adapter.get_info();
        info!(adapter = %info.name, backend = ?info.backend, "lens renderer adapter");

        let device = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Lucent GPU Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_defaults()
                        .using_resolution(adapter.limits()),
                    memory_hints: wgpu::MemoryHints::MemoryUsage,
                },
                None,
            )
            .await?;
        Ok(device)
    }

    /// Create a renderer on an existing device shared with the host
    pub fn from_device(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        config: RendererConfig,
    ) -> Result<Self, RendererError> {
        let config = config.with_env_overrides();
        validate_lens_shader().map_err(RendererError::ShaderError)?;

        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Lens Shader"),
            source: wgpu::ShaderSource::Wgsl(LENS_SHADER.into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Lens Bind Group Layout"),
            entries: &[
                // Uniforms
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // Background texture
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                // Background sampler
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Lens Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let blend = wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                operation: wgpu::BlendOperation::Add,
            },
        };

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Lens Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.texture_format,
                    blend: Some(blend),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(RendererError::ShaderError(error.to_string()));
        }

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Lens Background Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let uniforms = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Lens Uniforms Buffer"),
            size: std::mem::size_of::<LensUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        info!(format = ?config.texture_format, "lens renderer created");

        Ok(Self {
            device,
            queue,
            config,
            pipeline,
            bind_group_layout,
            sampler,
            uniforms,
            background: None,
            bind_group: None,
            output: None,
            dirty: false,
        })
    }

    pub fn device(&self) -> &Arc<wgpu::Device> {
        &self.device
    }

    pub fn queue(&self) -> &Arc<wgpu::Queue> {
        &self.queue
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn has_background(&self) -> bool {
        self.background.is_some()
    }

    /// Return and clear the "new frame available" flag
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// View of the offscreen target, once something has been drawn
    pub fn output_view(&self) -> Option<&wgpu::TextureView> {
        self.output.as_ref().map(|o| o.view())
    }

    pub fn output_texture(&self) -> Option<&wgpu::Texture> {
        self.output.as_ref().map(|o| o.texture())
    }

    /// Draw into a caller-owned view of `config.texture_format`, e.g. a surface frame
    pub fn draw_to_view(&mut self, view: &wgpu::TextureView, params: &RenderParameters) -> bool {
        let Some(background) = &self.background else {
            return false;
        };
        let uniforms = LensUniforms::from_parameters(params, background.dimensions());
        self.encode(view, &uniforms);
        true
    }

    fn ensure_output(&mut self, size: (u32, u32)) {
        let max = self.config.max_output_dimension;
        let size = (size.0.clamp(1, max), size.1.clamp(1, max));
        if self.output.as_ref().map(|o| o.size()) != Some(size) {
            debug!(?size, "lens output target resized");
            self.output = Some(OutputTarget::new(
                &self.device,
                size,
                self.config.texture_format,
            ));
        }
    }

    fn encode(&self, view: &wgpu::TextureView, uniforms: &LensUniforms) {
        let Some(bind_group) = &self.bind_group else {
            return;
        };
        self.queue
            .write_buffer(&self.uniforms, 0, bytemuck::bytes_of(uniforms));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Lens Encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Lens Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, bind_group, &[]);
            pass.draw(0..6, 0..1);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }
}

impl LensSurface for LensRenderer {
    fn update_background(&mut self, background: &RgbaImage) {
        let (w, h) = background.dimensions();
        if w == 0 || h == 0 {
            return;
        }

        let reused = self
            .background
            .as_ref()
            .filter(|bg| bg.dimensions() == (w, h))
            .map(|bg| bg.write(&self.queue, background))
            .unwrap_or(false);
        if reused {
            return;
        }

        trace!(width = w, height = h, "lens background texture created");
        let texture = BackgroundTexture::from_image(&self.device, &self.queue, background);
        self.bind_group = Some(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Lens Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.uniforms.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(texture.view()),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        }));
        self.background = Some(texture);
    }

    fn draw(&mut self, params: &RenderParameters) -> bool {
        let Some(background) = &self.background else {
            return false;
        };
        let uniforms = LensUniforms::from_parameters(params, background.dimensions());

        self.ensure_output(params.clamped().output_size);
        let Some(output) = &self.output else {
            return false;
        };
        self.encode(output.view(), &uniforms);
        self.dirty = true;
        true
    }
}
