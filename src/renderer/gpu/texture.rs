//! Offscreen render target sampled by the globe.

use super::context::GpuContext;

/// Format of the globe surface canvas.
pub const SURFACE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// A texture that is rendered into and then sampled.
pub struct SurfaceTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub width: u32,
    pub height: u32,
}

impl SurfaceTexture {
    pub fn new(ctx: &GpuContext, width: u32, height: u32) -> Self {
        // Stay inside device limits on small adapters.
        let max = ctx.device.limits().max_texture_dimension_2d;
        let width = width.clamp(1, max);
        let height = height.clamp(1, max);

        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Globe Surface Texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: SURFACE_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        // Wraps in longitude, clamps at the poles.
        let sampler = ctx.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Globe Surface Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        tracing::debug!("Created globe surface texture {}x{}", width, height);
        Self {
            texture,
            view,
            sampler,
            width,
            height,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
