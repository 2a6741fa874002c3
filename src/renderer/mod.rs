//! wgpu backend for the map engine.
//!
//! The renderer only reads finished [`FrameOutput`]s and the path cache they
//! reference; it never touches world or interaction state. Flat frames are
//! tessellated straight to the window. Globe frames rasterize the map surface
//! into an offscreen texture, then draw stars, the atmosphere shell, the
//! textured sphere and the screen overlay. Labels from the screen list are
//! painted last by [`text::TextOverlay`].

pub mod globe_mesh;
pub mod gpu;
pub mod starfield;
pub mod text;

use glam::Vec2;
use std::sync::Arc;
use winit::window::Window;

use crate::core::config::GlobeConfig;
use crate::core::error::{EngineError, Result};
use crate::engine::{FrameOutput, GlobeScene};
use crate::render::{tessellate, PathCache, RenderMetrics};
use text::TextOverlay;
use crate::theme::Color;
use gpu::{
    static_vertices, DynamicBuffer, FillPipeline, GlobePipelines, GlobeUniform, GpuContext, MeshBuffers, SurfaceTexture,
    SURFACE_FORMAT,
};

const SPHERE_STACKS: u32 = 64;
const SPHERE_SLICES: u32 = 128;
const INITIAL_VERTEX_BYTES: u64 = 256 * 1024;

/// Palette colors are sRGB; clear values are written as linear.
fn clear_color(color: Color) -> wgpu::Color {
    let linear = |c: f32| (c.max(0.0) as f64).powf(2.2);
    wgpu::Color {
        r: linear(color.r),
        g: linear(color.g),
        b: linear(color.b),
        a: color.a as f64,
    }
}

fn globe_uniform(scene: &GlobeScene) -> GlobeUniform {
    GlobeUniform {
        view_proj: scene.view_proj.to_cols_array_2d(),
        eye: scene.eye.extend(1.0).to_array(),
        atmosphere: scene.atmosphere.to_array(),
        star: scene.star.to_array(),
    }
}

fn draw_colored<'a>(
    pass: &mut wgpu::RenderPass<'a>,
    pipeline: &'a FillPipeline,
    buffer: &'a DynamicBuffer,
    metrics: &mut RenderMetrics,
) {
    if buffer.is_empty() {
        return;
    }
    pass.set_pipeline(&pipeline.render_pipeline);
    pass.set_bind_group(0, &pipeline.viewport_bind_group, &[]);
    pass.set_vertex_buffer(0, buffer.buffer.slice(..));
    pass.draw(0..buffer.len, 0..1);
    metrics.record_draw_call(buffer.len as usize);
}

/// Main renderer struct. Dropping it releases every GPU resource.
pub struct MapRenderer {
    ctx: GpuContext,
    screen_pipeline: FillPipeline,
    surface_pipeline: FillPipeline,
    globe_pipelines: GlobePipelines,

    screen_vertices: DynamicBuffer,
    surface_vertices: DynamicBuffer,
    overlay_vertices: DynamicBuffer,

    sphere: MeshBuffers,
    stars: wgpu::Buffer,
    star_count: u32,
    surface_texture: SurfaceTexture,
    surface_bind_group: wgpu::BindGroup,

    labels: TextOverlay,
    metrics: RenderMetrics,
}

impl MapRenderer {
    /// Create a new renderer for the given window.
    pub async fn new(window: Arc<Window>, globe: &GlobeConfig) -> Result<Self> {
        let ctx = GpuContext::new(window.clone()).await?;
        let labels = TextOverlay::new(window, &ctx.device, ctx.format());
        let screen_pipeline = FillPipeline::new(&ctx, ctx.format(), "Screen Fill Pipeline");
        let surface_pipeline = FillPipeline::new(&ctx, SURFACE_FORMAT, "Surface Fill Pipeline");
        let globe_pipelines = GlobePipelines::new(&ctx);

        let (sphere_vertices, sphere_indices) = globe_mesh::uv_sphere(SPHERE_STACKS, SPHERE_SLICES);
        let sphere = MeshBuffers::new(&ctx, "Sphere", &sphere_vertices, &sphere_indices);
        let star_points = starfield::generate_stars(globe.star_count.max(1), globe.star_seed);
        let stars = static_vertices(&ctx, "Star Buffer", &star_points);

        let surface_texture = SurfaceTexture::new(&ctx, globe.texture_width, globe.texture_height);
        let surface_bind_group = globe_pipelines.texture_bind_group(&ctx, &surface_texture);

        tracing::info!(
            "Renderer ready: sphere {} indices, {} stars, surface {}x{}",
            sphere.index_count,
            star_points.len(),
            surface_texture.width,
            surface_texture.height
        );

        Ok(Self {
            screen_vertices: DynamicBuffer::new(&ctx, "Screen Vertex Buffer", INITIAL_VERTEX_BYTES),
            surface_vertices: DynamicBuffer::new(&ctx, "Surface Vertex Buffer", INITIAL_VERTEX_BYTES),
            overlay_vertices: DynamicBuffer::new(&ctx, "Overlay Vertex Buffer", INITIAL_VERTEX_BYTES / 4),
            star_count: star_points.len() as u32,
            ctx,
            screen_pipeline,
            surface_pipeline,
            globe_pipelines,
            sphere,
            stars,
            surface_texture,
            surface_bind_group,
            labels,
            metrics: RenderMetrics::new(),
        })
    }

    /// Handle window resize.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.ctx.resize(width, height);
    }

    /// Get current surface size.
    pub fn size(&self) -> (u32, u32) {
        self.ctx.size()
    }

    /// GPU-side counters of the last submitted frame.
    pub fn metrics(&self) -> &RenderMetrics {
        &self.metrics
    }

    /// Draw one frame. A lost or outdated surface is reconfigured and the
    /// frame skipped.
    pub fn render(&mut self, output: &FrameOutput, cache: &PathCache) -> Result<()> {
        self.metrics.begin_submit();
        let (width, height) = self.ctx.size();
        let screen = Vec2::new(width as f32, height as f32);
        self.screen_pipeline.update_viewport(&self.ctx.queue, screen.x, screen.y);

        // Upload everything before acquiring the swapchain image.
        let (screen_clear, surface_clear, texts) = match &output.globe {
            None => {
                let tess = tessellate(&output.surface, cache, screen);
                self.screen_vertices.upload(&self.ctx, &tess.vertices);
                self.metrics.record_buffer_upload();
                (tess.clear.unwrap_or(Color::BLACK), Color::BLACK, tess.texts)
            }
            Some(scene) => {
                let size = scene.surface_size;
                let surface = tessellate(&output.surface, cache, size);
                self.surface_pipeline.update_viewport(&self.ctx.queue, size.x, size.y);
                self.surface_vertices.upload(&self.ctx, &surface.vertices);
                self.metrics.record_buffer_upload();

                let overlay = tessellate(&output.overlay, cache, screen);
                self.overlay_vertices.upload(&self.ctx, &overlay.vertices);
                self.metrics.record_buffer_upload();

                self.globe_pipelines.update_uniform(&self.ctx.queue, &globe_uniform(scene));
                (scene.space, surface.clear.unwrap_or(Color::BLACK), overlay.texts)
            }
        };

        let frame = match self.ctx.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                tracing::debug!("Surface lost or outdated, reconfiguring");
                self.ctx.reconfigure();
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                tracing::warn!("Surface acquire timed out, skipping frame");
                return Ok(());
            }
            Err(e) => return Err(EngineError::Gpu(format!("failed to acquire frame: {}", e))),
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        if output.globe.is_some() {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Globe Surface Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.surface_texture.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_color(surface_clear)),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            draw_colored(&mut pass, &self.surface_pipeline, &self.surface_vertices, &mut self.metrics);
        }

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_color(screen_clear)),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            match output.globe {
                None => {
                    draw_colored(&mut pass, &self.screen_pipeline, &self.screen_vertices, &mut self.metrics);
                }
                Some(_) => {
                    let globe = &self.globe_pipelines;

                    pass.set_pipeline(&globe.stars);
                    pass.set_bind_group(0, &globe.uniform_bind_group, &[]);
                    pass.set_vertex_buffer(0, self.stars.slice(..));
                    pass.draw(0..self.star_count, 0..1);
                    self.metrics.record_draw_call(self.star_count as usize);

                    pass.set_vertex_buffer(0, self.sphere.vertex_buffer.slice(..));
                    pass.set_index_buffer(self.sphere.index_buffer.slice(..), wgpu::IndexFormat::Uint32);

                    pass.set_pipeline(&globe.atmosphere);
                    pass.set_bind_group(0, &globe.uniform_bind_group, &[]);
                    pass.draw_indexed(0..self.sphere.index_count, 0, 0..1);
                    self.metrics.record_draw_call(self.sphere.index_count as usize);

                    pass.set_pipeline(&globe.sphere);
                    pass.set_bind_group(0, &globe.uniform_bind_group, &[]);
                    pass.set_bind_group(1, &self.surface_bind_group, &[]);
                    pass.draw_indexed(0..self.sphere.index_count, 0, 0..1);
                    self.metrics.record_draw_call(self.sphere.index_count as usize);

                    draw_colored(&mut pass, &self.screen_pipeline, &self.overlay_vertices, &mut self.metrics);
                }
            }
        }

        self.labels.draw(
            &self.ctx.device,
            &self.ctx.queue,
            &mut encoder,
            &view,
            [width, height],
            &texts,
            &mut self.metrics,
        );

        self.ctx.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}
