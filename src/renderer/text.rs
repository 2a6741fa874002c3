//! Label glyphs through egui.
//!
//! Labels arrive as [`TextItem`]s in target pixels. Each frame they are laid
//! out on the egui background layer and painted over the finished map in a
//! load pass, so nothing underneath is cleared.

use egui_wgpu::ScreenDescriptor;
use egui_winit::State as EguiWinitState;
use std::sync::Arc;
use winit::window::Window;

use crate::render::{RenderMetrics, TextItem};
use crate::theme::Color;

/// Drop shadow offset in points, so labels stay legible over bright fills.
const SHADOW_OFFSET: egui::Vec2 = egui::vec2(1.0, 1.0);
const SHADOW_ALPHA: f32 = 0.6;

fn color32(color: Color) -> egui::Color32 {
    let byte = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    egui::Color32::from_rgba_unmultiplied(byte(color.r), byte(color.g), byte(color.b), byte(color.a))
}

pub struct TextOverlay {
    window: Arc<Window>,
    ctx: egui::Context,
    state: EguiWinitState,
    renderer: egui_wgpu::Renderer,
}

impl TextOverlay {
    pub fn new(window: Arc<Window>, device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        let ctx = egui::Context::default();
        let state = EguiWinitState::new(ctx.clone(), egui::ViewportId::ROOT, &window, None, None);
        let renderer = egui_wgpu::Renderer::new(device, format, None, 1);
        Self {
            window,
            ctx,
            state,
            renderer,
        }
    }

    /// Lay out `texts` and paint them onto `view`.
    #[allow(clippy::too_many_arguments)]
    pub fn draw(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        size_in_pixels: [u32; 2],
        texts: &[TextItem],
        metrics: &mut RenderMetrics,
    ) {
        if texts.is_empty() {
            return;
        }

        let raw_input = self.state.take_egui_input(&self.window);
        self.ctx.begin_frame(raw_input);
        let ppp = self.ctx.pixels_per_point();
        let painter = self.ctx.layer_painter(egui::LayerId::background());
        for item in texts {
            let pos = egui::pos2(item.anchor.x / ppp, item.anchor.y / ppp);
            let font = egui::FontId::proportional(item.size);
            painter.text(
                pos + SHADOW_OFFSET,
                egui::Align2::CENTER_CENTER,
                &item.text,
                font.clone(),
                color32(Color::BLACK.with_alpha(item.color.a * SHADOW_ALPHA)),
            );
            painter.text(pos, egui::Align2::CENTER_CENTER, &item.text, font, color32(item.color));
        }
        let full_output = self.ctx.end_frame();
        let paint_jobs = self.ctx.tessellate(full_output.shapes, full_output.pixels_per_point);

        let screen_descriptor = ScreenDescriptor {
            size_in_pixels,
            pixels_per_point: full_output.pixels_per_point,
        };
        for (id, image_delta) in &full_output.textures_delta.set {
            self.renderer.update_texture(device, queue, *id, image_delta);
        }
        self.renderer
            .update_buffers(device, queue, encoder, &paint_jobs, &screen_descriptor);
        metrics.record_buffer_upload();

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Label Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.renderer.render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        for job in &paint_jobs {
            if let egui::epaint::Primitive::Mesh(mesh) = &job.primitive {
                metrics.record_draw_call(mesh.vertices.len());
            }
        }

        for id in &full_output.textures_delta.free {
            self.renderer.free_texture(id);
        }
    }
}
