//! Render pipelines: screen-space colored triangles and the globe passes.

use bytemuck::{Pod, Zeroable};

use super::context::GpuContext;
use super::texture::SurfaceTexture;
use crate::render::ColorVertex;
use crate::renderer::globe_mesh::SphereVertex;
use crate::renderer::starfield::StarVertex;

impl ColorVertex {
    /// Vertex buffer layout descriptor.
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
            wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x4];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ColorVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

fn uniform_layout(ctx: &GpuContext, label: &str, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayout {
    ctx.device
        .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(label),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        })
}

fn uniform_buffer(ctx: &GpuContext, label: &str, size: u64) -> wgpu::Buffer {
    ctx.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// Pixel-space triangles with per-vertex color (flat map, overlays and the
/// globe surface canvas). One instance per target format.
pub struct FillPipeline {
    pub render_pipeline: wgpu::RenderPipeline,
    pub viewport_buffer: wgpu::Buffer,
    pub viewport_bind_group: wgpu::BindGroup,
}

impl FillPipeline {
    pub fn new(ctx: &GpuContext, format: wgpu::TextureFormat, label: &str) -> Self {
        let shader = ctx
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Fill Shader"),
                source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/fill.wgsl").into()),
            });

        let layout = uniform_layout(ctx, "Viewport Bind Group Layout", wgpu::ShaderStages::VERTEX);
        // vec2 size + padding
        let viewport_buffer = uniform_buffer(ctx, "Viewport Buffer", 16);
        let viewport_bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Viewport Bind Group"),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: viewport_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = ctx
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Fill Pipeline Layout"),
                bind_group_layouts: &[&layout],
                push_constant_ranges: &[],
            });

        let render_pipeline = ctx
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: "vs_main",
                    buffers: &[ColorVertex::desc()],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: "fs_main",
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None, // No culling for 2D
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
            });

        Self {
            render_pipeline,
            viewport_buffer,
            viewport_bind_group,
        }
    }

    pub fn update_viewport(&self, queue: &wgpu::Queue, width: f32, height: f32) {
        queue.write_buffer(&self.viewport_buffer, 0, bytemuck::cast_slice(&[width, height, 0.0, 0.0]));
    }
}

/// Uniform shared by the globe passes.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct GlobeUniform {
    pub view_proj: [[f32; 4]; 4],
    pub eye: [f32; 4],
    pub atmosphere: [f32; 4],
    pub star: [f32; 4],
}

/// Sphere, atmosphere shell and starfield pipelines.
pub struct GlobePipelines {
    pub sphere: wgpu::RenderPipeline,
    pub atmosphere: wgpu::RenderPipeline,
    pub stars: wgpu::RenderPipeline,
    pub uniform_buffer: wgpu::Buffer,
    pub uniform_bind_group: wgpu::BindGroup,
    pub texture_layout: wgpu::BindGroupLayout,
}

impl GlobePipelines {
    pub fn new(ctx: &GpuContext) -> Self {
        let shader = ctx
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Globe Shader"),
                source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/globe.wgsl").into()),
            });

        let uniform_layout = uniform_layout(
            ctx,
            "Globe Uniform Layout",
            wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        );
        let uniform_buffer = uniform_buffer(ctx, "Globe Uniform Buffer", std::mem::size_of::<GlobeUniform>() as u64);
        let uniform_bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Globe Uniform Bind Group"),
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let texture_layout = ctx
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Globe Texture Layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let sphere_layout = ctx
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Sphere Pipeline Layout"),
                bind_group_layouts: &[&uniform_layout, &texture_layout],
                push_constant_ranges: &[],
            });
        let uniform_only = ctx
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Globe Uniform Pipeline Layout"),
                bind_group_layouts: &[&uniform_layout],
                push_constant_ranges: &[],
            });

        let additive = wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
        };

        let build = |label: &str,
                     layout: &wgpu::PipelineLayout,
                     vs: &str,
                     fs: &str,
                     buffer: wgpu::VertexBufferLayout<'static>,
                     topology: wgpu::PrimitiveTopology,
                     cull_mode: Option<wgpu::Face>,
                     blend: wgpu::BlendState| {
            ctx.device
                .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                    label: Some(label),
                    layout: Some(layout),
                    vertex: wgpu::VertexState {
                        module: &shader,
                        entry_point: vs,
                        buffers: &[buffer],
                    },
                    fragment: Some(wgpu::FragmentState {
                        module: &shader,
                        entry_point: fs,
                        targets: &[Some(wgpu::ColorTargetState {
                            format: ctx.format(),
                            blend: Some(blend),
                            write_mask: wgpu::ColorWrites::ALL,
                        })],
                    }),
                    primitive: wgpu::PrimitiveState {
                        topology,
                        strip_index_format: None,
                        front_face: wgpu::FrontFace::Ccw,
                        cull_mode,
                        polygon_mode: wgpu::PolygonMode::Fill,
                        unclipped_depth: false,
                        conservative: false,
                    },
                    depth_stencil: None,
                    multisample: wgpu::MultisampleState::default(),
                    multiview: None,
                })
        };

        let sphere = build(
            "Sphere Pipeline",
            &sphere_layout,
            "vs_sphere",
            "fs_sphere",
            SphereVertex::desc(),
            wgpu::PrimitiveTopology::TriangleList,
            Some(wgpu::Face::Back),
            wgpu::BlendState::REPLACE,
        );
        // Back faces of a slightly larger shell glow around the limb.
        let atmosphere = build(
            "Atmosphere Pipeline",
            &uniform_only,
            "vs_atmosphere",
            "fs_atmosphere",
            SphereVertex::desc(),
            wgpu::PrimitiveTopology::TriangleList,
            Some(wgpu::Face::Front),
            additive,
        );
        let stars = build(
            "Star Pipeline",
            &uniform_only,
            "vs_star",
            "fs_star",
            StarVertex::desc(),
            wgpu::PrimitiveTopology::PointList,
            None,
            wgpu::BlendState::ALPHA_BLENDING,
        );

        Self {
            sphere,
            atmosphere,
            stars,
            uniform_buffer,
            uniform_bind_group,
            texture_layout,
        }
    }

    pub fn texture_bind_group(&self, ctx: &GpuContext, surface: &SurfaceTexture) -> wgpu::BindGroup {
        ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Globe Texture Bind Group"),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&surface.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&surface.sampler),
                },
            ],
        })
    }

    pub fn update_uniform(&self, queue: &wgpu::Queue, uniform: &GlobeUniform) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(uniform));
    }
}
