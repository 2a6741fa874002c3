//! GPU abstractions for wgpu.

pub mod buffers;
pub mod context;
pub mod pipeline;
pub mod texture;

pub use buffers::{static_vertices, DynamicBuffer, MeshBuffers};
pub use context::GpuContext;
pub use pipeline::{FillPipeline, GlobePipelines, GlobeUniform};
pub use texture::{SurfaceTexture, SURFACE_FORMAT};
