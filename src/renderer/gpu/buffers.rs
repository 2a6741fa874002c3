//! GPU buffer management.

use bytemuck::Pod;
use wgpu::util::DeviceExt;

use super::context::GpuContext;

/// Vertex buffer rewritten every frame, grown on demand.
pub struct DynamicBuffer {
    label: &'static str,
    pub buffer: wgpu::Buffer,
    capacity_bytes: u64,
    /// Number of vertices written by the last upload.
    pub len: u32,
}

impl DynamicBuffer {
    pub fn new(ctx: &GpuContext, label: &'static str, initial_bytes: u64) -> Self {
        let capacity_bytes = initial_bytes.max(256);
        Self {
            label,
            buffer: Self::create(ctx, label, capacity_bytes),
            capacity_bytes,
            len: 0,
        }
    }

    fn create(ctx: &GpuContext, label: &str, size: u64) -> wgpu::Buffer {
        ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Ensure capacity for `needed` bytes. Returns true if the buffer was reallocated.
    pub fn ensure_capacity(&mut self, ctx: &GpuContext, needed: u64) -> bool {
        if needed <= self.capacity_bytes {
            return false;
        }
        let new_capacity = (needed * 2).max(64 * 1024);
        self.buffer = Self::create(ctx, self.label, new_capacity);
        self.capacity_bytes = new_capacity;
        tracing::debug!("Grew {} to {} bytes", self.label, new_capacity);
        true
    }

    /// Replace the contents with `vertices`.
    pub fn upload<T: Pod>(&mut self, ctx: &GpuContext, vertices: &[T]) {
        self.len = vertices.len() as u32;
        if vertices.is_empty() {
            return;
        }
        let bytes: &[u8] = bytemuck::cast_slice(vertices);
        self.ensure_capacity(ctx, bytes.len() as u64);
        ctx.queue.write_buffer(&self.buffer, 0, bytes);
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Immutable indexed mesh.
pub struct MeshBuffers {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl MeshBuffers {
    pub fn new<V: Pod>(ctx: &GpuContext, name: &str, vertices: &[V], indices: &[u32]) -> Self {
        let vertex_buffer = ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertex Buffer", name)),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Index Buffer", name)),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
        }
    }
}

/// Immutable non-indexed vertex buffer (star points).
pub fn static_vertices<V: Pod>(ctx: &GpuContext, name: &str, vertices: &[V]) -> wgpu::Buffer {
    ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(name),
        contents: bytemuck::cast_slice(vertices),
        usage: wgpu::BufferUsages::VERTEX,
    })
}
