//! UV sphere for the globe and its atmosphere shell.

use bytemuck::{Pod, Zeroable};

use crate::core::types::GeoCoord;
use crate::projection::globe::geo_to_unit;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct SphereVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

impl SphereVertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
            wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SphereVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

/// Unit sphere with `stacks` latitude bands (north to south) and `slices`
/// longitude bands (west to east). The seam column is duplicated so UVs run
/// 0..1 without wrapping: UVs come from the grid, never from a normalized
/// longitude, so the +180 column keeps u = 1. Triangles wind counter-clockwise
/// seen from outside.
pub fn uv_sphere(stacks: u32, slices: u32) -> (Vec<SphereVertex>, Vec<u32>) {
    let stacks = stacks.max(2);
    let slices = slices.max(3);
    let mut vertices = Vec::with_capacity(((stacks + 1) * (slices + 1)) as usize);
    let mut indices = Vec::with_capacity((stacks * slices * 6) as usize);

    for i in 0..=stacks {
        let v = i as f64 / stacks as f64;
        for j in 0..=slices {
            let u = j as f64 / slices as f64;
            let coord = GeoCoord::new(-180.0 + 360.0 * u, 90.0 - 180.0 * v);
            vertices.push(SphereVertex {
                position: geo_to_unit(coord).to_array(),
                uv: [u as f32, v as f32],
            });
        }
    }

    let row = slices + 1;
    for i in 0..stacks {
        for j in 0..slices {
            let a = i * row + j;
            let b = a + row;
            indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
        }
    }

    (vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_counts() {
        let (vertices, indices) = uv_sphere(16, 32);
        assert_eq!(vertices.len(), 17 * 33);
        assert_eq!(indices.len(), 16 * 32 * 6);
        assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));
    }

    #[test]
    fn test_vertices_on_unit_sphere_with_matching_uv() {
        let (vertices, _) = uv_sphere(8, 16);
        for v in &vertices {
            assert!((Vec3::from(v.position).length() - 1.0).abs() < 1e-5);
        }
        // Equator at lon 0 is +Z, mid texture.
        let equator_mid = &vertices[(4 * 17 + 8) as usize];
        assert!((Vec3::from(equator_mid.position) - Vec3::Z).length() < 1e-5);
        assert!((equator_mid.uv[0] - 0.5).abs() < 1e-6 && (equator_mid.uv[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_u_increases_across_each_row() {
        let (vertices, _) = uv_sphere(4, 8);
        for row in vertices.chunks(9) {
            for pair in row.windows(2) {
                assert!(pair[1].uv[0] > pair[0].uv[0], "{:?} then {:?}", pair[0].uv, pair[1].uv);
            }
            assert_eq!(row[0].uv[0], 0.0);
            assert_eq!(row[8].uv[0], 1.0);
        }
    }

    #[test]
    fn test_outward_winding() {
        let (vertices, indices) = uv_sphere(8, 16);
        // A triangle away from the poles.
        let base = (3 * 17 * 6) as usize;
        let tri: Vec<Vec3> = indices[base..base + 3]
            .iter()
            .map(|&i| Vec3::from(vertices[i as usize].position))
            .collect();
        let normal = (tri[1] - tri[0]).cross(tri[2] - tri[0]);
        let center = (tri[0] + tri[1] + tri[2]) / 3.0;
        assert!(normal.dot(center) > 0.0);
    }
}
