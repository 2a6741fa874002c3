//! Seeded star points around the globe.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Stars sit on a shell well outside the camera's reach and inside the far plane.
pub const STAR_RADIUS: f32 = 50.0;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct StarVertex {
    pub position: [f32; 3],
    pub brightness: f32,
}

impl StarVertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
            wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<StarVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

/// Uniformly distributed directions with a bias toward dim stars.
pub fn generate_stars(count: usize, seed: u64) -> Vec<StarVertex> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let z: f32 = rng.gen_range(-1.0..=1.0);
            let theta: f32 = rng.gen_range(0.0..std::f32::consts::TAU);
            let r = (1.0 - z * z).max(0.0).sqrt();
            let dir = Vec3::new(r * theta.cos(), z, r * theta.sin());
            let brightness = 0.25 + 0.75 * rng.gen::<f32>().powi(3);
            StarVertex {
                position: (dir * STAR_RADIUS).to_array(),
                brightness,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_per_seed() {
        assert_eq!(generate_stars(50, 7), generate_stars(50, 7));
        assert_ne!(generate_stars(50, 7), generate_stars(50, 8));
    }

    #[test]
    fn test_stars_on_shell() {
        for star in generate_stars(200, 1) {
            assert!((Vec3::from(star.position).length() - STAR_RADIUS).abs() < 1e-2);
            assert!((0.25..=1.0).contains(&star.brightness));
        }
    }
}
