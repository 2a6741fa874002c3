//! Unit-sphere parameterization used by the globe view.
//!
//! Axes: +Y through the north pole, +Z through (0°, 0°), +X through (90°E, 0°).
//! Texture UVs follow the equirectangular surface texture: u grows eastward
//! from the antimeridian, v grows southward from the north pole.

use glam::{Vec2, Vec3};

use crate::core::types::GeoCoord;

pub fn geo_to_unit(coord: GeoCoord) -> Vec3 {
    let lon = coord.lon.to_radians();
    let lat = coord.lat.to_radians();
    Vec3::new(
        (lat.cos() * lon.sin()) as f32,
        lat.sin() as f32,
        (lat.cos() * lon.cos()) as f32,
    )
}

/// Inverse of [`geo_to_unit`]; the input need not be normalized.
pub fn unit_to_geo(p: Vec3) -> GeoCoord {
    let p = p.normalize_or_zero();
    let lat = (p.y as f64).clamp(-1.0, 1.0).asin().to_degrees();
    let lon = (p.x as f64).atan2(p.z as f64).to_degrees();
    GeoCoord::new(lon, lat)
}

pub fn geo_to_uv(coord: GeoCoord) -> Vec2 {
    let c = coord.normalized();
    Vec2::new(((c.lon + 180.0) / 360.0) as f32, ((90.0 - c.lat) / 180.0) as f32)
}

pub fn uv_to_geo(uv: Vec2) -> GeoCoord {
    GeoCoord::new(uv.x as f64 * 360.0 - 180.0, 90.0 - uv.y as f64 * 180.0)
}

/// Nearest intersection of a ray with the unit sphere at the origin.
///
/// `None` when the ray misses (pointer beyond the limb) or the sphere is
/// entirely behind the origin.
pub fn ray_sphere(origin: Vec3, dir: Vec3) -> Option<Vec3> {
    let dir = dir.try_normalize()?;
    let b = origin.dot(dir);
    let c = origin.length_squared() - 1.0;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let sqrt = disc.sqrt();
    let t_near = -b - sqrt;
    let t = if t_near >= 0.0 { t_near } else { -b + sqrt };
    if t < 0.0 {
        return None;
    }
    Some(origin + dir * t)
}
