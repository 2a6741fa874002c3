//! Flat map projections fitted to the viewport width.
//!
//! The map plane spans `[0, width] x [0, height]` with north up and y growing
//! downward, matching screen space. Longitudes past ±180 (unwrapped date-line
//! geometry) project beyond the map edges; the path cache draws those parts
//! again shifted by one map width.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_4, PI};

use super::Projection;
use crate::core::types::{GeoCoord, Viewport};

/// Latitude limit of the square Web-Mercator map.
pub const MERCATOR_MAX_LAT: f64 = 85.051_128_779_806_6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlatProjectionKind {
    #[default]
    Equirectangular,
    Mercator,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatProjection {
    pub kind: FlatProjectionKind,
    pub width: f32,
    pub height: f32,
}

impl FlatProjection {
    pub fn new(kind: FlatProjectionKind, width: f32) -> Self {
        let height = match kind {
            FlatProjectionKind::Equirectangular => width / 2.0,
            FlatProjectionKind::Mercator => width,
        };
        Self { kind, width, height }
    }

    /// Fit the map so its width equals the viewport width.
    pub fn fit(kind: FlatProjectionKind, viewport: Viewport) -> Self {
        Self::new(kind, viewport.width.max(1.0))
    }

    pub fn map_size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// Same projection laid out on a texture of the given width (globe surface).
    pub fn with_width(&self, width: f32) -> Self {
        Self::new(self.kind, width)
    }

    fn lon_to_x(&self, lon: f64) -> f64 {
        (lon + 180.0) / 360.0 * self.width as f64
    }

    fn x_to_lon(&self, x: f64) -> f64 {
        x / self.width as f64 * 360.0 - 180.0
    }
}

impl Projection for FlatProjection {
    fn project(&self, coord: GeoCoord) -> Option<Vec2> {
        if !coord.lon.is_finite() || !coord.lat.is_finite() {
            return None;
        }
        let x = self.lon_to_x(coord.lon);
        let y = match self.kind {
            FlatProjectionKind::Equirectangular => {
                (90.0 - coord.lat.clamp(-90.0, 90.0)) / 180.0 * self.height as f64
            }
            FlatProjectionKind::Mercator => {
                let phi = coord.lat.clamp(-MERCATOR_MAX_LAT, MERCATOR_MAX_LAT).to_radians();
                let w = self.width as f64;
                w / 2.0 - w / (2.0 * PI) * (FRAC_PI_4 + phi / 2.0).tan().ln()
            }
        };
        Some(Vec2::new(x as f32, y as f32))
    }

    fn invert(&self, point: Vec2) -> Option<GeoCoord> {
        if !point.is_finite()
            || point.x < 0.0
            || point.x > self.width
            || point.y < 0.0
            || point.y > self.height
        {
            return None;
        }
        let lon = self.x_to_lon(point.x as f64);
        let lat = match self.kind {
            FlatProjectionKind::Equirectangular => 90.0 - point.y as f64 / self.height as f64 * 180.0,
            FlatProjectionKind::Mercator => {
                let w = self.width as f64;
                let t = (w / 2.0 - point.y as f64) * 2.0 * PI / w;
                (2.0 * t.exp().atan() - std::f64::consts::FRAC_PI_2).to_degrees()
            }
        };
        Some(GeoCoord::new(lon, lat))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equirectangular_corners() {
        let p = FlatProjection::new(FlatProjectionKind::Equirectangular, 360.0);
        assert_eq!(p.height, 180.0);
        assert_eq!(p.project(GeoCoord::new(-180.0, 90.0)), Some(Vec2::new(0.0, 0.0)));
        assert_eq!(p.project(GeoCoord::new(0.0, 0.0)), Some(Vec2::new(180.0, 90.0)));
    }

    #[test]
    fn test_mercator_is_square_and_symmetric() {
        let p = FlatProjection::new(FlatProjectionKind::Mercator, 1024.0);
        assert_eq!(p.height, 1024.0);
        let top = p.project(GeoCoord::new(0.0, MERCATOR_MAX_LAT)).unwrap();
        let bottom = p.project(GeoCoord::new(0.0, -MERCATOR_MAX_LAT)).unwrap();
        assert!(top.y.abs() < 0.01);
        assert!((bottom.y - 1024.0).abs() < 0.01);
    }

    #[test]
    fn test_round_trip() {
        for kind in [FlatProjectionKind::Equirectangular, FlatProjectionKind::Mercator] {
            let p = FlatProjection::new(kind, 1280.0);
            let coord = GeoCoord::new(12.5, 41.9);
            let back = p.invert(p.project(coord).unwrap()).unwrap();
            assert!((back.lon - coord.lon).abs() < 1e-3);
            assert!((back.lat - coord.lat).abs() < 1e-3);
        }
    }

    #[test]
    fn test_invert_outside_map_is_none() {
        let p = FlatProjection::new(FlatProjectionKind::Equirectangular, 1000.0);
        assert!(p.invert(Vec2::new(-1.0, 10.0)).is_none());
        assert!(p.invert(Vec2::new(10.0, 501.0)).is_none());
    }

    #[test]
    fn test_unwrapped_longitude_projects_past_edge() {
        let p = FlatProjection::new(FlatProjectionKind::Equirectangular, 360.0);
        let pt = p.project(GeoCoord::new(190.0, 0.0)).unwrap();
        assert!(pt.x > p.width);
    }
}
