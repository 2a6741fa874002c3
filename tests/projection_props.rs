//! Property tests: projection round trips, camera zoom bounds, LOD opacity
//! continuity and date-line unwrapping.

use geo_types::Coord;
use glam::Vec2;
use proptest::prelude::*;

use warmap::camera::FlatCamera;
use warmap::core::config::{CameraConfig, LodConfig};
use warmap::core::types::{GeoCoord, Viewport};
use warmap::lod::tier_opacities;
use warmap::projection::globe::{geo_to_unit, geo_to_uv, unit_to_geo, uv_to_geo};
use warmap::projection::{FlatProjection, FlatProjectionKind, Projection};
use warmap::world::geometry::max_lon_step;
use warmap::world::unwrap_ring;

fn close(a: GeoCoord, b: GeoCoord) -> bool {
    (a.lon - b.lon).abs() < 1e-3 && (a.lat - b.lat).abs() < 1e-3
}

#[derive(Debug, Clone)]
enum CameraOp {
    Wheel(f32, f32, f32),
    Pan(f32, f32),
    Drag(f32, f32),
    Resize(f32, f32),
    Step(f32),
}

fn camera_op() -> impl Strategy<Value = CameraOp> {
    prop_oneof![
        (0.0f32..1600.0, 0.0f32..900.0, -6.0f32..6.0).prop_map(|(x, y, d)| CameraOp::Wheel(x, y, d)),
        (-500.0f32..500.0, -500.0f32..500.0).prop_map(|(x, y)| CameraOp::Pan(x, y)),
        (-500.0f32..500.0, -500.0f32..500.0).prop_map(|(x, y)| CameraOp::Drag(x, y)),
        (200.0f32..2400.0, 200.0f32..1400.0).prop_map(|(w, h)| CameraOp::Resize(w, h)),
        (0.0f32..0.2).prop_map(CameraOp::Step),
    ]
}

proptest! {
    #[test]
    fn test_equirectangular_round_trip(lon in -180.0f64..180.0, lat in -90.0f64..90.0, width in 200.0f32..4000.0) {
        let projection = FlatProjection::new(FlatProjectionKind::Equirectangular, width);
        let coord = GeoCoord::new(lon, lat);
        let back = projection.invert(projection.project(coord).unwrap()).unwrap();
        prop_assert!(close(coord, back), "{:?} -> {:?}", coord, back);
    }

    #[test]
    fn test_mercator_round_trip(lon in -180.0f64..180.0, lat in -80.0f64..80.0, width in 200.0f32..4000.0) {
        let projection = FlatProjection::new(FlatProjectionKind::Mercator, width);
        let coord = GeoCoord::new(lon, lat);
        let back = projection.invert(projection.project(coord).unwrap()).unwrap();
        prop_assert!(close(coord, back), "{:?} -> {:?}", coord, back);
    }

    #[test]
    fn test_mercator_stays_inside_map(lon in -180.0f64..180.0, lat in -90.0f64..90.0) {
        let projection = FlatProjection::new(FlatProjectionKind::Mercator, 1000.0);
        if let Some(p) = projection.project(GeoCoord::new(lon, lat)) {
            prop_assert!(p.y >= -1e-2 && p.y <= 1000.0 + 1e-2);
        }
    }

    #[test]
    fn test_sphere_round_trip(lon in -179.9f64..179.9, lat in -89.0f64..89.0) {
        let coord = GeoCoord::new(lon, lat);
        let p = geo_to_unit(coord);
        prop_assert!((p.length() - 1.0).abs() < 1e-5);
        prop_assert!(close(unit_to_geo(p), coord));
        prop_assert!(close(uv_to_geo(geo_to_uv(coord)), coord));
    }

    #[test]
    fn test_zoom_stays_clamped(ops in prop::collection::vec(camera_op(), 1..40)) {
        let config = CameraConfig::default();
        let mut viewport = Viewport::new(1280.0, 720.0);
        let mut projection = FlatProjection::fit(FlatProjectionKind::Equirectangular, viewport);
        let mut camera = FlatCamera::new(viewport, projection.map_size(), &config);

        for op in ops {
            match op {
                CameraOp::Wheel(x, y, lines) => camera.zoom_at(Vec2::new(x, y), config.wheel_step.powf(lines)),
                CameraOp::Pan(x, y) => camera.pan(Vec2::new(x, y)),
                CameraOp::Drag(x, y) => camera.pan_immediate(Vec2::new(x, y)),
                CameraOp::Resize(w, h) => {
                    viewport = Viewport::new(w, h);
                    projection = FlatProjection::fit(FlatProjectionKind::Equirectangular, viewport);
                    camera.set_viewport(viewport, projection.map_size());
                }
                CameraOp::Step(dt) => { camera.update(dt); }
            }
            prop_assert!(camera.zoom >= camera.min_zoom() && camera.zoom <= camera.max_zoom());
            prop_assert!(camera.target_zoom >= camera.min_zoom() && camera.target_zoom <= camera.max_zoom());

            // The map always covers the viewport.
            let (min, max) = camera.visible_bounds();
            let size = projection.map_size();
            prop_assert!(max.x - min.x <= size.x + 1e-2);
            prop_assert!(max.y - min.y <= size.y + 1e-2);
        }
    }

    #[test]
    fn test_lod_opacities_sum_to_one(zoom in 0.5f32..60.0, loaded in any::<bool>()) {
        let o = tier_opacities(zoom, &LodConfig::default(), loaded);
        prop_assert!((o.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        prop_assert!(o.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_unwrapped_rings_have_no_jumps(start in -180.0f64..180.0, steps in prop::collection::vec(-40.0f64..40.0, 3..30)) {
        let mut lon = start;
        let mut ring: Vec<Coord<f64>> = Vec::new();
        for step in steps {
            ring.push(Coord { x: lon, y: 10.0 });
            lon += step;
            if lon > 180.0 { lon -= 360.0; }
            if lon < -180.0 { lon += 360.0; }
        }
        unwrap_ring(&mut ring);
        prop_assert!(max_lon_step(&ring) <= 180.0);
    }
}

#[test]
fn test_date_line_ring_unwrapped() {
    let mut ring: Vec<Coord<f64>> = [170.0, 175.0, -175.0, -170.0]
        .iter()
        .map(|&x| Coord { x, y: 0.0 })
        .collect();
    assert!(unwrap_ring(&mut ring));
    for pair in ring.windows(2) {
        assert!((pair[1].x - pair[0].x).abs() <= 180.0);
    }
    assert_eq!(ring[2].x, 185.0);
}
