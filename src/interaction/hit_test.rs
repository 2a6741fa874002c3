//! Resolve pointer positions to entities.
//!
//! Screen → world (camera inverse) → geographic (projection inverse, or a
//! ray cast against the unit sphere) → point-in-polygon against the entity
//! tier. Any failed inversion means "no entity".

use glam::Vec2;

use crate::camera::{FlatCamera, OrbitCamera};
use crate::core::types::{EntityId, GeoCoord};
use crate::projection::globe::{ray_sphere, unit_to_geo};
use crate::projection::{FlatProjection, Projection};
use crate::world::geometry::GeometryStore;

/// First entity whose geometry contains `coord`.
pub fn hit_test_geo(store: &GeometryStore, coord: GeoCoord) -> Option<EntityId> {
    if !coord.is_valid() {
        return None;
    }
    store
        .iter()
        .find(|g| g.contains(coord))
        .map(|g| g.id.clone())
}

pub fn screen_to_geo_flat(camera: &FlatCamera, projection: &FlatProjection, screen: Vec2) -> Option<GeoCoord> {
    projection.invert(camera.screen_to_world(screen))
}

/// `None` past the globe's limb.
pub fn screen_to_geo_globe(camera: &OrbitCamera, screen: Vec2) -> Option<GeoCoord> {
    let (origin, dir) = camera.ray(screen)?;
    ray_sphere(origin, dir).map(unit_to_geo)
}

pub fn hit_test_flat(
    camera: &FlatCamera,
    projection: &FlatProjection,
    store: &GeometryStore,
    screen: Vec2,
) -> Option<EntityId> {
    hit_test_geo(store, screen_to_geo_flat(camera, projection, screen)?)
}

pub fn hit_test_globe(camera: &OrbitCamera, store: &GeometryStore, screen: Vec2) -> Option<EntityId> {
    hit_test_geo(store, screen_to_geo_globe(camera, screen)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{CameraConfig, GlobeConfig};
    use crate::core::types::Viewport;
    use crate::projection::globe::geo_to_unit;
    use crate::projection::FlatProjectionKind;
    use crate::world::geometry::GeometryFeature;
    use geo_types::{polygon, MultiPolygon};

    fn store() -> GeometryStore {
        let a = MultiPolygon::new(vec![polygon![
            (x: 0.0, y: 0.0), (x: 20.0, y: 0.0), (x: 20.0, y: 20.0), (x: 0.0, y: 20.0),
        ]]);
        let b = MultiPolygon::new(vec![polygon![
            (x: 20.0, y: 0.0), (x: 40.0, y: 0.0), (x: 40.0, y: 20.0), (x: 20.0, y: 20.0),
        ]]);
        GeometryStore::from_features(vec![
            GeometryFeature::new(EntityId::from("a"), Some(a)),
            GeometryFeature::new(EntityId::from("b"), Some(b)),
        ])
    }

    #[test]
    fn test_geo_hit() {
        let s = store();
        assert_eq!(hit_test_geo(&s, GeoCoord::new(30.0, 10.0)), Some(EntityId::from("b")));
        assert_eq!(hit_test_geo(&s, GeoCoord::new(-30.0, 10.0)), None);
        assert_eq!(hit_test_geo(&s, GeoCoord::new(f64::NAN, 10.0)), None);
    }

    #[test]
    fn test_flat_pipeline() {
        let viewport = Viewport::new(1000.0, 600.0);
        let projection = FlatProjection::fit(FlatProjectionKind::Equirectangular, viewport);
        let mut camera = FlatCamera::new(viewport, projection.map_size(), &CameraConfig::default());
        camera.zoom_at(Vec2::new(700.0, 250.0), 3.0);
        camera.settle();
        let world = projection.project(GeoCoord::new(10.0, 10.0)).unwrap();
        let screen = camera.world_to_screen(world);
        assert_eq!(hit_test_flat(&camera, &projection, &store(), screen), Some(EntityId::from("a")));
    }

    #[test]
    fn test_globe_pipeline() {
        let mut camera = OrbitCamera::new(Viewport::new(800.0, 800.0), &CameraConfig::default(), &GlobeConfig::default());
        camera.fly_to(GeoCoord::new(20.0, 10.0), 1.0);
        camera.settle();
        let screen = camera.project_to_screen(geo_to_unit(GeoCoord::new(30.0, 10.0))).unwrap();
        assert_eq!(hit_test_globe(&camera, &store(), screen), Some(EntityId::from("b")));
        assert_eq!(hit_test_globe(&camera, &store(), Vec2::new(1.0, 1.0)), None);
    }
}
