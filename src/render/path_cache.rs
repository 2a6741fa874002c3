//! Projected, triangulated paths per LOD tier.
//!
//! Paths are stored in map-plane coordinates (device pixels at zoom 1), so
//! panning and zooming only change the transform applied at draw time. The
//! cache is rebuilt when the map surface size, the projection or a tier's
//! geometry generation changes; frames never read it while stale.

use ahash::AHashMap;
use glam::Vec2;
use std::ops::Range;

use crate::core::types::{EntityId, GeoCoord};
use crate::lod::{LodTier, LodTiers};
use crate::projection::{FlatProjection, FlatProjectionKind, Projection};
use crate::world::geometry::{EntityGeometry, GeometryStore};

/// What the cached data was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub surface: (u32, u32),
    pub projection: FlatProjectionKind,
    pub generations: [u64; 3],
}

impl CacheKey {
    pub fn new(projection: &FlatProjection, tiers: &LodTiers) -> Self {
        Self {
            surface: (projection.width.round() as u32, projection.height.round() as u32),
            projection: projection.kind,
            generations: tiers.generations(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CachedPath {
    pub id: EntityId,
    pub parent: Option<EntityId>,
    /// Ring vertices, ring after ring, including any wrapped copies.
    pub vertices: Vec<Vec2>,
    /// Closed rings as ranges into `vertices` (closing vertex not repeated).
    pub rings: Vec<Range<usize>>,
    /// Fill triangles into `vertices`.
    pub indices: Vec<u32>,
    pub min: Vec2,
    pub max: Vec2,
}

impl CachedPath {
    fn empty(id: EntityId, parent: Option<EntityId>) -> Self {
        Self {
            id,
            parent,
            vertices: Vec::new(),
            rings: Vec::new(),
            indices: Vec::new(),
            min: Vec2::ZERO,
            max: Vec2::ZERO,
        }
    }

    pub fn intersects(&self, min: Vec2, max: Vec2) -> bool {
        self.max.x >= min.x && self.min.x <= max.x && self.max.y >= min.y && self.min.y <= max.y
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }
}

/// Paths for one tier, in store order.
#[derive(Debug, Clone, Default)]
pub struct TierPaths {
    pub paths: Vec<CachedPath>,
    index: AHashMap<EntityId, usize>,
    pub generation: u64,
}

impl TierPaths {
    pub fn get(&self, id: &EntityId) -> Option<&CachedPath> {
        self.index.get(id).map(|&i| &self.paths[i])
    }

    pub fn index_of(&self, id: &EntityId) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn total_vertices(&self) -> usize {
        self.paths.iter().map(CachedPath::vertex_count).sum()
    }
}

fn project_ring(projection: &FlatProjection, ring: &geo_types::LineString<f64>) -> Vec<Vec2> {
    let mut points: Vec<Vec2> = ring
        .0
        .iter()
        .filter_map(|c| projection.project(GeoCoord::new(c.x, c.y)))
        .collect();
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    points
}

/// Append one polygon (exterior + holes) shifted by `dx`, with its triangulation.
fn append_polygon(path: &mut CachedPath, rings: &[Vec<Vec2>], dx: f32) {
    let base = path.vertices.len();
    let mut flat: Vec<f64> = Vec::new();
    let mut holes: Vec<usize> = Vec::new();
    for (i, ring) in rings.iter().enumerate() {
        if i > 0 {
            holes.push(flat.len() / 2);
        }
        let start = path.vertices.len();
        for p in ring {
            let shifted = Vec2::new(p.x + dx, p.y);
            flat.push(shifted.x as f64);
            flat.push(shifted.y as f64);
            path.vertices.push(shifted);
        }
        path.rings.push(start..path.vertices.len());
    }
    match earcutr::earcut(&flat, &holes, 2) {
        Ok(triangles) => path
            .indices
            .extend(triangles.into_iter().map(|i| (base + i) as u32)),
        Err(_) => tracing::warn!("Triangulation failed for {}, drawing outline only", path.id),
    }
}

fn build_path(projection: &FlatProjection, geometry: &EntityGeometry) -> Option<CachedPath> {
    let shape = geometry.shape.as_ref()?;
    let width = projection.width;
    let mut path = CachedPath::empty(geometry.id.clone(), geometry.parent.clone());

    for polygon in shape.iter() {
        let mut rings = vec![project_ring(projection, polygon.exterior())];
        if rings[0].len() < 3 {
            continue;
        }
        rings.extend(
            polygon
                .interiors()
                .iter()
                .map(|h| project_ring(projection, h))
                .filter(|r| r.len() >= 3),
        );

        let (lo, hi) = rings[0]
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), p| (lo.min(p.x), hi.max(p.x)));
        append_polygon(&mut path, &rings, 0.0);
        // Unwrapped date-line parts hang off one edge; draw them again on the other.
        if hi > width {
            append_polygon(&mut path, &rings, -width);
        }
        if lo < 0.0 {
            append_polygon(&mut path, &rings, width);
        }
    }

    if path.vertices.is_empty() {
        return None;
    }
    let (min, max) = path.vertices.iter().fold(
        (Vec2::splat(f32::INFINITY), Vec2::splat(f32::NEG_INFINITY)),
        |(min, max), p| (min.min(*p), max.max(*p)),
    );
    path.min = min;
    path.max = max;
    Some(path)
}

fn build_tier(projection: &FlatProjection, store: &GeometryStore) -> TierPaths {
    let paths: Vec<CachedPath> = store.iter().filter_map(|g| build_path(projection, g)).collect();
    let index = paths
        .iter()
        .enumerate()
        .map(|(i, p)| (p.id.clone(), i))
        .collect();
    TierPaths {
        paths,
        index,
        generation: store.generation(),
    }
}

#[derive(Debug, Clone, Default)]
pub struct PathCache {
    key: Option<CacheKey>,
    projection: Option<FlatProjection>,
    tiers: [Option<TierPaths>; 3],
    rebuilds: u64,
}

impl PathCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(&self) -> Option<CacheKey> {
        self.key
    }

    pub fn is_fresh(&self, key: &CacheKey) -> bool {
        self.key.as_ref() == Some(key)
    }

    /// Bring the cache up to date. Only tiers whose inputs changed are rebuilt.
    /// Returns true if anything was rebuilt.
    pub fn ensure(&mut self, projection: &FlatProjection, tiers: &LodTiers) -> bool {
        let key = CacheKey::new(projection, tiers);
        if self.is_fresh(&key) {
            return false;
        }
        let surface_changed = self
            .key
            .map(|old| old.surface != key.surface || old.projection != key.projection)
            .unwrap_or(true);

        for tier in LodTier::ALL {
            let i = tier.index();
            let stale = surface_changed
                || self.key.map(|old| old.generations[i] != key.generations[i]).unwrap_or(true);
            if !stale {
                continue;
            }
            self.tiers[i] = tiers.store(tier).map(|store| {
                let built = build_tier(projection, store);
                tracing::debug!(
                    "Rebuilt {:?} paths for {}x{}: {} paths, {} vertices",
                    tier,
                    key.surface.0,
                    key.surface.1,
                    built.paths.len(),
                    built.total_vertices()
                );
                built
            });
        }

        self.key = Some(key);
        self.projection = Some(*projection);
        self.rebuilds += 1;
        true
    }

    /// Paths for a tier, or `None` if absent or the cache no longer matches `key`.
    pub fn tier_checked(&self, tier: LodTier, key: &CacheKey) -> Option<&TierPaths> {
        if !self.is_fresh(key) {
            return None;
        }
        self.tier(tier)
    }

    pub fn tier(&self, tier: LodTier) -> Option<&TierPaths> {
        self.tiers[tier.index()].as_ref()
    }

    pub fn lookup(&self, tier: LodTier, id: &EntityId) -> Option<&CachedPath> {
        self.tier(tier)?.get(id)
    }

    pub fn path(&self, tier: LodTier, index: usize) -> Option<&CachedPath> {
        self.tier(tier)?.paths.get(index)
    }

    pub fn projection(&self) -> Option<&FlatProjection> {
        self.projection.as_ref()
    }

    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds
    }

    /// Drop all cached paths (teardown or world replacement).
    pub fn clear(&mut self) {
        self.key = None;
        self.projection = None;
        self.tiers = Default::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::entity::GeographicEntity;
    use crate::world::snapshot::WorldSnapshot;
    use geo_types::{polygon, LineString, MultiPolygon, Polygon};

    fn world() -> WorldSnapshot {
        let square = MultiPolygon::new(vec![polygon![
            (x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0),
        ]]);
        let dateline = MultiPolygon::new(vec![polygon![
            (x: 170.0, y: -10.0), (x: -170.0, y: -10.0), (x: -170.0, y: 10.0), (x: 170.0, y: 10.0),
        ]]);
        WorldSnapshot::new(
            vec![
                GeographicEntity::new("sq", "Square", square),
                GeographicEntity::new("dl", "Dateline", dateline),
            ],
            Vec::new(),
            Vec::new(),
        )
    }

    fn projection() -> FlatProjection {
        FlatProjection::new(FlatProjectionKind::Equirectangular, 360.0)
    }

    #[test]
    fn test_square_triangulated() {
        let tiers = LodTiers::build(&world());
        let mut cache = PathCache::new();
        assert!(cache.ensure(&projection(), &tiers));
        let sq = cache.lookup(LodTier::Region, &EntityId::from("sq")).unwrap();
        assert_eq!(sq.vertices.len(), 4);
        assert_eq!(sq.indices.len(), 6);
        assert_eq!(sq.rings, vec![0..4]);
    }

    #[test]
    fn test_dateline_path_stays_narrow_and_wraps() {
        let tiers = LodTiers::build(&world());
        let mut cache = PathCache::new();
        cache.ensure(&projection(), &tiers);
        let dl = cache.lookup(LodTier::Region, &EntityId::from("dl")).unwrap();
        // Original plus one copy shifted by the map width.
        assert_eq!(dl.rings.len(), 2);
        for ring in &dl.rings {
            let xs: Vec<f32> = dl.vertices[ring.clone()].iter().map(|p| p.x).collect();
            let span = xs.iter().cloned().fold(f32::NEG_INFINITY, f32::max)
                - xs.iter().cloned().fold(f32::INFINITY, f32::min);
            assert!(span <= 20.0 + 1e-3, "ring spans {span}");
        }
    }

    #[test]
    fn test_rebuild_only_on_change() {
        let tiers = LodTiers::build(&world());
        let mut cache = PathCache::new();
        assert!(cache.ensure(&projection(), &tiers));
        assert!(!cache.ensure(&projection(), &tiers));
        assert_eq!(cache.rebuild_count(), 1);

        let resized = FlatProjection::new(FlatProjectionKind::Equirectangular, 720.0);
        let old_key = CacheKey::new(&projection(), &tiers);
        assert!(cache.ensure(&resized, &tiers));
        assert!(cache.tier_checked(LodTier::Region, &old_key).is_none());
        assert!(cache
            .tier_checked(LodTier::Region, &CacheKey::new(&resized, &tiers))
            .is_some());
    }

    #[test]
    fn test_new_world_invalidates() {
        let mut cache = PathCache::new();
        let tiers = LodTiers::build(&world());
        cache.ensure(&projection(), &tiers);
        let replaced = LodTiers::build(&world());
        assert!(!cache.is_fresh(&CacheKey::new(&projection(), &replaced)));
        assert!(cache.ensure(&projection(), &replaced));
    }

    #[test]
    fn test_entity_without_shape_has_no_path() {
        let mut entity = GeographicEntity::new("void", "Void", MultiPolygon::new(Vec::new()));
        entity.geometry = None;
        let w = WorldSnapshot::new(vec![entity], Vec::new(), Vec::new());
        let tiers = LodTiers::build(&w);
        let mut cache = PathCache::new();
        cache.ensure(&projection(), &tiers);
        let tier = cache.tier(LodTier::Region).unwrap();
        assert!(tier.paths.is_empty());
        assert!(tier.get(&EntityId::from("void")).is_none());
    }

    #[test]
    fn test_hole_is_not_filled() {
        let donut = MultiPolygon::new(vec![Polygon::new(
            LineString::from(vec![(0.0, 0.0), (40.0, 0.0), (40.0, 40.0), (0.0, 40.0), (0.0, 0.0)]),
            vec![LineString::from(vec![(10.0, 10.0), (30.0, 10.0), (30.0, 30.0), (10.0, 30.0), (10.0, 10.0)])],
        )]);
        let w = WorldSnapshot::new(vec![GeographicEntity::new("d", "D", donut)], Vec::new(), Vec::new());
        let tiers = LodTiers::build(&w);
        let mut cache = PathCache::new();
        cache.ensure(&projection(), &tiers);
        let d = cache.lookup(LodTier::Region, &EntityId::from("d")).unwrap();
        assert_eq!(d.rings.len(), 2);
        // A square with a square hole triangulates into 8 triangles.
        assert_eq!(d.indices.len(), 24);
    }
}
