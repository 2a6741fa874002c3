//! Immutable per-entity geometry: sanitized, date-line unwrapped polygons
//! with bounds, centroid and adjacency.
//!
//! A store is built once per world load (or per LOD tier fetch) and carries a
//! generation number so downstream caches can tell when it was replaced.

use ahash::AHashMap;
use geo::{BoundingRect, Centroid, Contains};
use geo_types::{Coord, LineString, MultiPolygon, Point, Polygon, Rect};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::core::types::{EntityId, GeoCoord};
use crate::world::entity::GeographicEntity;

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

fn next_generation() -> u64 {
    NEXT_GENERATION.fetch_add(1, Ordering::Relaxed)
}

/// Shift longitudes by multiples of 360 so consecutive vertices differ by at
/// most 180 degrees. Returns true if any vertex moved.
pub fn unwrap_ring(coords: &mut [Coord<f64>]) -> bool {
    let mut changed = false;
    for i in 1..coords.len() {
        let prev = coords[i - 1].x;
        let mut lon = coords[i].x;
        while lon - prev > 180.0 {
            lon -= 360.0;
        }
        while lon - prev < -180.0 {
            lon += 360.0;
        }
        if lon != coords[i].x {
            coords[i].x = lon;
            changed = true;
        }
    }
    changed
}

/// Largest absolute longitude step between consecutive vertices.
pub fn max_lon_step(coords: &[Coord<f64>]) -> f64 {
    coords
        .windows(2)
        .map(|w| (w[1].x - w[0].x).abs())
        .fold(0.0, f64::max)
}

fn unwrap_line(line: &LineString<f64>) -> LineString<f64> {
    let mut coords = line.0.clone();
    unwrap_ring(&mut coords);
    // A ring that does not close after unwrapping encircles a pole; unwrapping
    // would open it, so it is kept as supplied.
    if let (Some(first), Some(last)) = (coords.first(), coords.last()) {
        if (first.x - last.x).abs() > 180.0 {
            return line.clone();
        }
    }
    LineString::new(coords)
}

/// Unwrap every ring; holes are shifted next to their exterior.
pub fn unwrap_polygon(polygon: &Polygon<f64>) -> Polygon<f64> {
    let exterior = unwrap_line(polygon.exterior());
    let anchor = exterior.0.first().map(|c| c.x).unwrap_or(0.0);
    let interiors = polygon
        .interiors()
        .iter()
        .map(|hole| {
            let mut hole = unwrap_line(hole);
            if let Some(first) = hole.0.first() {
                let shift = ((anchor - first.x) / 360.0).round() * 360.0;
                if shift != 0.0 {
                    for c in hole.0.iter_mut() {
                        c.x += shift;
                    }
                }
            }
            hole
        })
        .collect();
    Polygon::new(exterior, interiors)
}

pub fn unwrap_multipolygon(shape: &MultiPolygon<f64>) -> MultiPolygon<f64> {
    MultiPolygon::new(shape.iter().map(unwrap_polygon).collect())
}

fn ring_is_usable(line: &LineString<f64>) -> bool {
    line.0.len() >= 4
        && line
            .0
            .iter()
            .all(|c| c.x.is_finite() && c.y.is_finite() && (-90.0..=90.0).contains(&c.y))
}

/// Drop parts and holes that cannot be drawn. `None` when nothing remains.
pub fn sanitize(shape: &MultiPolygon<f64>) -> Option<MultiPolygon<f64>> {
    let polygons: Vec<Polygon<f64>> = shape
        .iter()
        .filter(|p| ring_is_usable(p.exterior()))
        .map(|p| {
            let holes = p.interiors().iter().filter(|h| ring_is_usable(h)).cloned().collect();
            Polygon::new(p.exterior().clone(), holes)
        })
        .collect();
    if polygons.is_empty() {
        None
    } else {
        Some(MultiPolygon::new(polygons))
    }
}

/// Input record for building a store: a game entity or an LOD tier feature.
#[derive(Debug, Clone)]
pub struct GeometryFeature {
    pub id: EntityId,
    pub shape: Option<MultiPolygon<f64>>,
    pub centroid: Option<GeoCoord>,
    pub neighbors: Vec<EntityId>,
    /// Entity (or group) this feature belongs to, for tiers other than the entity tier.
    pub parent: Option<EntityId>,
}

impl GeometryFeature {
    pub fn new(id: EntityId, shape: Option<MultiPolygon<f64>>) -> Self {
        Self {
            id,
            shape,
            centroid: None,
            neighbors: Vec::new(),
            parent: None,
        }
    }

    pub fn with_parent(mut self, parent: EntityId) -> Self {
        self.parent = Some(parent);
        self
    }
}

impl From<&GeographicEntity> for GeometryFeature {
    fn from(entity: &GeographicEntity) -> Self {
        Self {
            id: entity.id.clone(),
            shape: entity.geometry.clone(),
            centroid: entity.centroid,
            neighbors: entity.neighbors.clone(),
            parent: entity.group.clone(),
        }
    }
}

/// Preprocessed geometry of one feature.
#[derive(Debug, Clone)]
pub struct EntityGeometry {
    pub id: EntityId,
    /// `None` for missing or malformed geometry: skipped by drawing and hit-testing.
    pub shape: Option<MultiPolygon<f64>>,
    pub bounds: Option<Rect<f64>>,
    pub centroid: GeoCoord,
    pub neighbors: Vec<EntityId>,
    pub parent: Option<EntityId>,
    pub vertex_count: usize,
}

impl EntityGeometry {
    fn build(feature: GeometryFeature) -> Self {
        let shape = match feature.shape.as_ref().and_then(sanitize) {
            Some(clean) => Some(unwrap_multipolygon(&clean)),
            None => {
                tracing::warn!("Skipping geometry for {}: missing or malformed", feature.id);
                None
            }
        };
        let bounds = shape.as_ref().and_then(|s| s.bounding_rect());
        let centroid = feature
            .centroid
            .filter(GeoCoord::is_valid)
            .or_else(|| {
                shape
                    .as_ref()
                    .and_then(|s| s.centroid())
                    .map(|p| GeoCoord::new(p.x(), p.y()).normalized())
            })
            .unwrap_or_default();
        let vertex_count = shape
            .as_ref()
            .map(|s| {
                s.iter()
                    .map(|p| p.exterior().0.len() + p.interiors().iter().map(|h| h.0.len()).sum::<usize>())
                    .sum()
            })
            .unwrap_or(0);

        Self {
            id: feature.id,
            shape,
            bounds,
            centroid,
            neighbors: feature.neighbors,
            parent: feature.parent,
            vertex_count,
        }
    }

    /// Point-in-polygon test honoring holes and multiple parts. Date-line
    /// geometry is unwrapped past ±180, so the point is also tried shifted by 360.
    pub fn contains(&self, coord: GeoCoord) -> bool {
        let (Some(shape), Some(bounds)) = (&self.shape, &self.bounds) else {
            return false;
        };
        [0.0, 360.0, -360.0].iter().any(|shift| {
            let lon = coord.lon + shift;
            let min = bounds.min();
            let max = bounds.max();
            if lon < min.x || lon > max.x || coord.lat < min.y || coord.lat > max.y {
                return false;
            }
            shape.contains(&Point::new(lon, coord.lat))
        })
    }
}

/// All geometry for one feature set (entity tier or one LOD tier).
#[derive(Debug, Clone, Default)]
pub struct GeometryStore {
    entries: Vec<EntityGeometry>,
    index: AHashMap<EntityId, usize>,
    generation: u64,
}

impl GeometryStore {
    pub fn from_features(features: impl IntoIterator<Item = GeometryFeature>) -> Self {
        let entries: Vec<EntityGeometry> = features.into_iter().map(EntityGeometry::build).collect();
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id.clone(), i))
            .collect();
        let store = Self {
            entries,
            index,
            generation: next_generation(),
        };
        tracing::debug!(
            "Built geometry store gen {}: {} features, {} vertices",
            store.generation,
            store.entries.len(),
            store.total_vertices()
        );
        store
    }

    pub fn from_entities(entities: &[GeographicEntity]) -> Self {
        Self::from_features(entities.iter().map(GeometryFeature::from))
    }

    pub fn get(&self, id: &EntityId) -> Option<&EntityGeometry> {
        self.index.get(id).map(|&i| &self.entries[i])
    }

    pub fn index_of(&self, id: &EntityId) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn entry(&self, index: usize) -> Option<&EntityGeometry> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityGeometry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Unique per constructed store; never zero.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn total_vertices(&self) -> usize {
        self.entries.iter().map(|e| e.vertex_count).sum()
    }
}
