//! Load world snapshots and level-of-detail feature files from JSON
//!
//! Geometry uses GeoJSON `Polygon` / `MultiPolygon` objects. Geometry that
//! fails to parse does not fail the load: the entity is kept without a shape
//! and is skipped by drawing and hit-testing.

use geo_types::{Coord, LineString, MultiPolygon, Polygon};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

use crate::core::error::Result;
use crate::core::types::{EntityId, FactionId, GeoCoord};
use crate::lod::LodTier;
use crate::theme::Color;
use crate::world::entity::{
    City, DiplomaticRelation, EntityAttributes, EntityGroup, Faction, GeographicEntity, RelationKind,
};
use crate::world::geometry::GeometryFeature;
use crate::world::snapshot::WorldSnapshot;

#[derive(Debug, Deserialize)]
struct WorldFile {
    #[serde(default)]
    factions: Vec<FactionJson>,
    #[serde(default)]
    relations: Vec<RelationJson>,
    entities: Vec<EntityJson>,
    #[serde(default)]
    groups: Vec<GroupJson>,
}

#[derive(Debug, Deserialize)]
struct FactionJson {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    color: String,
}

#[derive(Debug, Deserialize)]
struct RelationJson {
    a: String,
    b: String,
    #[serde(default)]
    kind: RelationKind,
}

#[derive(Debug, Deserialize)]
struct EntityJson {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    geometry: Value,
    #[serde(default)]
    centroid: Option<[f64; 2]>,
    #[serde(default)]
    neighbors: Vec<String>,
    #[serde(default)]
    owner: Option<String>,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    attributes: EntityAttributes,
    #[serde(default)]
    group: Option<String>,
    #[serde(default)]
    cities: Vec<City>,
}

#[derive(Debug, Deserialize)]
struct GroupJson {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    geometry: Value,
}

#[derive(Debug, Deserialize)]
struct TierFile {
    tier: LodTier,
    features: Vec<FeatureJson>,
}

#[derive(Debug, Deserialize)]
struct FeatureJson {
    id: String,
    #[serde(default)]
    parent: Option<String>,
    #[serde(default)]
    geometry: Value,
    #[serde(default)]
    centroid: Option<[f64; 2]>,
}

fn parse_position(value: &Value) -> std::result::Result<Coord<f64>, String> {
    let pair = value.as_array().ok_or("position is not an array")?;
    match (pair.first().and_then(Value::as_f64), pair.get(1).and_then(Value::as_f64)) {
        (Some(x), Some(y)) => Ok(Coord { x, y }),
        _ => Err("position needs two numbers".into()),
    }
}

fn parse_ring(value: &Value) -> std::result::Result<LineString<f64>, String> {
    let points = value.as_array().ok_or("ring is not an array")?;
    let coords = points.iter().map(parse_position).collect::<std::result::Result<Vec<_>, _>>()?;
    if coords.len() < 3 {
        return Err(format!("ring has {} positions", coords.len()));
    }
    Ok(LineString::new(coords))
}

fn parse_polygon(value: &Value) -> std::result::Result<Polygon<f64>, String> {
    let rings = value.as_array().ok_or("polygon is not an array of rings")?;
    let mut rings = rings.iter().map(parse_ring);
    let exterior = rings.next().ok_or("polygon has no rings")??;
    let holes = rings.collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(Polygon::new(exterior, holes))
}

/// Parse a GeoJSON `Polygon` or `MultiPolygon` geometry object.
pub fn parse_geometry(value: &Value) -> std::result::Result<MultiPolygon<f64>, String> {
    let kind = value.get("type").and_then(Value::as_str).ok_or("geometry has no type")?;
    let coordinates = value.get("coordinates").ok_or("geometry has no coordinates")?;
    match kind {
        "Polygon" => Ok(MultiPolygon::new(vec![parse_polygon(coordinates)?])),
        "MultiPolygon" => {
            let parts = coordinates.as_array().ok_or("multipolygon is not an array")?;
            let polygons = parts.iter().map(parse_polygon).collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(MultiPolygon::new(polygons))
        }
        other => Err(format!("unsupported geometry type {other}")),
    }
}

/// Parse geometry, logging and dropping it on failure.
fn geometry_or_skip(id: &str, value: &Value) -> Option<MultiPolygon<f64>> {
    if value.is_null() {
        tracing::debug!("Entity {} has no geometry", id);
        return None;
    }
    match parse_geometry(value) {
        Ok(shape) => Some(shape),
        Err(reason) => {
            tracing::warn!("Malformed geometry for {}: {}", id, reason);
            None
        }
    }
}

/// Parse a world snapshot from a JSON string.
pub fn parse_world(json: &str) -> Result<WorldSnapshot> {
    let file: WorldFile = serde_json::from_str(json)?;

    let factions: Vec<Faction> = file
        .factions
        .into_iter()
        .map(|f| Faction {
            name: f.name.unwrap_or_else(|| f.id.clone()),
            color: Color::parse_or_neutral(&f.color),
            id: FactionId::new(f.id),
        })
        .collect();

    let relations = file
        .relations
        .into_iter()
        .map(|r| DiplomaticRelation::new(r.a, r.b, r.kind))
        .collect();

    let mut skipped = 0;
    let entities: Vec<GeographicEntity> = file
        .entities
        .into_iter()
        .map(|e| {
            let geometry = geometry_or_skip(&e.id, &e.geometry);
            if geometry.is_none() {
                skipped += 1;
            }
            GeographicEntity {
                name: e.name.unwrap_or_else(|| e.id.clone()),
                geometry,
                centroid: e.centroid.map(|[lon, lat]| GeoCoord::new(lon, lat)),
                neighbors: e.neighbors.into_iter().map(EntityId::new).collect(),
                owner: e.owner.map(FactionId::new),
                base_color: e.color.as_deref().map(Color::parse_or_neutral).unwrap_or_default(),
                attributes: e.attributes,
                group: e.group.map(EntityId::new),
                cities: e.cities,
                id: EntityId::new(e.id),
            }
        })
        .collect();

    let groups = file
        .groups
        .into_iter()
        .map(|g| EntityGroup {
            name: g.name.unwrap_or_else(|| g.id.clone()),
            geometry: geometry_or_skip(&g.id, &g.geometry),
            id: EntityId::new(g.id),
        })
        .collect::<Vec<_>>();

    tracing::info!(
        "Loaded world: {} entities ({} without geometry), {} factions, {} groups",
        entities.len(),
        skipped,
        factions.len(),
        groups.len()
    );

    Ok(WorldSnapshot::new(entities, factions, relations).with_groups(groups))
}

/// Load a world snapshot from a JSON file on disk.
pub fn load_world(path: &Path) -> Result<WorldSnapshot> {
    let content = std::fs::read_to_string(path)?;
    parse_world(&content)
}

/// Parse a tier feature file: `{ "tier": "subregion", "features": [...] }`.
pub fn parse_tier_features(json: &str) -> Result<(LodTier, Vec<GeometryFeature>)> {
    let file: TierFile = serde_json::from_str(json)?;
    let features = file
        .features
        .into_iter()
        .map(|f| GeometryFeature {
            shape: geometry_or_skip(&f.id, &f.geometry),
            centroid: f.centroid.map(|[lon, lat]| GeoCoord::new(lon, lat)),
            neighbors: Vec::new(),
            parent: f.parent.map(EntityId::new),
            id: EntityId::new(f.id),
        })
        .collect();
    Ok((file.tier, features))
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORLD: &str = r##"{
        "factions": [
            {"id": "a", "name": "Azure", "color": "#0000ff"},
            {"id": "b", "color": "not-a-color"}
        ],
        "relations": [{"a": "a", "b": "b", "kind": "hostile"}],
        "groups": [{"id": "g", "name": "Greater"}],
        "entities": [
            {
                "id": "alpha",
                "name": "Alpha",
                "geometry": {"type": "Polygon", "coordinates": [[[0,0],[10,0],[10,10],[0,10],[0,0]]]},
                "neighbors": ["beta"],
                "owner": "a",
                "group": "g",
                "attributes": {"population": 12000000},
                "cities": [{"name": "Alphaville", "coord": {"lon": 5, "lat": 5}, "capital": true}]
            },
            {
                "id": "beta",
                "geometry": {"type": "MultiPolygon", "coordinates": [
                    [[[10,0],[20,0],[20,10],[10,10],[10,0]]],
                    [[[30,0],[31,0],[31,1],[30,0]]]
                ]},
                "centroid": [15, 5]
            },
            {"id": "broken", "geometry": {"type": "Point", "coordinates": [1, 2]}}
        ]
    }"##;

    #[test]
    fn test_parse_world() {
        let world = parse_world(WORLD).unwrap();
        assert_eq!(world.entities().len(), 3);
        assert_eq!(world.factions().len(), 2);

        let alpha = world.entity(&EntityId::from("alpha")).unwrap();
        assert_eq!(alpha.owner, Some(FactionId::from("a")));
        assert_eq!(alpha.attributes.population, 12_000_000);
        assert!(alpha.cities[0].capital);
        assert_eq!(alpha.group, Some(EntityId::from("g")));

        let beta = world.entity(&EntityId::from("beta")).unwrap();
        assert_eq!(beta.name, "beta");
        assert_eq!(beta.geometry.as_ref().unwrap().0.len(), 2);
        assert_eq!(beta.centroid, Some(GeoCoord::new(15.0, 5.0)));

        assert!(world.entity(&EntityId::from("broken")).unwrap().geometry.is_none());
        assert_eq!(world.relation(&FactionId::from("b"), &FactionId::from("a")), RelationKind::Hostile);
        assert_eq!(world.group(&EntityId::from("g")).unwrap().name, "Greater");
    }

    #[test]
    fn test_bad_faction_color_is_gray() {
        let world = parse_world(WORLD).unwrap();
        let b = world.faction(&FactionId::from("b")).unwrap();
        assert_eq!(b.color, Color::NEUTRAL_GRAY);
        assert_eq!(b.name, "b");
    }

    #[test]
    fn test_parse_geometry_rejects_bad_rings() {
        let value: Value = serde_json::from_str(r#"{"type":"Polygon","coordinates":[[[0,0],[1,"x"]]]}"#).unwrap();
        assert!(parse_geometry(&value).is_err());
        let value: Value = serde_json::from_str(r#"{"type":"Polygon","coordinates":[]}"#).unwrap();
        assert!(parse_geometry(&value).is_err());
    }

    #[test]
    fn test_parse_tier_features() {
        let (tier, features) = parse_tier_features(
            r#"{"tier": "subregion", "features": [
                {"id": "alpha-n", "parent": "alpha", "geometry": {"type": "Polygon", "coordinates": [[[0,5],[10,5],[10,10],[0,10],[0,5]]]}}
            ]}"#,
        )
        .unwrap();
        assert_eq!(tier, LodTier::Subregion);
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].parent, Some(EntityId::from("alpha")));
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(parse_world("{ not json").is_err());
    }
}
