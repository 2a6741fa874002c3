//! Entity, faction and diplomacy records supplied by the turn engine.
//!
//! The renderer never mutates these except through the ownership update
//! path on [`crate::world::WorldSnapshot`].

use geo_types::MultiPolygon;
use serde::{Deserialize, Serialize};

use crate::core::types::{EntityId, FactionId, GeoCoord};
use crate::theme::Color;

/// Numeric attributes used only for display thresholds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityAttributes {
    pub population: u64,
    pub defense: f32,
    pub economy: f32,
    pub technology: f32,
}

/// A settlement drawn as a marker once the camera is close enough.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub name: String,
    pub coord: GeoCoord,
    #[serde(default)]
    pub population: u64,
    #[serde(default)]
    pub capital: bool,
}

/// One country or province.
#[derive(Debug, Clone)]
pub struct GeographicEntity {
    pub id: EntityId,
    pub name: String,
    /// Raw geometry as supplied; `None` when missing or unparseable.
    pub geometry: Option<MultiPolygon<f64>>,
    /// Precomputed centroid; derived from geometry when absent.
    pub centroid: Option<GeoCoord>,
    pub neighbors: Vec<EntityId>,
    pub owner: Option<FactionId>,
    pub base_color: Color,
    pub attributes: EntityAttributes,
    /// Higher-level grouping (e.g. the country a province belongs to).
    pub group: Option<EntityId>,
    pub cities: Vec<City>,
}

impl GeographicEntity {
    /// Minimal neutral entity, mostly for tests and procedural worlds.
    pub fn new(id: impl Into<String>, name: impl Into<String>, geometry: MultiPolygon<f64>) -> Self {
        Self {
            id: EntityId::new(id),
            name: name.into(),
            geometry: Some(geometry),
            centroid: None,
            neighbors: Vec::new(),
            owner: None,
            base_color: Color::NEUTRAL_GRAY,
            attributes: EntityAttributes::default(),
            group: None,
            cities: Vec::new(),
        }
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(FactionId::new(owner));
        self
    }

    pub fn with_neighbors(mut self, neighbors: &[&str]) -> Self {
        self.neighbors = neighbors.iter().map(|n| EntityId::from(*n)).collect();
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(EntityId::new(group));
        self
    }

    pub fn with_population(mut self, population: u64) -> Self {
        self.attributes.population = population;
        self
    }
}

/// Higher-level grouping of entities (e.g. a country made of provinces),
/// drawn as one region at the coarsest level of detail.
#[derive(Debug, Clone)]
pub struct EntityGroup {
    pub id: EntityId,
    pub name: String,
    /// Outline of the whole group. When absent the members' parts are drawn together.
    pub geometry: Option<MultiPolygon<f64>>,
}

impl EntityGroup {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(id),
            name: name.into(),
            geometry: None,
        }
    }
}

/// A playable or AI faction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Faction {
    pub id: FactionId,
    pub name: String,
    pub color: Color,
}

impl Faction {
    pub fn new(id: impl Into<String>, name: impl Into<String>, color: Color) -> Self {
        Self {
            id: FactionId::new(id),
            name: name.into(),
            color,
        }
    }
}

/// Relationship between two factions, used only for border styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
    #[default]
    Neutral,
    Friendly,
    Allied,
    Hostile,
    War,
}

impl RelationKind {
    /// Overlay precedence when an entity borders several related factions.
    /// Zero means no overlay is drawn.
    pub fn overlay_priority(&self) -> u8 {
        match self {
            Self::Neutral | Self::Friendly => 0,
            Self::Allied => 1,
            Self::Hostile => 2,
            Self::War => 3,
        }
    }
}

/// Unordered faction pair with a relationship kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiplomaticRelation {
    pub a: FactionId,
    pub b: FactionId,
    pub kind: RelationKind,
}

impl DiplomaticRelation {
    pub fn new(a: impl Into<String>, b: impl Into<String>, kind: RelationKind) -> Self {
        Self {
            a: FactionId::new(a),
            b: FactionId::new(b),
            kind,
        }
    }
}
