//! World data: entities, factions, relations and their preprocessed geometry

pub mod entity;
pub mod geometry;
pub mod loader;
pub mod snapshot;

pub use entity::{
    City, DiplomaticRelation, EntityAttributes, EntityGroup, Faction, GeographicEntity, RelationKind,
};
pub use geometry::{unwrap_ring, EntityGeometry, GeometryFeature, GeometryStore};
pub use loader::{load_world, parse_tier_features, parse_world};
pub use snapshot::{OwnershipUpdate, WorldSnapshot};
