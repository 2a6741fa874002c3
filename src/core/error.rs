use thiserror::Error;

use crate::core::types::EntityId;
use crate::lod::LodTier;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Malformed geometry for entity {id}: {reason}")]
    MalformedGeometry { id: EntityId, reason: String },

    #[error("Entity not found: {0}")]
    UnknownEntity(EntityId),

    #[error("Failed to fetch {tier:?} tier: {reason}")]
    TierFetch { tier: LodTier, reason: String },

    #[error("GPU error: {0}")]
    Gpu(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
