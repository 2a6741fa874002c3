//! Lazy fetching of the sub-region tier.

use std::path::PathBuf;

use super::LodTier;
use crate::core::error::{EngineError, Result};
use crate::world::geometry::GeometryFeature;
use crate::world::loader::parse_tier_features;

/// Supplies the features of a tier on demand.
pub trait TierSource {
    fn fetch(&mut self, tier: LodTier) -> Result<Vec<GeometryFeature>>;
}

/// Tier feature file on disk.
#[derive(Debug, Clone)]
pub struct JsonTierSource {
    pub path: PathBuf,
}

impl JsonTierSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TierSource for JsonTierSource {
    fn fetch(&mut self, tier: LodTier) -> Result<Vec<GeometryFeature>> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| EngineError::TierFetch {
            tier,
            reason: format!("{}: {}", self.path.display(), e),
        })?;
        let (found, features) = parse_tier_features(&content)?;
        if found != tier {
            return Err(EngineError::TierFetch {
                tier,
                reason: format!("{} holds the {:?} tier", self.path.display(), found),
            });
        }
        Ok(features)
    }
}

/// Adapter for closures, used by hosts that generate tiers in memory.
pub struct FnTierSource<F>(pub F);

impl<F> TierSource for FnTierSource<F>
where
    F: FnMut(LodTier) -> Result<Vec<GeometryFeature>>,
{
    fn fetch(&mut self, tier: LodTier) -> Result<Vec<GeometryFeature>> {
        (self.0)(tier)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadState {
    /// Will fetch on the next frame at or above the threshold.
    Armed,
    /// Last attempt failed; re-arms once zoom drops below the threshold.
    Failed,
    Loaded,
}

/// Fetches the sub-region tier the first time zoom crosses its threshold.
pub struct LodLoader {
    source: Option<Box<dyn TierSource>>,
    state: LoadState,
    attempts: u32,
}

impl Default for LodLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl LodLoader {
    pub fn new() -> Self {
        Self {
            source: None,
            state: LoadState::Armed,
            attempts: 0,
        }
    }

    pub fn attach(&mut self, source: Box<dyn TierSource>) {
        self.source = Some(source);
        self.state = LoadState::Armed;
    }

    /// Forget a loaded tier (new world) so it is fetched again.
    pub fn reset(&mut self) {
        self.state = LoadState::Armed;
    }

    pub fn is_loaded(&self) -> bool {
        self.state == LoadState::Loaded
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Called once per frame. Returns the features when a fetch succeeds.
    pub fn poll(&mut self, zoom: f32, threshold: f32) -> Option<Vec<GeometryFeature>> {
        if zoom < threshold {
            if self.state == LoadState::Failed {
                self.state = LoadState::Armed;
            }
            return None;
        }
        if self.state != LoadState::Armed {
            return None;
        }
        let source = self.source.as_mut()?;
        self.attempts += 1;
        match source.fetch(LodTier::Subregion) {
            Ok(features) => {
                tracing::info!("Fetched sub-region tier: {} features", features.len());
                self.state = LoadState::Loaded;
                Some(features)
            }
            Err(e) => {
                tracing::warn!("Sub-region tier unavailable, will retry on next zoom-in: {}", e);
                self.state = LoadState::Failed;
                None
            }
        }
    }
}
