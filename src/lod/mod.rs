//! Level-of-detail tiers for the flat map
//!
//! Three complete geometry sets (country, region, sub-region) cross-fade by
//! zoom. The region tier is the entity tier: one feature per game entity, and
//! the one hit-testing always uses. The country tier merges grouped entities;
//! the sub-region tier is fetched lazily the first time the camera zooms in
//! far enough.

pub mod source;

pub use source::{FnTierSource, JsonTierSource, LodLoader, TierSource};

use geo_types::MultiPolygon;
use serde::{Deserialize, Serialize};

use crate::core::config::LodConfig;
use crate::core::types::{EntityId, FactionId};
use crate::world::geometry::{GeometryFeature, GeometryStore};
use crate::world::snapshot::WorldSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LodTier {
    Country = 0,
    Region = 1,
    Subregion = 2,
}

impl LodTier {
    pub const ALL: [LodTier; 3] = [Self::Country, Self::Region, Self::Subregion];

    pub fn index(self) -> usize {
        self as usize
    }
}

fn ramp(zoom: f32, start: f32, end: f32) -> f32 {
    if end <= start {
        return if zoom >= end { 1.0 } else { 0.0 };
    }
    ((zoom - start) / (end - start)).clamp(0.0, 1.0)
}

/// Opacity of each tier at `zoom`, indexed by [`LodTier::index`].
///
/// Adjacent tiers cross-fade over the configured windows and the three values
/// always sum to 1. Until the sub-region tier is loaded its share stays with
/// the region tier.
pub fn tier_opacities(zoom: f32, config: &LodConfig, subregion_loaded: bool) -> [f32; 3] {
    let region = ramp(zoom, config.region_fade_start, config.region_fade_end);
    let subregion = if subregion_loaded {
        ramp(zoom, config.subregion_fade_start, config.subregion_fade_end)
    } else {
        0.0
    };
    [1.0 - region, region - subregion, subregion]
}

/// Ownership of a higher-level grouping across its members.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupOwnership {
    /// Every member has the same owner (or every member is neutral).
    Uniform(Option<FactionId>),
    Mixed,
}

pub fn group_owner(group: &EntityId, snapshot: &WorldSnapshot) -> GroupOwnership {
    let mut members = snapshot.group_members(group);
    let Some(first) = members.next() else {
        return GroupOwnership::Uniform(None);
    };
    let owner = first.owner.as_ref();
    if members.all(|m| m.owner.as_ref() == owner) {
        GroupOwnership::Uniform(owner.cloned())
    } else {
        GroupOwnership::Mixed
    }
}

/// Geometry for all tiers. A tier feature's `parent` names the entity whose
/// fill it takes; country-tier group features have no parent and take the
/// group's fill.
#[derive(Debug, Clone, Default)]
pub struct LodTiers {
    country: Option<GeometryStore>,
    region: GeometryStore,
    subregion: Option<GeometryStore>,
}

impl LodTiers {
    pub fn build(snapshot: &WorldSnapshot) -> Self {
        let region = GeometryStore::from_entities(snapshot.entities());
        let country = Self::build_country(snapshot);
        Self {
            country,
            region,
            subregion: None,
        }
    }

    /// `None` when no entity belongs to a group: the country tier would
    /// duplicate the region tier.
    fn build_country(snapshot: &WorldSnapshot) -> Option<GeometryStore> {
        if snapshot.entities().iter().all(|e| e.group.is_none()) {
            return None;
        }

        let mut seen: Vec<&EntityId> = Vec::new();
        let mut features = Vec::new();
        for entity in snapshot.entities() {
            match &entity.group {
                None => {
                    let mut feature = GeometryFeature::from(entity);
                    feature.parent = Some(entity.id.clone());
                    features.push(feature);
                }
                Some(group) if !seen.contains(&group) => {
                    seen.push(group);
                    let shape = snapshot
                        .group(group)
                        .and_then(|g| g.geometry.clone())
                        .or_else(|| {
                            let parts: Vec<_> = snapshot
                                .group_members(group)
                                .filter_map(|m| m.geometry.as_ref())
                                .flat_map(|g| g.0.iter().cloned())
                                .collect();
                            (!parts.is_empty()).then(|| MultiPolygon::new(parts))
                        });
                    let mut feature = GeometryFeature::new(group.clone(), shape);
                    feature.parent = None;
                    features.push(feature);
                }
                Some(_) => {}
            }
        }
        Some(GeometryStore::from_features(features))
    }

    pub fn store(&self, tier: LodTier) -> Option<&GeometryStore> {
        match tier {
            LodTier::Country => self.country.as_ref(),
            LodTier::Region => Some(&self.region),
            LodTier::Subregion => self.subregion.as_ref(),
        }
    }

    /// The entity tier.
    pub fn region(&self) -> &GeometryStore {
        &self.region
    }

    pub fn has_subregions(&self) -> bool {
        self.subregion.is_some()
    }

    pub fn set_subregions(&mut self, features: Vec<GeometryFeature>) {
        let store = GeometryStore::from_features(features);
        tracing::info!("Sub-region tier ready: {} features", store.len());
        self.subregion = Some(store);
    }

    /// Store generations per tier, zero for absent tiers.
    pub fn generations(&self) -> [u64; 3] {
        LodTier::ALL.map(|t| self.store(t).map(GeometryStore::generation).unwrap_or(0))
    }

    /// Opacities with the share of any absent tier folded into the region tier.
    pub fn opacities(&self, zoom: f32, config: &LodConfig) -> [f32; 3] {
        let mut o = tier_opacities(zoom, config, self.has_subregions());
        if self.country.is_none() {
            o[1] += o[0];
            o[0] = 0.0;
        }
        o
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::Color;
    use crate::world::entity::{Faction, GeographicEntity};
    use geo_types::polygon;

    fn square(x: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: x, y: 0.0),
            (x: x + 1.0, y: 0.0),
            (x: x + 1.0, y: 1.0),
            (x: x, y: 1.0),
        ]])
    }

    fn grouped_world() -> WorldSnapshot {
        WorldSnapshot::new(
            vec![
                GeographicEntity::new("n", "North", square(0.0)).with_group("land").with_owner("a"),
                GeographicEntity::new("s", "South", square(1.0)).with_group("land").with_owner("a"),
                GeographicEntity::new("isle", "Isle", square(5.0)),
            ],
            vec![Faction::new("a", "A", Color::WHITE)],
            Vec::new(),
        )
    }

    #[test]
    fn test_opacities_sum_to_one() {
        let config = LodConfig::default();
        for i in 0..100 {
            let zoom = 1.0 + i as f32 * 0.1;
            for loaded in [false, true] {
                let sum: f32 = tier_opacities(zoom, &config, loaded).iter().sum();
                assert!((sum - 1.0).abs() < 1e-6, "zoom {zoom} sum {sum}");
            }
        }
    }

    #[test]
    fn test_crossfade_window() {
        let config = LodConfig::default();
        assert_eq!(tier_opacities(2.0, &config, true), [1.0, 0.0, 0.0]);
        let mid = tier_opacities(3.25, &config, true);
        assert!((mid[0] - 0.5).abs() < 1e-6 && (mid[1] - 0.5).abs() < 1e-6);
        assert_eq!(tier_opacities(10.0, &config, true), [0.0, 0.0, 1.0]);
        assert_eq!(tier_opacities(10.0, &config, false), [0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_group_ownership() {
        let mut world = grouped_world();
        let land = EntityId::from("land");
        assert_eq!(group_owner(&land, &world), GroupOwnership::Uniform(Some(FactionId::from("a"))));
        world.set_owner(&EntityId::from("s"), None);
        assert_eq!(group_owner(&land, &world), GroupOwnership::Mixed);
    }

    #[test]
    fn test_country_tier_merges_groups() {
        let tiers = LodTiers::build(&grouped_world());
        let country = tiers.store(LodTier::Country).unwrap();
        assert_eq!(country.len(), 2);
        let land = country.get(&EntityId::from("land")).unwrap();
        assert_eq!(land.shape.as_ref().unwrap().0.len(), 2);
        assert!(land.parent.is_none());
        let isle = country.get(&EntityId::from("isle")).unwrap();
        assert_eq!(isle.parent, Some(EntityId::from("isle")));
        assert_eq!(tiers.region().len(), 3);
    }

    #[test]
    fn test_ungrouped_world_folds_country_share() {
        let world = WorldSnapshot::new(
            vec![GeographicEntity::new("a", "A", square(0.0))],
            Vec::new(),
            Vec::new(),
        );
        let tiers = LodTiers::build(&world);
        assert!(tiers.store(LodTier::Country).is_none());
        assert_eq!(tiers.opacities(1.0, &LodConfig::default()), [0.0, 1.0, 0.0]);
        assert_eq!(tiers.generations()[0], 0);
    }
}
