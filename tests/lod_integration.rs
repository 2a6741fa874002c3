//! Integration tests for level-of-detail tiers: cross-fading, lazy fetching
//! of the sub-region tier and the group-derived country tier.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use geo_types::{polygon, MultiPolygon};

use warmap::core::error::{EngineError, Result};
use warmap::core::types::{EntityId, GeoCoord, PresentationMode, Viewport};
use warmap::core::EngineConfig;
use warmap::engine::MapEngine;
use warmap::lod::{FnTierSource, LodTier};
use warmap::render::{DrawCommand, DrawLayer};
use warmap::theme::Color;
use warmap::world::{Faction, GeographicEntity, GeometryFeature, WorldSnapshot};

fn rect(lon0: f64, lat0: f64, lon1: f64, lat1: f64) -> MultiPolygon<f64> {
    MultiPolygon::new(vec![polygon![
        (x: lon0, y: lat0),
        (x: lon1, y: lat0),
        (x: lon1, y: lat1),
        (x: lon0, y: lat1),
    ]])
}

fn create_test_world(grouped: bool) -> WorldSnapshot {
    let mut west = GeographicEntity::new("west", "West", rect(0.0, 40.0, 10.0, 50.0)).with_owner("a");
    let mut east = GeographicEntity::new("east", "East", rect(10.0, 40.0, 20.0, 50.0)).with_owner("a");
    if grouped {
        west = west.with_group("realm");
        east = east.with_group("realm");
    }
    WorldSnapshot::new(
        vec![west, east, GeographicEntity::new("isle", "Isle", rect(-30.0, 0.0, -25.0, 5.0))],
        vec![Faction::new("a", "Azure", Color::rgb(0.1, 0.3, 0.9))],
        Vec::new(),
    )
}

fn subregion_features() -> Vec<GeometryFeature> {
    vec![
        GeometryFeature::new(EntityId::from("west-n"), Some(rect(0.0, 45.0, 10.0, 50.0)))
            .with_parent(EntityId::from("west")),
        GeometryFeature::new(EntityId::from("west-s"), Some(rect(0.0, 40.0, 10.0, 45.0)))
            .with_parent(EntityId::from("west")),
    ]
}

fn engine(grouped: bool) -> MapEngine {
    MapEngine::new(
        EngineConfig::default(),
        create_test_world(grouped),
        PresentationMode::Flat,
        Viewport::new(1280.0, 720.0),
    )
    .expect("default config is valid")
}

fn zoom_to(engine: &mut MapEngine, zoom: f32) {
    engine.view_mut().fly_to(GeoCoord::new(5.0, 45.0), zoom);
    engine.view_mut().settle();
}

fn fills_in_tier(engine: &MapEngine, tier: LodTier) -> usize {
    engine
        .output()
        .surface
        .layer(DrawLayer::Fill)
        .filter(|cmd| matches!(cmd, DrawCommand::FillPath { path, color } if path.tier == tier && color.a > 0.0))
        .count()
}

#[test]
fn test_subregions_fetched_once_past_threshold() {
    let calls = Rc::new(Cell::new(0));
    let counter = calls.clone();
    let mut engine = engine(false);
    engine.attach_tier_source(Box::new(FnTierSource(move |tier: LodTier| -> Result<Vec<GeometryFeature>> {
        assert_eq!(tier, LodTier::Subregion);
        counter.set(counter.get() + 1);
        Ok(subregion_features())
    })));

    engine.frame(Duration::ZERO);
    assert_eq!(calls.get(), 0);
    assert!(!engine.tiers().has_subregions());

    zoom_to(&mut engine, 8.0);
    engine.frame(Duration::from_millis(16));
    assert_eq!(calls.get(), 1);
    assert!(engine.tiers().has_subregions());
    assert!(engine.path_cache().tier(LodTier::Subregion).is_some());
    assert_eq!(fills_in_tier(&engine, LodTier::Subregion), 2);

    engine.frame(Duration::from_millis(32));
    assert_eq!(calls.get(), 1);
}

#[test]
fn test_failed_fetch_retries_after_zooming_back_out() {
    let calls = Rc::new(Cell::new(0));
    let counter = calls.clone();
    let mut engine = engine(false);
    engine.attach_tier_source(Box::new(FnTierSource(move |tier: LodTier| -> Result<Vec<GeometryFeature>> {
        counter.set(counter.get() + 1);
        if counter.get() == 1 {
            Err(EngineError::TierFetch { tier, reason: "offline".into() })
        } else {
            Ok(subregion_features())
        }
    })));

    zoom_to(&mut engine, 8.0);
    engine.frame(Duration::ZERO);
    assert_eq!(calls.get(), 1);
    assert!(!engine.tiers().has_subregions());
    // The region tier keeps the whole share while the fetch is pending.
    assert!(fills_in_tier(&engine, LodTier::Region) >= 2);

    engine.frame(Duration::from_millis(16));
    assert_eq!(calls.get(), 1);

    zoom_to(&mut engine, 4.0);
    engine.frame(Duration::from_millis(32));
    zoom_to(&mut engine, 8.0);
    engine.frame(Duration::from_millis(48));
    assert_eq!(calls.get(), 2);
    assert!(engine.tiers().has_subregions());
}

#[test]
fn test_globe_mode_does_not_fetch() {
    let calls = Rc::new(Cell::new(0));
    let counter = calls.clone();
    let mut engine = engine(false);
    engine.attach_tier_source(Box::new(FnTierSource(move |_: LodTier| -> Result<Vec<GeometryFeature>> {
        counter.set(counter.get() + 1);
        Ok(subregion_features())
    })));
    engine.set_mode(PresentationMode::Globe);
    engine.view_mut().zoom_center(20.0);
    engine.view_mut().settle();
    engine.frame(Duration::ZERO);
    assert_eq!(calls.get(), 0);
}

#[test]
fn test_country_tier_only_with_groups() {
    let mut flat = engine(false);
    flat.frame(Duration::ZERO);
    assert!(flat.tiers().store(LodTier::Country).is_none());
    assert_eq!(fills_in_tier(&flat, LodTier::Country), 0);

    let mut grouped = engine(true);
    grouped.frame(Duration::ZERO);
    let country = grouped.tiers().store(LodTier::Country).expect("grouped world has a country tier");
    // The realm merges west and east; the isle stands alone.
    assert_eq!(country.len(), 2);
    assert!(country.get(&EntityId::from("realm")).is_some());
    assert!(fills_in_tier(&grouped, LodTier::Country) > 0);
}

#[test]
fn test_zoomed_in_hides_country_tier() {
    let mut engine = engine(true);
    zoom_to(&mut engine, 5.0);
    engine.frame(Duration::ZERO);
    assert_eq!(fills_in_tier(&engine, LodTier::Country), 0);
    assert!(fills_in_tier(&engine, LodTier::Region) >= 2);
}
