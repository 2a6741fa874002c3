//! Presentation strategies.
//!
//! Flat and globe presentation share everything except how geography reaches
//! the screen: each view owns its camera, its projection and its path cache,
//! and turns the shared scene state into a [`FrameOutput`].

use glam::Vec2;
use std::time::Duration;

use super::{FrameOutput, GlobeScene};
use crate::animation::{HoverState, TransitionRegistry};
use crate::camera::flat::Transform2;
use crate::camera::{FlatCamera, OrbitCamera};
use crate::core::config::EngineConfig;
use crate::core::types::{EntityId, GeoCoord, PresentationMode, Viewport};
use crate::interaction::hit_test::{hit_test_flat, hit_test_globe, screen_to_geo_flat, screen_to_geo_globe};
use crate::lod::LodTiers;
use crate::projection::globe::geo_to_unit;
use crate::projection::{FlatProjection, FlatProjectionKind, Projection};
use crate::render::{compose_flat_frame, compose_globe_overlay, compose_surface, CacheKey, FrameContext, PathCache};
use crate::theme::Palette;
use crate::world::entity::RelationKind;
use crate::world::geometry::GeometryStore;
use crate::world::snapshot::WorldSnapshot;

/// Surface texture width at which globe strokes have their screen widths.
const GLOBE_LINE_REFERENCE_PX: f32 = 1440.0;

/// Shared, read-only state a frame is drawn from.
pub struct Scene<'a> {
    pub snapshot: &'a WorldSnapshot,
    pub tiers: &'a LodTiers,
    pub palette: &'a Palette,
    pub config: &'a EngineConfig,
    pub transitions: &'a TransitionRegistry,
    pub hover: &'a HoverState,
    pub selected: Option<&'a EntityId>,
    pub overlays: &'a [(EntityId, RelationKind)],
    pub now: Duration,
}

/// One way of presenting the map. Screen positions are window pixels.
pub trait MapView {
    fn mode(&self) -> PresentationMode;

    fn viewport(&self) -> Viewport;

    fn resize(&mut self, viewport: Viewport);

    /// Screen position of a coordinate, `None` when it is not visible.
    fn project(&self, coord: GeoCoord) -> Option<Vec2>;

    /// Geographic coordinate under a screen position.
    fn invert(&self, screen: Vec2) -> Option<GeoCoord>;

    /// Bring the path cache up to date. Returns true if it was rebuilt.
    fn build_path_cache(&mut self, tiers: &LodTiers) -> bool;

    fn path_cache(&self) -> &PathCache;

    /// Zoom used for LOD opacities and label thresholds.
    fn lod_zoom(&self) -> f32;

    /// Ease the camera toward its targets. Returns true while moving.
    fn update_camera(&mut self, dt: f32, now: Duration) -> bool;

    /// Jump the camera to its targets.
    fn settle(&mut self);

    fn pan(&mut self, delta: Vec2, immediate: bool);

    fn orbit(&mut self, delta: Vec2);

    fn zoom_at(&mut self, screen: Vec2, factor: f32);

    fn zoom_center(&mut self, factor: f32);

    fn fly_to(&mut self, coord: GeoCoord, desired_zoom: f32);

    fn note_interaction(&mut self, now: Duration);

    fn hit_test(&self, store: &GeometryStore, screen: Vec2) -> Option<EntityId>;

    fn draw_frame(&self, scene: &Scene, out: &mut FrameOutput);
}

/// Build the view for `mode`.
pub fn make_view(mode: PresentationMode, config: &EngineConfig, viewport: Viewport) -> Box<dyn MapView> {
    match mode {
        PresentationMode::Flat => Box::new(FlatView::new(config, viewport)),
        PresentationMode::Globe => Box::new(GlobeView::new(config, viewport)),
    }
}

fn frame_context<'a>(
    scene: &'a Scene,
    cache: &'a PathCache,
    cache_key: CacheKey,
    zoom: f32,
    transform: Transform2,
    target_size: Vec2,
    visible: Option<(Vec2, Vec2)>,
    line_scale: f32,
    anchor: &'a dyn Fn(GeoCoord) -> Option<Vec2>,
) -> FrameContext<'a> {
    FrameContext {
        snapshot: scene.snapshot,
        tiers: scene.tiers,
        cache,
        cache_key,
        palette: scene.palette,
        config: scene.config,
        transitions: scene.transitions,
        hover: scene.hover,
        selected: scene.selected,
        overlays: scene.overlays,
        now: scene.now,
        zoom,
        transform,
        target_size,
        visible,
        line_scale,
        anchor,
    }
}

// === FLAT ===

pub struct FlatView {
    kind: FlatProjectionKind,
    projection: FlatProjection,
    camera: FlatCamera,
    cache: PathCache,
}

impl FlatView {
    pub fn new(config: &EngineConfig, viewport: Viewport) -> Self {
        let projection = FlatProjection::fit(config.projection, viewport);
        let camera = FlatCamera::new(viewport, projection.map_size(), &config.camera);
        Self {
            kind: config.projection,
            projection,
            camera,
            cache: PathCache::new(),
        }
    }

    pub fn camera(&self) -> &FlatCamera {
        &self.camera
    }

    pub fn projection(&self) -> &FlatProjection {
        &self.projection
    }
}

impl MapView for FlatView {
    fn mode(&self) -> PresentationMode {
        PresentationMode::Flat
    }

    fn viewport(&self) -> Viewport {
        self.camera.viewport()
    }

    fn resize(&mut self, viewport: Viewport) {
        self.projection = FlatProjection::fit(self.kind, viewport);
        self.camera.set_viewport(viewport, self.projection.map_size());
    }

    fn project(&self, coord: GeoCoord) -> Option<Vec2> {
        self.projection
            .project(coord)
            .map(|p| self.camera.world_to_screen(p))
    }

    fn invert(&self, screen: Vec2) -> Option<GeoCoord> {
        screen_to_geo_flat(&self.camera, &self.projection, screen)
    }

    fn build_path_cache(&mut self, tiers: &LodTiers) -> bool {
        self.cache.ensure(&self.projection, tiers)
    }

    fn path_cache(&self) -> &PathCache {
        &self.cache
    }

    fn lod_zoom(&self) -> f32 {
        self.camera.zoom
    }

    fn update_camera(&mut self, dt: f32, _now: Duration) -> bool {
        self.camera.update(dt)
    }

    fn settle(&mut self) {
        self.camera.settle();
    }

    fn pan(&mut self, delta: Vec2, immediate: bool) {
        if immediate {
            self.camera.pan_immediate(delta);
        } else {
            self.camera.pan(delta);
        }
    }

    fn orbit(&mut self, delta: Vec2) {
        self.camera.pan_immediate(delta);
    }

    fn zoom_at(&mut self, screen: Vec2, factor: f32) {
        self.camera.zoom_at(screen, factor);
    }

    fn zoom_center(&mut self, factor: f32) {
        let center = self.camera.viewport().center();
        self.camera.zoom_at(center, factor);
    }

    fn fly_to(&mut self, coord: GeoCoord, desired_zoom: f32) {
        if let Some(world) = self.projection.project(coord) {
            self.camera.fly_to(world, desired_zoom);
        }
    }

    fn note_interaction(&mut self, _now: Duration) {}

    fn hit_test(&self, store: &GeometryStore, screen: Vec2) -> Option<EntityId> {
        hit_test_flat(&self.camera, &self.projection, store, screen)
    }

    fn draw_frame(&self, scene: &Scene, out: &mut FrameOutput) {
        out.reset(PresentationMode::Flat, self.viewport());
        let cache_key = CacheKey::new(&self.projection, scene.tiers);
        let transform = self.camera.transform();
        let projection = self.projection;
        let anchor = move |c: GeoCoord| projection.project(c).map(|p| transform.apply(p));
        let ctx = frame_context(
            scene,
            &self.cache,
            cache_key,
            self.camera.zoom,
            transform,
            self.viewport().size(),
            Some(self.camera.visible_bounds()),
            1.0,
            &anchor,
        );
        compose_flat_frame(&ctx, &mut out.surface);
    }
}

// === GLOBE ===

pub struct GlobeView {
    /// Equirectangular layout of the sphere's surface texture.
    surface: FlatProjection,
    camera: OrbitCamera,
    cache: PathCache,
    line_scale: f32,
}

impl GlobeView {
    pub fn new(config: &EngineConfig, viewport: Viewport) -> Self {
        let width = config.globe.texture_width.max(2) as f32;
        Self {
            surface: FlatProjection::new(FlatProjectionKind::Equirectangular, width),
            camera: OrbitCamera::new(viewport, &config.camera, &config.globe),
            cache: PathCache::new(),
            line_scale: (width / GLOBE_LINE_REFERENCE_PX).max(1.0),
        }
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn surface_projection(&self) -> &FlatProjection {
        &self.surface
    }
}

impl MapView for GlobeView {
    fn mode(&self) -> PresentationMode {
        PresentationMode::Globe
    }

    fn viewport(&self) -> Viewport {
        self.camera.viewport()
    }

    fn resize(&mut self, viewport: Viewport) {
        self.camera.set_viewport(viewport);
    }

    fn project(&self, coord: GeoCoord) -> Option<Vec2> {
        let p = geo_to_unit(coord);
        if !self.camera.is_front_facing(p) {
            return None;
        }
        self.camera.project_to_screen(p)
    }

    fn invert(&self, screen: Vec2) -> Option<GeoCoord> {
        screen_to_geo_globe(&self.camera, screen)
    }

    fn build_path_cache(&mut self, tiers: &LodTiers) -> bool {
        self.cache.ensure(&self.surface, tiers)
    }

    fn path_cache(&self) -> &PathCache {
        &self.cache
    }

    fn lod_zoom(&self) -> f32 {
        self.camera.lod_zoom()
    }

    fn update_camera(&mut self, dt: f32, now: Duration) -> bool {
        self.camera.update(dt, now)
    }

    fn settle(&mut self) {
        self.camera.settle();
    }

    fn pan(&mut self, delta: Vec2, _immediate: bool) {
        self.camera.orbit(delta);
    }

    fn orbit(&mut self, delta: Vec2) {
        self.camera.orbit(delta);
    }

    // Globe zoom is a dolly toward the center; the pointer position is ignored.
    fn zoom_at(&mut self, _screen: Vec2, factor: f32) {
        self.camera.zoom_by(factor);
    }

    fn zoom_center(&mut self, factor: f32) {
        self.camera.zoom_by(factor);
    }

    fn fly_to(&mut self, coord: GeoCoord, desired_zoom: f32) {
        self.camera.fly_to(coord, desired_zoom);
    }

    fn note_interaction(&mut self, now: Duration) {
        self.camera.note_interaction(now);
    }

    fn hit_test(&self, store: &GeometryStore, screen: Vec2) -> Option<EntityId> {
        hit_test_globe(&self.camera, store, screen)
    }

    fn draw_frame(&self, scene: &Scene, out: &mut FrameOutput) {
        out.reset(PresentationMode::Globe, self.viewport());
        let cache_key = CacheKey::new(&self.surface, scene.tiers);
        let surface = self.surface;
        let surface_anchor = move |c: GeoCoord| surface.project(c);
        let ctx = frame_context(
            scene,
            &self.cache,
            cache_key,
            self.camera.lod_zoom(),
            Transform2::IDENTITY,
            surface.map_size(),
            None,
            self.line_scale,
            &surface_anchor,
        );
        compose_surface(&ctx, &mut out.surface);

        let screen_anchor = |c: GeoCoord| self.project(c);
        compose_globe_overlay(&ctx, &mut out.overlay, &screen_anchor, self.viewport().size());

        out.globe = Some(GlobeScene {
            view_proj: self.camera.view_projection(),
            eye: self.camera.eye(),
            atmosphere: scene.palette.atmosphere,
            star: scene.palette.star,
            space: scene.palette.background.darken(0.35),
            surface_size: surface.map_size(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::entity::GeographicEntity;
    use geo_types::{polygon, MultiPolygon};

    fn box_around(lon: f64, lat: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: lon - 5.0, y: lat - 5.0),
            (x: lon + 5.0, y: lat - 5.0),
            (x: lon + 5.0, y: lat + 5.0),
            (x: lon - 5.0, y: lat + 5.0),
        ]])
    }

    fn tiers() -> LodTiers {
        let world = WorldSnapshot::new(
            vec![
                GeographicEntity::new("west", "West", box_around(-40.0, 10.0)),
                GeographicEntity::new("east", "East", box_around(40.0, -10.0)),
            ],
            Vec::new(),
            Vec::new(),
        );
        LodTiers::build(&world)
    }

    #[test]
    fn test_flat_project_invert_round_trip() {
        let view = FlatView::new(&EngineConfig::default(), Viewport::new(1000.0, 600.0));
        let coord = GeoCoord::new(12.5, -33.0);
        let screen = view.project(coord).unwrap();
        let back = view.invert(screen).unwrap();
        assert!((back.lon - coord.lon).abs() < 1e-3);
        assert!((back.lat - coord.lat).abs() < 1e-3);
    }

    #[test]
    fn test_views_hit_entity_at_projected_centroid() {
        let tiers = tiers();
        let config = EngineConfig::default();
        for mode in [PresentationMode::Flat, PresentationMode::Globe] {
            let mut view = make_view(mode, &config, Viewport::new(1000.0, 800.0));
            view.fly_to(GeoCoord::new(40.0, -10.0), 1.0);
            view.settle();
            let screen = view.project(GeoCoord::new(40.0, -10.0)).unwrap();
            assert_eq!(view.hit_test(tiers.region(), screen), Some(EntityId::from("east")), "{:?}", mode);
        }
    }

    #[test]
    fn test_globe_hides_far_side() {
        let mut view = GlobeView::new(&EngineConfig::default(), Viewport::new(800.0, 800.0));
        view.fly_to(GeoCoord::new(0.0, 0.0), 1.0);
        view.settle();
        assert!(view.project(GeoCoord::new(0.0, 0.0)).is_some());
        assert!(view.project(GeoCoord::new(180.0, 0.0)).is_none());
    }

    fn fills(view: &dyn MapView, world: &WorldSnapshot, tiers: &LodTiers) -> usize {
        let config = EngineConfig::default();
        let palette = Palette::classic();
        let transitions = TransitionRegistry::new(config.transitions.clone());
        let hover = HoverState::new(config.interaction.hover_fade_per_sec);
        let scene = Scene {
            snapshot: world,
            tiers,
            palette: &palette,
            config: &config,
            transitions: &transitions,
            hover: &hover,
            selected: None,
            overlays: &[],
            now: Duration::ZERO,
        };
        let mut out = FrameOutput::default();
        view.draw_frame(&scene, &mut out);
        out.surface.count(crate::render::DrawLayer::Fill)
    }

    #[test]
    fn test_stale_cache_is_not_drawn() {
        let world = WorldSnapshot::new(
            vec![GeographicEntity::new("west", "West", box_around(-40.0, 10.0))],
            Vec::new(),
            Vec::new(),
        );
        let built = LodTiers::build(&world);
        let replaced = LodTiers::build(&world);
        for mode in [PresentationMode::Flat, PresentationMode::Globe] {
            let mut view = make_view(mode, &EngineConfig::default(), Viewport::new(800.0, 600.0));
            view.build_path_cache(&built);
            assert_eq!(fills(view.as_ref(), &world, &built), 1, "{:?}", mode);
            // New geometry generation, cache not yet rebuilt.
            assert_eq!(fills(view.as_ref(), &world, &replaced), 0, "{:?}", mode);
            view.build_path_cache(&replaced);
            assert_eq!(fills(view.as_ref(), &world, &replaced), 1, "{:?}", mode);
        }
    }

    #[test]
    fn test_cache_rebuilt_on_resize_only() {
        let tiers = tiers();
        let mut view = FlatView::new(&EngineConfig::default(), Viewport::new(800.0, 600.0));
        assert!(view.build_path_cache(&tiers));
        assert!(!view.build_path_cache(&tiers));
        view.pan(Vec2::new(30.0, 0.0), true);
        assert!(!view.build_path_cache(&tiers));
        view.resize(Viewport::new(1200.0, 600.0));
        assert!(view.build_path_cache(&tiers));
    }
}
