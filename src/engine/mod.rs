//! The map engine: owns all mutable render and interaction state and turns
//! world snapshots plus input into frames.
//!
//! The host pushes world state in (`set_world`, `apply_ownership`,
//! `set_relations`), forwards input events, and calls [`MapEngine::frame`]
//! once per display refresh. Input only writes camera targets and hover
//! candidates; current values advance inside `frame`.

pub mod view;

pub use view::{make_view, FlatView, GlobeView, MapView, Scene};

use glam::{Mat4, Vec2, Vec3};
use std::time::Duration;

use crate::animation::{HoverState, TransitionRegistry};
use crate::core::config::EngineConfig;
use crate::core::error::{EngineError, Result};
use crate::core::types::{EntityId, GeoCoord, PresentationMode, Viewport};
use crate::interaction::{InputAction, InputDispatcher, InputEvent};
use crate::lod::{LodLoader, LodTiers, TierSource};
use crate::render::{relation_overlays, DrawList, PathCache, RenderMetrics};
use crate::theme::{Color, Palette, ThemeKind};
use crate::world::entity::{DiplomaticRelation, RelationKind};
use crate::world::snapshot::{OwnershipUpdate, WorldSnapshot};

/// Longest frame step fed to easing; longer gaps (window hidden) are clamped.
const MAX_FRAME_STEP: Duration = Duration::from_millis(100);

/// 3D parameters of a globe frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobeScene {
    pub view_proj: Mat4,
    pub eye: Vec3,
    pub atmosphere: Color,
    pub star: Color,
    /// Clear color behind the globe.
    pub space: Color,
    /// Pixel size of the surface texture canvas.
    pub surface_size: Vec2,
}

/// One composed frame. In flat mode `surface` is the whole screen; in globe
/// mode it is the sphere texture and `overlay` is drawn on top in screen space.
#[derive(Debug, Clone, Default)]
pub struct FrameOutput {
    pub mode: PresentationMode,
    pub viewport: Viewport,
    pub surface: DrawList,
    pub overlay: DrawList,
    pub globe: Option<GlobeScene>,
}

impl FrameOutput {
    fn reset(&mut self, mode: PresentationMode, viewport: Viewport) {
        self.mode = mode;
        self.viewport = viewport;
        self.surface.clear();
        self.overlay.clear();
        self.globe = None;
    }

    /// Every command of the frame, surface first.
    pub fn commands(&self) -> impl Iterator<Item = &crate::render::DrawItem> {
        self.surface.items().iter().chain(self.overlay.items())
    }
}

/// Selection change reported back to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionEvent {
    Selected(EntityId),
    Cleared,
}

/// Hover tooltip content.
#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    pub id: EntityId,
    pub name: String,
    pub owner: Option<String>,
    pub population: u64,
    /// Relation between the owner and the player faction, if both exist.
    pub relation: Option<RelationKind>,
}

/// The small projection of engine state a UI layer displays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewModel {
    pub hovered: Option<Tooltip>,
    pub selected: Option<EntityId>,
}

pub struct MapEngine {
    config: EngineConfig,
    palette: Palette,
    snapshot: WorldSnapshot,
    tiers: LodTiers,
    overlays: Vec<(EntityId, RelationKind)>,
    view: Box<dyn MapView>,
    input: InputDispatcher,
    hover: HoverState,
    transitions: TransitionRegistry,
    loader: LodLoader,
    selected: Option<EntityId>,
    output: FrameOutput,
    metrics: RenderMetrics,
    last_frame: Option<Duration>,
}

impl MapEngine {
    pub fn new(config: EngineConfig, snapshot: WorldSnapshot, mode: PresentationMode, viewport: Viewport) -> Result<Self> {
        config.validate()?;
        let palette = config.theme.palette();
        let tiers = LodTiers::build(&snapshot);
        let mut transitions = TransitionRegistry::new(config.transitions.clone());
        transitions.reset(&snapshot);
        let overlays = relation_overlays(&snapshot);
        tracing::info!(
            "Map engine: {} entities, {} factions, {:?} mode, {}x{}",
            snapshot.entities().len(),
            snapshot.factions().len(),
            mode,
            viewport.width,
            viewport.height
        );

        Ok(Self {
            view: make_view(mode, &config, viewport),
            input: InputDispatcher::new(&config.interaction, &config.camera, mode),
            hover: HoverState::new(config.interaction.hover_fade_per_sec),
            palette,
            snapshot,
            tiers,
            overlays,
            transitions,
            loader: LodLoader::new(),
            selected: None,
            output: FrameOutput::default(),
            metrics: RenderMetrics::new(),
            last_frame: None,
            config,
        })
    }

    // === WORLD STATE ===

    /// Replace the world wholesale. Caches rebuild on the next frame; no
    /// transitions are played for the new world.
    pub fn set_world(&mut self, snapshot: WorldSnapshot) {
        tracing::info!("Loading world: {} entities", snapshot.entities().len());
        self.tiers = LodTiers::build(&snapshot);
        self.transitions.reset(&snapshot);
        self.overlays = relation_overlays(&snapshot);
        self.loader.reset();
        self.hover.clear();
        if let Some(id) = &self.selected {
            if snapshot.entity(id).is_none() {
                self.selected = None;
                self.transitions.set_focus(None, Duration::ZERO);
            }
        }
        self.snapshot = snapshot;
    }

    /// Apply an ownership update (one turn) and start transitions for every
    /// entity whose owner changed. Returns the number of transitions started.
    pub fn apply_ownership(&mut self, update: &OwnershipUpdate, now: Duration) -> usize {
        if self.snapshot.apply(update) == 0 {
            return 0;
        }
        let started = self
            .transitions
            .observe(&self.snapshot, self.tiers.region(), &self.palette, now);
        self.overlays = relation_overlays(&self.snapshot);
        if started > 0 {
            tracing::debug!("{} ownership transitions started", started);
        }
        started
    }

    pub fn set_relations(&mut self, relations: Vec<DiplomaticRelation>) {
        self.snapshot.set_relations(relations);
        self.overlays = relation_overlays(&self.snapshot);
    }

    /// Register the source of the lazily loaded sub-region tier.
    pub fn attach_tier_source(&mut self, source: Box<dyn TierSource>) {
        self.loader.attach(source);
    }

    // === PRESENTATION ===

    pub fn set_theme(&mut self, theme: ThemeKind) {
        tracing::info!("Theme: {:?}", theme);
        self.config.theme = theme;
        self.palette = theme.palette();
    }

    /// Switch between flat and globe, keeping the geography under the
    /// viewport center in view.
    pub fn set_mode(&mut self, mode: PresentationMode) {
        if mode == self.view.mode() {
            return;
        }
        let viewport = self.view.viewport();
        let focus = self.view.invert(viewport.center());
        let zoom = self.view.lod_zoom();
        self.view = make_view(mode, &self.config, viewport);
        if let Some(coord) = focus {
            self.view.fly_to(coord, zoom);
            self.view.settle();
        }
        self.input.set_mode(mode);
        self.config.mode = mode;
        tracing::info!("Presentation mode: {:?}", mode);
    }

    pub fn mode(&self) -> PresentationMode {
        self.view.mode()
    }

    pub fn resize(&mut self, viewport: Viewport) {
        if viewport.is_empty() {
            return;
        }
        self.view.resize(viewport);
    }

    // === INPUT ===

    /// Feed one input event. Returns a selection change caused by a click.
    pub fn handle_input(&mut self, event: InputEvent, now: Duration) -> Option<SelectionEvent> {
        let mut selection = None;
        for action in self.input.handle(event, now) {
            if let Some(event) = self.apply_action(action, now) {
                selection = Some(event);
            }
        }
        selection
    }

    fn apply_action(&mut self, action: InputAction, now: Duration) -> Option<SelectionEvent> {
        match action {
            InputAction::Interaction => self.view.note_interaction(now),
            InputAction::Pan { delta, immediate } => self.view.pan(delta, immediate),
            InputAction::Orbit { delta } => self.view.orbit(delta),
            InputAction::ZoomAt { pos, factor } => self.view.zoom_at(pos, factor),
            InputAction::ZoomCenter { factor } => self.view.zoom_center(factor),
            InputAction::Hover { pos } => {
                self.metrics.hover_hit_tests += 1;
                let hit = self.view.hit_test(self.tiers.region(), pos);
                self.hover.set_target(hit);
            }
            InputAction::ClearHover => self.hover.set_target(None),
            InputAction::Select { pos } => {
                self.metrics.click_hit_tests += 1;
                let hit = self.view.hit_test(self.tiers.region(), pos);
                return self.select(hit, now);
            }
        }
        None
    }

    /// Select an entity (or clear with `None`), fly to it and start the
    /// selection emphasis. Returns the change, if any.
    pub fn select(&mut self, id: Option<EntityId>, now: Duration) -> Option<SelectionEvent> {
        if id == self.selected {
            return None;
        }
        self.transitions.set_focus(id.clone(), now);
        self.selected = id.clone();
        match id {
            Some(id) => {
                tracing::debug!("Selected {}", id);
                if let Err(e) = self.fly_to_entity(&id) {
                    tracing::warn!("Cannot focus selection: {}", e);
                }
                Some(SelectionEvent::Selected(id))
            }
            None => Some(SelectionEvent::Cleared),
        }
    }

    pub fn fly_to_entity(&mut self, id: &EntityId) -> Result<()> {
        let coord = self.anchor_of(id).ok_or_else(|| EngineError::UnknownEntity(id.clone()))?;
        let zoom = self.view.lod_zoom();
        self.view.fly_to(coord, zoom);
        Ok(())
    }

    fn anchor_of(&self, id: &EntityId) -> Option<GeoCoord> {
        self.tiers
            .region()
            .get(id)
            .map(|g| g.centroid)
            .or_else(|| self.snapshot.entity(id).and_then(|e| e.centroid))
    }

    // === FRAME ===

    /// Advance animation state to `now` and compose the frame.
    pub fn frame(&mut self, now: Duration) -> &FrameOutput {
        let step = self
            .last_frame
            .map(|last| now.saturating_sub(last))
            .unwrap_or_default()
            .min(MAX_FRAME_STEP);
        self.last_frame = Some(now);
        let dt = step.as_secs_f32();

        if let Some(action) = self.input.poll_hover(now) {
            self.apply_action(action, now);
        }
        self.view.update_camera(dt, now);
        self.hover.update(dt);

        if self.view.mode() == PresentationMode::Flat {
            if let Some(features) = self
                .loader
                .poll(self.view.lod_zoom(), self.config.lod.subregion_fade_start)
            {
                self.tiers.set_subregions(features);
            }
        }
        if self.view.build_path_cache(&self.tiers) {
            self.metrics.cache_rebuilds += 1;
        }
        self.transitions.purge(now);

        let scene = Scene {
            snapshot: &self.snapshot,
            tiers: &self.tiers,
            palette: &self.palette,
            config: &self.config,
            transitions: &self.transitions,
            hover: &self.hover,
            selected: self.selected.as_ref(),
            overlays: &self.overlays,
            now,
        };
        self.view.draw_frame(&scene, &mut self.output);

        self.metrics.commands = self.output.surface.len() + self.output.overlay.len();
        self.metrics.active_transitions = self.transitions.active_count();
        self.metrics.record_frame(step);
        &self.output
    }

    // === ACCESSORS ===

    /// The last composed frame.
    pub fn output(&self) -> &FrameOutput {
        &self.output
    }

    /// Paths referenced by the last frame's draw commands.
    pub fn path_cache(&self) -> &PathCache {
        self.view.path_cache()
    }

    pub fn view(&self) -> &dyn MapView {
        self.view.as_ref()
    }

    pub fn view_mut(&mut self) -> &mut dyn MapView {
        self.view.as_mut()
    }

    pub fn snapshot(&self) -> &WorldSnapshot {
        &self.snapshot
    }

    pub fn tiers(&self) -> &LodTiers {
        &self.tiers
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn transitions(&self) -> &TransitionRegistry {
        &self.transitions
    }

    pub fn selected(&self) -> Option<&EntityId> {
        self.selected.as_ref()
    }

    pub fn hovered(&self) -> Option<&EntityId> {
        self.hover.target()
    }

    pub fn metrics(&self) -> &RenderMetrics {
        &self.metrics
    }

    pub fn view_model(&self) -> ViewModel {
        let hovered = self.hover.target().and_then(|id| {
            let entity = self.snapshot.entity(id)?;
            let owner = entity.owner.as_ref();
            let relation = match (owner, self.config.player_faction.as_ref()) {
                (Some(owner), Some(player)) if owner != player => Some(self.snapshot.relation(owner, player)),
                _ => None,
            };
            Some(Tooltip {
                id: entity.id.clone(),
                name: entity.name.clone(),
                owner: owner.map(|o| {
                    self.snapshot
                        .faction(o)
                        .map(|f| f.name.clone())
                        .unwrap_or_else(|| o.to_string())
                }),
                population: entity.attributes.population,
                relation,
            })
        });
        ViewModel {
            hovered,
            selected: self.selected.clone(),
        }
    }
}
