//! Frame composition.
//!
//! Builds the layered draw list for one frame from the world snapshot, the
//! cached paths and the interaction/animation state. Flat mode composes the
//! whole frame; globe mode composes the map surface (rasterized into the
//! sphere texture) and a screen-space overlay for labels and the vignette.

use glam::Vec2;
use std::f32::consts::TAU;
use std::time::Duration;

use super::draw_list::{DrawCommand, DrawLayer, DrawList, PathRef};
use super::labels::{select_labels, MarkerKind};
use super::path_cache::{CacheKey, CachedPath, PathCache};
use crate::animation::{HoverState, TransitionRegistry};
use crate::camera::flat::Transform2;
use crate::core::config::EngineConfig;
use crate::core::types::{EntityId, FactionId, GeoCoord};
use crate::lod::{group_owner, GroupOwnership, LodTier, LodTiers};
use crate::projection::Projection;
use crate::theme::{Color, Palette};
use crate::world::entity::{GeographicEntity, RelationKind};
use crate::world::snapshot::WorldSnapshot;

const WAR_PULSE_SECS: f32 = 2.0;
const SELECTION_PULSE_SECS: f32 = 1.5;
const GRID_STEP_DEG: f64 = 15.0;
/// Tiers fainter than this are skipped entirely.
const MIN_TIER_OPACITY: f32 = 1e-3;
const LABEL_SIZE: f32 = 13.0;
const MINOR_LABEL_SIZE: f32 = 11.0;
const MAJOR_LABEL_POPULATION: u64 = 10_000_000;

/// Maps a geographic coordinate to target pixels, `None` when not visible.
pub type AnchorFn<'a> = &'a dyn Fn(GeoCoord) -> Option<Vec2>;

/// Everything a frame is composed from. Borrowed for the duration of one
/// compose call; nothing here is mutated.
pub struct FrameContext<'a> {
    pub snapshot: &'a WorldSnapshot,
    pub tiers: &'a LodTiers,
    pub cache: &'a PathCache,
    pub cache_key: CacheKey,
    pub palette: &'a Palette,
    pub config: &'a EngineConfig,
    pub transitions: &'a TransitionRegistry,
    pub hover: &'a HoverState,
    pub selected: Option<&'a EntityId>,
    /// Strongest relation overlay per entity, see [`super::borders::relation_overlays`].
    pub overlays: &'a [(EntityId, RelationKind)],
    pub now: Duration,
    /// Zoom used for LOD and label thresholds.
    pub zoom: f32,
    /// Map plane to target pixels.
    pub transform: Transform2,
    pub target_size: Vec2,
    /// Visible map-plane rectangle for culling; `None` draws everything.
    pub visible: Option<(Vec2, Vec2)>,
    /// Multiplier for stroke widths and radii (the globe texture is denser
    /// than the screen).
    pub line_scale: f32,
    pub anchor: AnchorFn<'a>,
}

impl FrameContext<'_> {
    fn seconds(&self) -> f32 {
        self.now.as_secs_f32()
    }

    fn culled(&self, path: &CachedPath) -> bool {
        self.visible
            .map(|(min, max)| !path.intersects(min, max))
            .unwrap_or(false)
    }

    fn region_index(&self, id: &EntityId) -> Option<usize> {
        let region = self.cache.tier_checked(LodTier::Region, &self.cache_key)?;
        let index = region.index_of(id)?;
        (!self.culled(&region.paths[index])).then_some(index)
    }

    fn is_player(&self, owner: Option<&FactionId>) -> bool {
        owner.is_some() && self.config.player_faction.as_ref() == owner
    }
}

/// Display fill for an entity: ownership through the palette, then the
/// running transition, hover and selection modifiers in that order.
pub fn resolve_fill(ctx: &FrameContext, entity: &GeographicEntity) -> Color {
    let mut fill = match ctx.transitions.sample(&entity.id, ctx.now) {
        Some(sample) => sample.fill,
        None => ctx
            .palette
            .entity_fill(ctx.snapshot.owner_color(entity.owner.as_ref()), entity.base_color),
    };
    let hover = ctx.hover.level(&entity.id);
    if hover > 0.0 {
        fill = fill.brighten(hover * ctx.palette.hover_boost);
    }
    if ctx.selected == Some(&entity.id) {
        fill = fill.brighten(ctx.palette.selection_boost);
    }
    fill
}

struct Stroke {
    color: Color,
    width: f32,
}

/// Player-owned > other-owned (brighter when hovered) > neutral.
fn border_style(ctx: &FrameContext, owner: Option<&FactionId>, hover: f32) -> Stroke {
    let p = ctx.palette;
    if ctx.is_player(owner) {
        return Stroke {
            color: p.player_border,
            width: p.player_border_width,
        };
    }
    let color = match owner {
        Some(_) => p.border.lerp(p.border_hover, hover),
        None => p.border,
    };
    Stroke {
        color,
        width: p.border_width,
    }
}

fn tier_border_scale(tier: LodTier) -> f32 {
    match tier {
        LodTier::Country => 1.4,
        LodTier::Region => 1.0,
        LodTier::Subregion => 0.6,
    }
}

fn push_shape(ctx: &FrameContext, list: &mut DrawList, path: PathRef, fill: Color, stroke: Stroke, opacity: f32, tier: LodTier) {
    list.push(DrawLayer::Fill, DrawCommand::FillPath {
        path,
        color: fill.fade(opacity),
    });
    list.push(DrawLayer::Border, DrawCommand::StrokePath {
        path,
        color: stroke.color.fade(opacity),
        width: stroke.width * tier_border_scale(tier) * ctx.line_scale,
        dash: None,
    });
}

fn push_entity(ctx: &FrameContext, list: &mut DrawList, path: PathRef, entity: &GeographicEntity, opacity: f32, tier: LodTier) {
    let stroke = border_style(ctx, entity.owner.as_ref(), ctx.hover.level(&entity.id));
    push_shape(ctx, list, path, resolve_fill(ctx, entity), stroke, opacity, tier);
}

/// A country-tier grouping. Uniformly owned, settled groups draw as one
/// region; otherwise members are drawn individually from the region tier.
fn push_group(ctx: &FrameContext, list: &mut DrawList, path: PathRef, group: &EntityId, opacity: f32) {
    let snapshot = ctx.snapshot;
    let animating = snapshot
        .group_members(group)
        .any(|m| ctx.transitions.contains(&m.id));

    match group_owner(group, snapshot) {
        GroupOwnership::Uniform(owner) if !animating => {
            let base = snapshot
                .group_members(group)
                .next()
                .map(|m| m.base_color)
                .unwrap_or(ctx.palette.neutral_fill);
            let hover = snapshot
                .group_members(group)
                .map(|m| ctx.hover.level(&m.id))
                .fold(0.0, f32::max);
            let selected = ctx
                .selected
                .map(|s| snapshot.group_members(group).any(|m| &m.id == s))
                .unwrap_or(false);

            let mut fill = ctx.palette.entity_fill(snapshot.owner_color(owner.as_ref()), base);
            if hover > 0.0 {
                fill = fill.brighten(hover * ctx.palette.hover_boost);
            }
            if selected {
                fill = fill.brighten(ctx.palette.selection_boost);
            }
            let stroke = border_style(ctx, owner.as_ref(), hover);
            push_shape(ctx, list, path, fill, stroke, opacity, LodTier::Country);
        }
        _ => {
            let Some(region) = ctx.cache.tier_checked(LodTier::Region, &ctx.cache_key) else {
                return;
            };
            for member in snapshot.group_members(group) {
                if let Some(index) = region.index_of(&member.id) {
                    let member_path = PathRef {
                        tier: LodTier::Region,
                        index,
                    };
                    push_entity(ctx, list, member_path, member, opacity, LodTier::Country);
                }
            }
        }
    }
}

fn compose_grid(ctx: &FrameContext, list: &mut DrawList) {
    let Some(projection) = ctx.cache.projection() else {
        return;
    };
    let size = projection.map_size();
    let color = ctx.palette.grid;
    let width = ctx.line_scale;

    let meridians = (360.0 / GRID_STEP_DEG) as i32;
    for i in 0..=meridians {
        let lon = -180.0 + i as f64 * GRID_STEP_DEG;
        if let Some(p) = projection.project(GeoCoord::new(lon, 0.0)) {
            list.push(DrawLayer::Grid, DrawCommand::GridLine {
                from: Vec2::new(p.x, 0.0),
                to: Vec2::new(p.x, size.y),
                color,
                width,
            });
        }
    }
    let parallels = (180.0 / GRID_STEP_DEG) as i32;
    for i in 1..parallels {
        let lat = -90.0 + i as f64 * GRID_STEP_DEG;
        if let Some(p) = projection.project(GeoCoord::new(0.0, lat)) {
            list.push(DrawLayer::Grid, DrawCommand::GridLine {
                from: Vec2::new(0.0, p.y),
                to: Vec2::new(size.x, p.y),
                color,
                width,
            });
        }
    }
}

fn compose_tiers(ctx: &FrameContext, list: &mut DrawList) {
    let opacities = ctx.tiers.opacities(ctx.zoom, &ctx.config.lod);
    for tier in LodTier::ALL {
        let opacity = opacities[tier.index()];
        if opacity < MIN_TIER_OPACITY {
            continue;
        }
        let Some(paths) = ctx.cache.tier_checked(tier, &ctx.cache_key) else {
            continue;
        };
        for (index, path) in paths.paths.iter().enumerate() {
            if ctx.culled(path) {
                continue;
            }
            let path_ref = PathRef { tier, index };
            let entity_id = match tier {
                LodTier::Region => Some(&path.id),
                LodTier::Country | LodTier::Subregion => path.parent.as_ref(),
            };
            match entity_id {
                Some(id) => match ctx.snapshot.entity(id) {
                    Some(entity) => push_entity(ctx, list, path_ref, entity, opacity, tier),
                    None => {
                        let stroke = border_style(ctx, None, 0.0);
                        push_shape(ctx, list, path_ref, ctx.palette.neutral_fill, stroke, opacity, tier);
                    }
                },
                None => push_group(ctx, list, path_ref, &path.id, opacity),
            }
        }
    }
}

fn compose_diplomacy(ctx: &FrameContext, list: &mut DrawList) {
    let p = ctx.palette;
    let pulse = 0.55 + 0.45 * (TAU * ctx.seconds() / WAR_PULSE_SECS).sin();
    for (id, kind) in ctx.overlays {
        let Some(index) = ctx.region_index(id) else {
            continue;
        };
        let (color, width, dash) = match kind {
            RelationKind::War => (p.war_border.fade(pulse), 2.5, None),
            RelationKind::Hostile => (p.hostile_border, 2.0, Some([6.0, 4.0])),
            RelationKind::Allied => (p.allied_border, 2.0, None),
            RelationKind::Neutral | RelationKind::Friendly => continue,
        };
        list.push(DrawLayer::Diplomacy, DrawCommand::StrokePath {
            path: PathRef {
                tier: LodTier::Region,
                index,
            },
            color,
            width: width * ctx.line_scale,
            dash: dash.map(|d: [f32; 2]| d.map(|v| v * ctx.line_scale)),
        });
    }
}

fn compose_selection(ctx: &FrameContext, list: &mut DrawList) {
    let p = ctx.palette;
    if let Some(index) = ctx.selected.and_then(|id| ctx.region_index(id)) {
        let path = PathRef {
            tier: LodTier::Region,
            index,
        };
        let pulse = 0.7 + 0.3 * (TAU * ctx.seconds() / SELECTION_PULSE_SECS).sin();
        list.push(DrawLayer::Selection, DrawCommand::StrokePath {
            path,
            color: p.selection_glow.fade(pulse),
            width: 8.0 * ctx.line_scale,
            dash: None,
        });
        list.push(DrawLayer::Selection, DrawCommand::StrokePath {
            path,
            color: p.selection_line,
            width: 2.0 * ctx.line_scale,
            dash: None,
        });
    }

    if let Some((id, progress)) = ctx.transitions.focus_progress(ctx.now) {
        if let Some(index) = ctx.region_index(id) {
            list.push(DrawLayer::Selection, DrawCommand::StrokePath {
                path: PathRef {
                    tier: LodTier::Region,
                    index,
                },
                color: p.selection_line.fade(1.0 - progress),
                width: (2.0 + 10.0 * progress) * ctx.line_scale,
                dash: None,
            });
        }
    }
}

fn compose_transitions(ctx: &FrameContext, list: &mut DrawList) {
    let mut ids: Vec<&EntityId> = ctx.transitions.active_ids().collect();
    ids.sort();
    for id in ids {
        let Some(sample) = ctx.transitions.sample(id, ctx.now) else {
            continue;
        };
        if sample.flash_alpha > 0.0 {
            if let Some(index) = ctx.region_index(id) {
                list.push(DrawLayer::Transition, DrawCommand::FillPath {
                    path: PathRef {
                        tier: LodTier::Region,
                        index,
                    },
                    color: ctx.palette.flash.fade(sample.flash_alpha),
                });
            }
        }
        if let Some(ring) = sample.ring {
            if let Some(center) = (ctx.anchor)(sample.anchor) {
                list.push(DrawLayer::Transition, DrawCommand::Circle {
                    center,
                    radius: ring.radius_px * ctx.line_scale,
                    fill: None,
                    stroke: Some((ctx.palette.ring.fade(ring.alpha), 2.0 * ctx.line_scale)),
                });
            }
        }
    }
}

/// Name labels and city markers at `anchor` positions inside `bounds`.
pub fn compose_labels(ctx: &FrameContext, list: &mut DrawList, anchor: AnchorFn, bounds: Vec2) {
    let on_screen = |p: Vec2| p.x >= 0.0 && p.y >= 0.0 && p.x <= bounds.x && p.y <= bounds.y;
    let set = select_labels(ctx.snapshot, ctx.tiers.region(), ctx.zoom, &ctx.config.labels);

    for marker in &set.markers {
        let Some(center) = anchor(marker.coord).filter(|p| on_screen(*p)) else {
            continue;
        };
        let (radius, stroke) = match marker.kind {
            MarkerKind::Capital => (4.0, Some((ctx.palette.background, 1.0))),
            MarkerKind::City => (2.5, None),
        };
        list.push(DrawLayer::Labels, DrawCommand::Circle {
            center,
            radius,
            fill: Some(ctx.palette.city_marker),
            stroke,
        });
    }

    for label in &set.labels {
        let Some(pos) = anchor(label.anchor).filter(|p| on_screen(*p)) else {
            continue;
        };
        let size = if label.population >= MAJOR_LABEL_POPULATION {
            LABEL_SIZE
        } else {
            MINOR_LABEL_SIZE
        };
        list.push(DrawLayer::Labels, DrawCommand::Text {
            anchor: pos,
            text: label.text.clone(),
            size,
            color: ctx.palette.label,
        });
    }
}

/// Complete flat-mode frame.
pub fn compose_flat_frame(ctx: &FrameContext, list: &mut DrawList) {
    list.push(DrawLayer::Background, DrawCommand::Clear(ctx.palette.background));
    list.push(DrawLayer::Background, DrawCommand::SetTransform(ctx.transform));
    compose_grid(ctx, list);
    compose_tiers(ctx, list);
    compose_diplomacy(ctx, list);
    compose_selection(ctx, list);
    compose_transitions(ctx, list);
    compose_labels(ctx, list, ctx.anchor, ctx.target_size);
    list.push(DrawLayer::Vignette, DrawCommand::Vignette {
        color: ctx.palette.vignette,
    });
    list.finish();
}

/// Globe surface texture: grid through transition overlays on the
/// equirectangular canvas.
pub fn compose_surface(ctx: &FrameContext, list: &mut DrawList) {
    list.push(DrawLayer::Background, DrawCommand::Clear(ctx.palette.background));
    list.push(DrawLayer::Background, DrawCommand::SetTransform(ctx.transform));
    compose_grid(ctx, list);
    compose_tiers(ctx, list);
    compose_diplomacy(ctx, list);
    compose_selection(ctx, list);
    compose_transitions(ctx, list);
    list.finish();
}

/// Globe screen overlay: labels at projected positions and the vignette.
pub fn compose_globe_overlay(ctx: &FrameContext, list: &mut DrawList, anchor: AnchorFn, viewport: Vec2) {
    list.push(DrawLayer::Background, DrawCommand::SetTransform(Transform2::IDENTITY));
    compose_labels(ctx, list, anchor, viewport);
    list.push(DrawLayer::Vignette, DrawCommand::Vignette {
        color: ctx.palette.vignette,
    });
    list.finish();
}
