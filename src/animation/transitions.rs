//! Ownership-change transitions.
//!
//! Timeline from registration (defaults, all configurable):
//!
//! ```text
//!   0ms ─ flash ─ 300ms                          old color held
//!             300ms ── blend old → new ── 800ms
//!       200ms ──────── ring expands, fades ──────── 1000ms
//!                                                        1200ms purged
//! ```
//!
//! The registry keeps at most one entry per entity; a newer change replaces
//! the running one and starts from whatever color is on screen at that moment.

use ahash::AHashMap;
use std::time::Duration;

use crate::core::config::TransitionConfig;
use crate::core::types::{EntityId, FactionId, GeoCoord};
use crate::theme::{Color, Palette};
use crate::world::geometry::GeometryStore;
use crate::world::snapshot::WorldSnapshot;

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub id: EntityId,
    pub start: Duration,
    pub from: Color,
    pub to: Color,
    /// Geographic anchor for centered effects (the entity centroid).
    pub anchor: GeoCoord,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingSample {
    pub radius_px: f32,
    pub alpha: f32,
}

/// Visual state of one transition at a point in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionSample {
    pub fill: Color,
    /// Alpha of the white flash overlay, 0 once the flash phase is over.
    pub flash_alpha: f32,
    pub ring: Option<RingSample>,
    pub anchor: GeoCoord,
}

/// Short emphasis drawn when the selection changes.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionFocus {
    pub id: EntityId,
    pub start: Duration,
}

fn elapsed_ms(start: Duration, now: Duration) -> f32 {
    now.saturating_sub(start).as_secs_f32() * 1000.0
}

fn phase(elapsed: f32, start: f32, end: f32) -> Option<f32> {
    if elapsed < start || elapsed > end {
        return None;
    }
    if end <= start {
        return Some(1.0);
    }
    Some((elapsed - start) / (end - start))
}

#[derive(Debug, Clone)]
pub struct TransitionRegistry {
    config: TransitionConfig,
    active: AHashMap<EntityId, Transition>,
    observed: AHashMap<EntityId, Option<FactionId>>,
    focus: Option<SelectionFocus>,
}

impl TransitionRegistry {
    pub fn new(config: TransitionConfig) -> Self {
        Self {
            config,
            active: AHashMap::new(),
            observed: AHashMap::new(),
            focus: None,
        }
    }

    /// Record owners without animating (world load). Drops running transitions.
    pub fn reset(&mut self, snapshot: &WorldSnapshot) {
        self.active.clear();
        self.focus = None;
        self.observed = snapshot
            .owners()
            .map(|(id, owner)| (id.clone(), owner.cloned()))
            .collect();
    }

    /// Diff the snapshot against the owners seen at the previous update and
    /// register a transition for every entity whose owner changed. Call once
    /// per state update, not per frame. Returns the number registered.
    pub fn observe(
        &mut self,
        snapshot: &WorldSnapshot,
        geometry: &GeometryStore,
        palette: &Palette,
        now: Duration,
    ) -> usize {
        let mut registered = 0;
        for entity in snapshot.entities() {
            let current = entity.owner.as_ref();
            let previous = match self.observed.get(&entity.id) {
                Some(previous) => previous.clone(),
                None => {
                    self.observed.insert(entity.id.clone(), current.cloned());
                    continue;
                }
            };
            if previous.as_ref() == current {
                continue;
            }

            let steady_old = palette.entity_fill(snapshot.owner_color(previous.as_ref()), entity.base_color);
            let from = self
                .sample(&entity.id, now)
                .map(|s| s.fill)
                .unwrap_or(steady_old);
            let to = palette.entity_fill(snapshot.owner_color(current), entity.base_color);
            let anchor = geometry
                .get(&entity.id)
                .map(|g| g.centroid)
                .or(entity.centroid)
                .unwrap_or_default();

            tracing::debug!(
                "Ownership of {} changed: {:?} -> {:?}",
                entity.id,
                previous.as_ref().map(FactionId::as_str),
                current.map(FactionId::as_str)
            );
            self.register(Transition {
                id: entity.id.clone(),
                start: now,
                from,
                to,
                anchor,
            });
            self.observed.insert(entity.id.clone(), current.cloned());
            registered += 1;
        }
        registered
    }

    /// Insert a transition, replacing any running one for the same entity.
    pub fn register(&mut self, transition: Transition) {
        self.active.insert(transition.id.clone(), transition);
    }

    pub fn sample(&self, id: &EntityId, now: Duration) -> Option<TransitionSample> {
        let t = self.active.get(id)?;
        let c = &self.config;
        let elapsed = elapsed_ms(t.start, now);
        if elapsed > c.lifetime_ms {
            return None;
        }

        let fill = if elapsed < c.blend_start_ms {
            t.from
        } else if elapsed >= c.blend_end_ms {
            t.to
        } else {
            let p = phase(elapsed, c.blend_start_ms, c.blend_end_ms).unwrap_or(1.0);
            t.from.lerp(t.to, p)
        };

        let flash_alpha = if c.flash_ms > 0.0 && elapsed < c.flash_ms {
            1.0 - elapsed / c.flash_ms
        } else {
            0.0
        };

        let ring = phase(elapsed, c.ring_start_ms, c.ring_end_ms).map(|p| RingSample {
            radius_px: c.ring_max_radius_px * p,
            alpha: 1.0 - p,
        });

        Some(TransitionSample {
            fill,
            flash_alpha,
            ring,
            anchor: t.anchor,
        })
    }

    /// Drop entries older than the lifetime. Returns how many were removed.
    pub fn purge(&mut self, now: Duration) -> usize {
        let lifetime = self.config.lifetime_ms;
        let before = self.active.len();
        self.active.retain(|_, t| elapsed_ms(t.start, now) <= lifetime);
        if let Some(focus) = &self.focus {
            if elapsed_ms(focus.start, now) > self.config.selection_focus_ms {
                self.focus = None;
            }
        }
        before - self.active.len()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.active.contains_key(id)
    }

    pub fn active_ids(&self) -> impl Iterator<Item = &EntityId> {
        self.active.keys()
    }

    pub fn set_focus(&mut self, id: Option<EntityId>, now: Duration) {
        self.focus = id.map(|id| SelectionFocus { id, start: now });
    }

    /// Progress (0..1) of the selection emphasis, if running.
    pub fn focus_progress(&self, now: Duration) -> Option<(&EntityId, f32)> {
        let focus = self.focus.as_ref()?;
        let p = phase(elapsed_ms(focus.start, now), 0.0, self.config.selection_focus_ms)?;
        Some((&focus.id, p))
    }
}
