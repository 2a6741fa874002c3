//! Backend-neutral rendering for the map
//!
//! Turns the world snapshot plus camera, hover, selection and transition
//! state into a layered [`DrawList`] each frame. This module is READ-ONLY
//! with respect to the world: it never modifies the snapshot.

pub mod borders;
pub mod draw_list;
pub mod frame;
pub mod labels;
pub mod metrics;
pub mod path_cache;
pub mod tessellate;

pub use borders::relation_overlays;
pub use draw_list::{DrawCommand, DrawItem, DrawLayer, DrawList, PathRef};
pub use frame::{compose_flat_frame, compose_globe_overlay, compose_surface, resolve_fill, FrameContext};
pub use labels::{select_labels, CityMarker, Label, LabelSet, MarkerKind};
pub use metrics::RenderMetrics;
pub use path_cache::{CacheKey, CachedPath, PathCache, TierPaths};
pub use tessellate::{tessellate, ColorVertex, Tessellation, TextItem};
