//! Map projections: geographic coordinates to the flat map plane or the unit sphere.

pub mod flat;
pub mod globe;

pub use flat::{FlatProjection, FlatProjectionKind};

use glam::Vec2;

use crate::core::types::GeoCoord;

/// Forward and inverse mapping between geographic and projected coordinates.
pub trait Projection {
    /// `None` when the coordinate has no image under this projection.
    fn project(&self, coord: GeoCoord) -> Option<Vec2>;

    /// `None` when the point lies outside the valid projection domain.
    fn invert(&self, point: Vec2) -> Option<GeoCoord>;
}
