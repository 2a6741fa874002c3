//! Backend-neutral draw commands in fixed layer order.
//!
//! Path and grid coordinates are map-plane units and go through the current
//! [`Transform2`]; circle and text positions, and all widths and radii, are
//! target pixels.

use glam::Vec2;

use crate::camera::flat::Transform2;
use crate::lod::LodTier;
use crate::theme::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DrawLayer {
    Background,
    Grid,
    Fill,
    Border,
    Diplomacy,
    Selection,
    Transition,
    Labels,
    Vignette,
}

impl DrawLayer {
    pub const COUNT: usize = 9;
}

/// Index of a cached path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PathRef {
    pub tier: LodTier,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear(Color),
    SetTransform(Transform2),
    GridLine {
        from: Vec2,
        to: Vec2,
        color: Color,
        width: f32,
    },
    FillPath {
        path: PathRef,
        color: Color,
    },
    StrokePath {
        path: PathRef,
        color: Color,
        width: f32,
        /// On/off lengths in pixels.
        dash: Option<[f32; 2]>,
    },
    Circle {
        center: Vec2,
        radius: f32,
        fill: Option<Color>,
        stroke: Option<(Color, f32)>,
    },
    Text {
        anchor: Vec2,
        text: String,
        size: f32,
        color: Color,
    },
    Vignette {
        color: Color,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawItem {
    pub layer: DrawLayer,
    pub command: DrawCommand,
}

#[derive(Debug, Clone, Default)]
pub struct DrawList {
    items: Vec<DrawItem>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn push(&mut self, layer: DrawLayer, command: DrawCommand) {
        self.items.push(DrawItem { layer, command });
    }

    /// Stable-sort into layer order; commands within a layer keep push order.
    pub fn finish(&mut self) {
        self.items.sort_by_key(|item| item.layer);
    }

    pub fn items(&self) -> &[DrawItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn layer(&self, layer: DrawLayer) -> impl Iterator<Item = &DrawCommand> {
        self.items
            .iter()
            .filter(move |item| item.layer == layer)
            .map(|item| &item.command)
    }

    pub fn count(&self, layer: DrawLayer) -> usize {
        self.layer(layer).count()
    }

    /// True if the items are in non-decreasing layer order.
    pub fn is_ordered(&self) -> bool {
        self.items.windows(2).all(|w| w[0].layer <= w[1].layer)
    }
}
