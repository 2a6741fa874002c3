//! Draw list to colored triangles.
//!
//! Output positions are target pixels (origin top-left, y down); the GPU
//! backend maps them to clip space. Text is collected as positioned
//! [`TextItem`]s for the glyph overlay.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use std::f32::consts::TAU;

use super::draw_list::{DrawCommand, DrawList};
use super::path_cache::PathCache;
use crate::camera::flat::Transform2;
use crate::theme::Color;

const CIRCLE_SEGMENTS: usize = 32;
const VIGNETTE_SEGMENTS: usize = 48;
/// Vignette starts at this fraction of the half-extent and is fully opaque
/// at 1.6 times the half-extent (past the corners).
const VIGNETTE_INNER: f32 = 0.6;
const VIGNETTE_OUTER: f32 = 1.6;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct ColorVertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl ColorVertex {
    pub fn new(position: Vec2, color: Color) -> Self {
        Self {
            position: position.to_array(),
            color: color.to_array(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Tessellation {
    pub clear: Option<Color>,
    /// Triangle list.
    pub vertices: Vec<ColorVertex>,
    /// Labels in draw order, anchored in target pixels.
    pub texts: Vec<TextItem>,
}

/// A label centered on `anchor`.
#[derive(Debug, Clone, PartialEq)]
pub struct TextItem {
    pub anchor: Vec2,
    pub text: String,
    pub size: f32,
    pub color: Color,
}

impl Tessellation {
    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }

    fn tri(&mut self, a: Vec2, b: Vec2, c: Vec2, color: Color) {
        self.vertices.push(ColorVertex::new(a, color));
        self.vertices.push(ColorVertex::new(b, color));
        self.vertices.push(ColorVertex::new(c, color));
    }

    fn quad(&mut self, a: Vec2, b: Vec2, c: Vec2, d: Vec2, color: Color) {
        self.tri(a, b, c, color);
        self.tri(a, c, d, color);
    }

    /// Segment of the given pixel width, butt caps.
    fn segment(&mut self, from: Vec2, to: Vec2, width: f32, color: Color) {
        let Some(dir) = (to - from).try_normalize() else {
            return;
        };
        let n = dir.perp() * (width / 2.0);
        self.quad(from + n, to + n, to - n, from - n, color);
    }

    /// Closed polyline, optionally dashed. The dash phase runs continuously
    /// around the ring.
    fn ring(&mut self, points: &[Vec2], width: f32, color: Color, dash: Option<[f32; 2]>) {
        if points.len() < 2 {
            return;
        }
        let mut phase = 0.0_f32;
        for i in 0..points.len() {
            let a = points[i];
            let b = points[(i + 1) % points.len()];
            match dash {
                None => self.segment(a, b, width, color),
                Some([on, off]) if on > 0.0 && on + off > 0.0 => {
                    let period = on + off;
                    let length = a.distance(b);
                    let mut t = 0.0;
                    while t < length {
                        let within = phase % period;
                        let (span, drawing) = if within < on {
                            (on - within, true)
                        } else {
                            (period - within, false)
                        };
                        let step = span.min(length - t);
                        if drawing {
                            let p0 = a.lerp(b, t / length);
                            let p1 = a.lerp(b, (t + step) / length);
                            self.segment(p0, p1, width, color);
                        }
                        t += step;
                        phase += step;
                    }
                }
                Some(_) => self.segment(a, b, width, color),
            }
        }
    }

    fn circle_fill(&mut self, center: Vec2, radius: f32, color: Color) {
        for i in 0..CIRCLE_SEGMENTS {
            let a0 = i as f32 / CIRCLE_SEGMENTS as f32 * TAU;
            let a1 = (i + 1) as f32 / CIRCLE_SEGMENTS as f32 * TAU;
            self.tri(
                center,
                center + Vec2::from_angle(a0) * radius,
                center + Vec2::from_angle(a1) * radius,
                color,
            );
        }
    }

    fn circle_stroke(&mut self, center: Vec2, radius: f32, width: f32, color: Color) {
        let inner = (radius - width / 2.0).max(0.0);
        let outer = radius + width / 2.0;
        for i in 0..CIRCLE_SEGMENTS {
            let d0 = Vec2::from_angle(i as f32 / CIRCLE_SEGMENTS as f32 * TAU);
            let d1 = Vec2::from_angle((i + 1) as f32 / CIRCLE_SEGMENTS as f32 * TAU);
            self.quad(
                center + d0 * inner,
                center + d0 * outer,
                center + d1 * outer,
                center + d1 * inner,
                color,
            );
        }
    }

    fn vignette(&mut self, target: Vec2, color: Color) {
        let center = target / 2.0;
        let half = target / 2.0;
        let clear = color.with_alpha(0.0);
        for i in 0..VIGNETTE_SEGMENTS {
            let d0 = Vec2::from_angle(i as f32 / VIGNETTE_SEGMENTS as f32 * TAU) * half;
            let d1 = Vec2::from_angle((i + 1) as f32 / VIGNETTE_SEGMENTS as f32 * TAU) * half;
            let in0 = ColorVertex::new(center + d0 * VIGNETTE_INNER, clear);
            let in1 = ColorVertex::new(center + d1 * VIGNETTE_INNER, clear);
            let out0 = ColorVertex::new(center + d0 * VIGNETTE_OUTER, color);
            let out1 = ColorVertex::new(center + d1 * VIGNETTE_OUTER, color);
            self.vertices.extend_from_slice(&[in0, out0, out1, in0, out1, in1]);
        }
    }
}

/// Convert a finished draw list into triangles for a target of `target` pixels.
pub fn tessellate(list: &DrawList, cache: &PathCache, target: Vec2) -> Tessellation {
    let mut out = Tessellation::default();
    let mut transform = Transform2::IDENTITY;

    for item in list.items() {
        match &item.command {
            DrawCommand::Clear(color) => out.clear = Some(*color),
            DrawCommand::SetTransform(t) => transform = *t,
            DrawCommand::GridLine { from, to, color, width } => {
                out.segment(transform.apply(*from), transform.apply(*to), *width, *color);
            }
            DrawCommand::FillPath { path, color } => {
                if color.a <= 0.0 {
                    continue;
                }
                let Some(cached) = cache.path(path.tier, path.index) else {
                    continue;
                };
                for tri in cached.indices.chunks_exact(3) {
                    let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| transform.apply(cached.vertices[i as usize]));
                    out.tri(a, b, c, *color);
                }
            }
            DrawCommand::StrokePath { path, color, width, dash } => {
                if color.a <= 0.0 {
                    continue;
                }
                let Some(cached) = cache.path(path.tier, path.index) else {
                    continue;
                };
                for ring in &cached.rings {
                    let points: Vec<Vec2> = cached.vertices[ring.clone()]
                        .iter()
                        .map(|v| transform.apply(*v))
                        .collect();
                    out.ring(&points, *width, *color, *dash);
                }
            }
            DrawCommand::Circle { center, radius, fill, stroke } => {
                if let Some(color) = fill {
                    out.circle_fill(*center, *radius, *color);
                }
                if let Some((color, width)) = stroke {
                    out.circle_stroke(*center, *radius, *width, *color);
                }
            }
            DrawCommand::Text { anchor, text, size, color } => {
                if color.a > 0.0 && !text.is_empty() {
                    out.texts.push(TextItem {
                        anchor: *anchor,
                        text: text.clone(),
                        size: *size,
                        color: *color,
                    });
                }
            }
            DrawCommand::Vignette { color } => out.vignette(target, *color),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lod::{LodTier, LodTiers};
    use crate::projection::{FlatProjection, FlatProjectionKind};
    use crate::render::draw_list::{DrawLayer, PathRef};
    use crate::world::entity::GeographicEntity;
    use crate::world::snapshot::WorldSnapshot;
    use geo_types::{polygon, MultiPolygon};

    fn cache() -> PathCache {
        let square = MultiPolygon::new(vec![polygon![
            (x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0),
        ]]);
        let world = WorldSnapshot::new(vec![GeographicEntity::new("sq", "Square", square)], Vec::new(), Vec::new());
        let mut cache = PathCache::new();
        cache.ensure(
            &FlatProjection::new(FlatProjectionKind::Equirectangular, 360.0),
            &LodTiers::build(&world),
        );
        cache
    }

    const SQ: PathRef = PathRef {
        tier: LodTier::Region,
        index: 0,
    };

    #[test]
    fn test_fill_uses_cached_triangles_and_transform() {
        let mut list = DrawList::new();
        list.push(DrawLayer::Background, DrawCommand::SetTransform(Transform2 {
            scale: 2.0,
            translate: Vec2::new(-300.0, 0.0),
        }));
        list.push(DrawLayer::Fill, DrawCommand::FillPath { path: SQ, color: Color::WHITE });
        let t = tessellate(&list, &cache(), Vec2::new(100.0, 100.0));
        assert_eq!(t.triangle_count(), 2);
        // Map x 180..190 scaled by 2 and shifted.
        let xs: Vec<f32> = t.vertices.iter().map(|v| v.position[0]).collect();
        assert!(xs.iter().all(|x| (*x - 60.0).abs() < 1e-3 || (*x - 80.0).abs() < 1e-3));
    }

    #[test]
    fn test_dashes_draw_fewer_segments() {
        let stroke = |dash| {
            let mut list = DrawList::new();
            list.push(DrawLayer::Border, DrawCommand::StrokePath {
                path: SQ,
                color: Color::WHITE,
                width: 1.0,
                dash,
            });
            tessellate(&list, &cache(), Vec2::splat(100.0)).triangle_count()
        };
        assert_eq!(stroke(None), 8);
        // 40 px of outline with a 6/4 pattern: four dashes, one per edge.
        assert_eq!(stroke(Some([6.0, 4.0])), 8);
        assert_eq!(stroke(Some([2.0, 3.0])), 16);
    }

    #[test]
    fn test_circles_text_and_transparent() {
        let mut list = DrawList::new();
        list.push(DrawLayer::Labels, DrawCommand::Circle {
            center: Vec2::splat(50.0),
            radius: 4.0,
            fill: Some(Color::WHITE),
            stroke: Some((Color::BLACK, 1.0)),
        });
        list.push(DrawLayer::Labels, DrawCommand::Text {
            anchor: Vec2::new(20.0, 30.0),
            text: "Alpha".into(),
            size: 12.0,
            color: Color::WHITE,
        });
        list.push(DrawLayer::Fill, DrawCommand::FillPath {
            path: SQ,
            color: Color::TRANSPARENT,
        });
        let t = tessellate(&list, &cache(), Vec2::splat(100.0));
        assert_eq!(t.triangle_count(), CIRCLE_SEGMENTS * 3);
        assert_eq!(t.texts.len(), 1);
        assert_eq!(t.texts[0].text, "Alpha");
        assert_eq!(t.texts[0].anchor, Vec2::new(20.0, 30.0));
    }

    #[test]
    fn test_text_kept_in_order_and_invisible_dropped() {
        let mut list = DrawList::new();
        for (name, alpha) in [("Alpha", 1.0), ("Hidden", 0.0), ("Beta", 0.5), ("", 1.0)] {
            list.push(DrawLayer::Labels, DrawCommand::Text {
                anchor: Vec2::splat(10.0),
                text: name.into(),
                size: 12.0,
                color: Color::WHITE.fade(alpha),
            });
        }
        let t = tessellate(&list, &cache(), Vec2::splat(100.0));
        let names: Vec<&str> = t.texts.iter().map(|item| item.text.as_str()).collect();
        assert_eq!(names, ["Alpha", "Beta"]);
        assert_eq!(t.triangle_count(), 0);
    }

    #[test]
    fn test_vignette_transparent_center() {
        let mut list = DrawList::new();
        list.push(DrawLayer::Background, DrawCommand::Clear(Color::BLACK));
        list.push(DrawLayer::Vignette, DrawCommand::Vignette {
            color: Color::rgba(0.0, 0.0, 0.0, 0.5),
        });
        let t = tessellate(&list, &cache(), Vec2::new(200.0, 100.0));
        assert_eq!(t.clear, Some(Color::BLACK));
        assert_eq!(t.triangle_count(), VIGNETTE_SEGMENTS * 2);
        let inner_alpha = t.vertices[0].color[3];
        assert_eq!(inner_alpha, 0.0);
    }
}
