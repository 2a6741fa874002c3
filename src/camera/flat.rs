//! Pan/zoom camera over the flat map plane.
//!
//! Zoom is magnification relative to the "fit" scale at which the map just
//! covers the viewport, so the lower bound is always 1.0 and the map can
//! never be scaled smaller than the viewport.

use glam::Vec2;

use super::damp_factor;
use crate::core::config::CameraConfig;
use crate::core::types::Viewport;

pub const MIN_ZOOM: f32 = 1.0;

/// Affine map from world (map-plane) to screen: `screen = world * scale + translate`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform2 {
    pub scale: f32,
    pub translate: Vec2,
}

impl Transform2 {
    pub const IDENTITY: Transform2 = Transform2 {
        scale: 1.0,
        translate: Vec2::ZERO,
    };

    pub fn apply(&self, p: Vec2) -> Vec2 {
        p * self.scale + self.translate
    }
}

#[derive(Debug, Clone)]
pub struct FlatCamera {
    pub center: Vec2,
    pub zoom: f32,
    pub target_center: Vec2,
    pub target_zoom: f32,
    viewport: Viewport,
    map_size: Vec2,
    /// Pixels per world unit at zoom 1.
    fit_scale: f32,
    max_zoom: f32,
    decay: f32,
    selection_zoom_floor: f32,
}

impl FlatCamera {
    /// Camera showing the whole map, centered.
    pub fn new(viewport: Viewport, map_size: Vec2, config: &CameraConfig) -> Self {
        let mut camera = Self {
            center: map_size / 2.0,
            zoom: MIN_ZOOM,
            target_center: map_size / 2.0,
            target_zoom: MIN_ZOOM,
            viewport,
            map_size,
            fit_scale: 1.0,
            max_zoom: config.max_zoom.max(MIN_ZOOM),
            decay: config.decay,
            selection_zoom_floor: config.selection_zoom_floor,
        };
        camera.fit_scale = camera.compute_fit_scale();
        camera.center = camera.clamp_center(camera.center, camera.zoom);
        camera.target_center = camera.clamp_center(camera.target_center, camera.target_zoom);
        camera
    }

    fn compute_fit_scale(&self) -> f32 {
        if self.viewport.is_empty() || self.map_size.x <= 0.0 || self.map_size.y <= 0.0 {
            return 1.0;
        }
        (self.viewport.width / self.map_size.x).max(self.viewport.height / self.map_size.y)
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn map_size(&self) -> Vec2 {
        self.map_size
    }

    pub fn min_zoom(&self) -> f32 {
        MIN_ZOOM
    }

    pub fn max_zoom(&self) -> f32 {
        self.max_zoom
    }

    /// Current pixels per world unit.
    pub fn pixel_scale(&self) -> f32 {
        self.zoom * self.fit_scale
    }

    /// Recompute the zoom bound for a new viewport. The map plane is refitted
    /// by the caller, so centers are rescaled to keep the same geography in view.
    pub fn set_viewport(&mut self, viewport: Viewport, map_size: Vec2) {
        if self.map_size.x > 0.0 && map_size.x > 0.0 {
            let ratio = map_size.x / self.map_size.x;
            self.center *= ratio;
            self.target_center *= ratio;
        }
        self.viewport = viewport;
        self.map_size = map_size;
        self.fit_scale = self.compute_fit_scale();
        self.zoom = self.zoom.clamp(MIN_ZOOM, self.max_zoom);
        self.target_zoom = self.target_zoom.clamp(MIN_ZOOM, self.max_zoom);
        self.center = self.clamp_center(self.center, self.zoom);
        self.target_center = self.clamp_center(self.target_center, self.target_zoom);
    }

    /// Keep the viewport inside the map rectangle at the given zoom.
    fn clamp_center(&self, center: Vec2, zoom: f32) -> Vec2 {
        let half = self.viewport.size() / (2.0 * zoom * self.fit_scale);
        let axis = |c: f32, half: f32, extent: f32| {
            if half * 2.0 >= extent {
                extent / 2.0
            } else {
                c.clamp(half, extent - half)
            }
        };
        Vec2::new(
            axis(center.x, half.x, self.map_size.x),
            axis(center.y, half.y, self.map_size.y),
        )
    }

    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        self.transform().apply(world)
    }

    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        (screen - self.viewport.center()) / self.pixel_scale() + self.center
    }

    pub fn transform(&self) -> Transform2 {
        let scale = self.pixel_scale();
        Transform2 {
            scale,
            translate: self.viewport.center() - self.center * scale,
        }
    }

    /// Visible world rectangle (min, max).
    pub fn visible_bounds(&self) -> (Vec2, Vec2) {
        let half = self.viewport.size() / (2.0 * self.pixel_scale());
        (self.center - half, self.center + half)
    }

    /// Move the target by a screen-space delta (content follows the pointer).
    pub fn pan(&mut self, delta: Vec2) {
        let world = delta / self.pixel_scale();
        self.target_center = self.clamp_center(self.target_center - world, self.target_zoom);
    }

    /// Drag pan: writes target and current together for immediate feel.
    pub fn pan_immediate(&mut self, delta: Vec2) {
        let world = delta / self.pixel_scale();
        self.center = self.clamp_center(self.center - world, self.zoom);
        self.target_center = self.clamp_center(self.target_center - world, self.target_zoom);
    }

    /// Scale the target zoom by `factor`, keeping the point under `screen` fixed.
    pub fn zoom_at(&mut self, screen: Vec2, factor: f32) {
        if !(factor.is_finite() && factor > 0.0) {
            return;
        }
        let anchor = self.screen_to_world(screen);
        let new_zoom = (self.target_zoom * factor).clamp(MIN_ZOOM, self.max_zoom);
        let offset = (screen - self.viewport.center()) / (new_zoom * self.fit_scale);
        self.target_zoom = new_zoom;
        self.target_center = self.clamp_center(anchor - offset, new_zoom);
    }

    /// Center the target on `world`. When the camera is zoomed out past the
    /// selection floor the requested zoom is raised to it.
    pub fn fly_to(&mut self, world: Vec2, desired_zoom: f32) {
        let mut zoom = desired_zoom;
        if self.zoom < self.selection_zoom_floor {
            zoom = zoom.max(self.selection_zoom_floor);
        }
        self.target_zoom = zoom.clamp(MIN_ZOOM, self.max_zoom);
        self.target_center = self.clamp_center(world, self.target_zoom);
    }

    /// Ease current toward target. Returns true while still moving.
    pub fn update(&mut self, dt: f32) -> bool {
        let t = damp_factor(self.decay, dt);
        self.zoom += (self.target_zoom - self.zoom) * t;
        self.center = self.center.lerp(self.target_center, t);

        let settled = (self.zoom - self.target_zoom).abs() < 1e-4
            && self.center.distance(self.target_center) * self.pixel_scale() < 0.01;
        if settled {
            self.zoom = self.target_zoom;
            self.center = self.target_center;
        }
        self.zoom = self.zoom.clamp(MIN_ZOOM, self.max_zoom);
        self.center = self.clamp_center(self.center, self.zoom);
        !settled
    }

    /// Jump current to target.
    pub fn settle(&mut self) {
        self.zoom = self.target_zoom;
        self.center = self.target_center;
    }
}
