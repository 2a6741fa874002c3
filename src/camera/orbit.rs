//! Orbit camera around the unit globe.
//!
//! Yaw and pitch are the longitude and latitude the camera hovers over, so
//! `fly_to` a geographic point is just a target change. Auto-rotation drifts
//! yaw eastward once the user has been idle for the configured timeout.

use glam::{Mat4, Vec2, Vec3, Vec4Swizzles};
use std::time::Duration;

use super::damp_factor;
use crate::core::config::{CameraConfig, GlobeConfig};
use crate::core::types::{GeoCoord, Viewport};
use crate::projection::globe::geo_to_unit;

const MAX_PITCH: f32 = 85.0;
/// Fraction of the smaller viewport dimension the globe radius may shrink to.
const MIN_SCREEN_RADIUS: f32 = 0.35;

fn wrap_degrees(deg: f32) -> f32 {
    (deg + 180.0).rem_euclid(360.0) - 180.0
}

#[derive(Debug, Clone)]
pub struct OrbitCamera {
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    pub target_yaw: f32,
    pub target_pitch: f32,
    pub target_distance: f32,
    viewport: Viewport,
    fov_y: f32,
    min_distance: f32,
    max_distance: f32,
    config_max_distance: f32,
    decay: f32,
    selection_zoom_floor: f32,
    orbit_deg_per_px: f32,
    auto_rotate_deg_per_sec: f32,
    idle_timeout: Duration,
    last_interaction: Option<Duration>,
    auto_rotating: bool,
}

impl OrbitCamera {
    pub fn new(viewport: Viewport, camera: &CameraConfig, globe: &GlobeConfig) -> Self {
        let mut cam = Self {
            yaw: 0.0,
            pitch: 20.0,
            distance: globe.max_distance,
            target_yaw: 0.0,
            target_pitch: 20.0,
            target_distance: globe.max_distance,
            viewport,
            fov_y: globe.fov_y_deg.to_radians(),
            min_distance: globe.min_distance,
            max_distance: globe.max_distance,
            config_max_distance: globe.max_distance,
            decay: camera.decay,
            selection_zoom_floor: camera.selection_zoom_floor,
            orbit_deg_per_px: globe.orbit_deg_per_px,
            auto_rotate_deg_per_sec: globe.auto_rotate_deg_per_sec,
            idle_timeout: Duration::from_secs_f32(globe.idle_timeout_secs.max(0.0)),
            last_interaction: None,
            auto_rotating: true,
        };
        cam.set_viewport(viewport);
        cam.distance = cam.max_distance;
        cam.target_distance = cam.max_distance;
        cam
    }

    /// Recompute the distance bounds: the far bound keeps the globe at least
    /// `MIN_SCREEN_RADIUS` of the smaller viewport dimension.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        let mut max = self.config_max_distance;
        if !viewport.is_empty() {
            let min_dim = viewport.width.min(viewport.height);
            let k = MIN_SCREEN_RADIUS * min_dim / (viewport.height / 2.0) * (self.fov_y / 2.0).tan();
            if k > 0.0 {
                max = max.min((1.0 + 1.0 / (k * k)).sqrt());
            }
        }
        self.max_distance = max.max(self.min_distance + 0.01);
        self.distance = self.distance.clamp(self.min_distance, self.max_distance);
        self.target_distance = self.target_distance.clamp(self.min_distance, self.max_distance);
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn distance_bounds(&self) -> (f32, f32) {
        (self.min_distance, self.max_distance)
    }

    pub fn is_auto_rotating(&self) -> bool {
        self.auto_rotating
    }

    pub fn eye(&self) -> Vec3 {
        geo_to_unit(GeoCoord::new(self.yaw as f64, self.pitch as f64)) * self.distance
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), Vec3::ZERO, Vec3::Y)
    }

    pub fn projection(&self) -> Mat4 {
        let aspect = if self.viewport.is_empty() {
            1.0
        } else {
            self.viewport.width / self.viewport.height
        };
        Mat4::perspective_rh(self.fov_y, aspect, 0.01, 100.0)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }

    /// Zoom-equivalent for LOD and label thresholds: 1 at the far bound.
    pub fn lod_zoom(&self) -> f32 {
        ((self.max_distance - 1.0) / (self.distance - 1.0).max(1e-3)).max(1.0)
    }

    fn distance_for_zoom(&self, zoom: f32) -> f32 {
        (1.0 + (self.max_distance - 1.0) / zoom.max(1.0)).clamp(self.min_distance, self.max_distance)
    }

    /// World-space ray through a screen point: (origin, unit direction).
    pub fn ray(&self, screen: Vec2) -> Option<(Vec3, Vec3)> {
        if self.viewport.is_empty() {
            return None;
        }
        let ndc = Vec2::new(
            2.0 * screen.x / self.viewport.width - 1.0,
            1.0 - 2.0 * screen.y / self.viewport.height,
        );
        let inv = self.view_projection().inverse();
        let near = inv.project_point3(ndc.extend(0.0));
        let far = inv.project_point3(ndc.extend(1.0));
        let dir = (far - near).try_normalize()?;
        Some((self.eye(), dir))
    }

    /// Screen position of a world point, `None` behind the camera.
    pub fn project_to_screen(&self, p: Vec3) -> Option<Vec2> {
        let clip = self.view_projection() * p.extend(1.0);
        if clip.w <= 1e-6 {
            return None;
        }
        let ndc = clip.xyz() / clip.w;
        Some(Vec2::new(
            (ndc.x + 1.0) / 2.0 * self.viewport.width,
            (1.0 - ndc.y) / 2.0 * self.viewport.height,
        ))
    }

    /// True when a point on the unit sphere faces the camera.
    pub fn is_front_facing(&self, p: Vec3) -> bool {
        self.eye().dot(p) > 1.0
    }

    /// Rotate by a drag delta. Writes current and target for immediate feel.
    pub fn orbit(&mut self, delta: Vec2) {
        let rate = self.orbit_deg_per_px * self.distance / 3.0;
        let d_yaw = -delta.x * rate;
        let d_pitch = delta.y * rate;
        self.yaw += d_yaw;
        self.target_yaw += d_yaw;
        self.pitch = (self.pitch + d_pitch).clamp(-MAX_PITCH, MAX_PITCH);
        self.target_pitch = (self.target_pitch + d_pitch).clamp(-MAX_PITCH, MAX_PITCH);
    }

    /// Dolly toward (`factor > 1`) or away from the globe.
    pub fn zoom_by(&mut self, factor: f32) {
        if !(factor.is_finite() && factor > 0.0) {
            return;
        }
        let height = (self.target_distance - 1.0) / factor;
        self.target_distance = (1.0 + height).clamp(self.min_distance, self.max_distance);
    }

    /// Turn to face `coord`, raising the zoom to the selection floor when far out.
    pub fn fly_to(&mut self, coord: GeoCoord, desired_zoom: f32) {
        let delta = wrap_degrees(coord.lon as f32 - self.target_yaw);
        self.target_yaw += delta;
        self.target_pitch = (coord.lat as f32).clamp(-MAX_PITCH, MAX_PITCH);
        let mut zoom = desired_zoom;
        if self.lod_zoom() < self.selection_zoom_floor {
            zoom = zoom.max(self.selection_zoom_floor);
        }
        self.target_distance = self.distance_for_zoom(zoom);
    }

    /// Suspend auto-rotation; it resumes after the idle timeout.
    pub fn note_interaction(&mut self, now: Duration) {
        self.last_interaction = Some(now);
        self.auto_rotating = false;
    }

    /// Advance one frame. Returns true while moving.
    pub fn update(&mut self, dt: f32, now: Duration) -> bool {
        self.auto_rotating = match self.last_interaction {
            None => true,
            Some(last) => now.saturating_sub(last) >= self.idle_timeout,
        };
        if self.auto_rotating && dt > 0.0 {
            let step = self.auto_rotate_deg_per_sec * dt;
            self.yaw += step;
            self.target_yaw += step;
        }

        let t = damp_factor(self.decay, dt);
        self.yaw += (self.target_yaw - self.yaw) * t;
        self.pitch += (self.target_pitch - self.pitch) * t;
        self.distance += (self.target_distance - self.distance) * t;
        self.distance = self.distance.clamp(self.min_distance, self.max_distance);

        // Keep angles bounded without a visible jump.
        if self.yaw.abs() > 540.0 {
            let shift = (self.yaw / 360.0).round() * 360.0;
            self.yaw -= shift;
            self.target_yaw -= shift;
        }

        self.auto_rotating
            || (self.yaw - self.target_yaw).abs() > 1e-3
            || (self.pitch - self.target_pitch).abs() > 1e-3
            || (self.distance - self.target_distance).abs() > 1e-4
    }

    pub fn settle(&mut self) {
        self.yaw = self.target_yaw;
        self.pitch = self.target_pitch;
        self.distance = self.target_distance;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::globe::{ray_sphere, unit_to_geo};

    fn camera() -> OrbitCamera {
        OrbitCamera::new(Viewport::new(1280.0, 720.0), &CameraConfig::default(), &GlobeConfig::default())
    }

    #[test]
    fn test_screen_center_hits_facing_point() {
        let mut cam = camera();
        cam.fly_to(GeoCoord::new(30.0, 10.0), 1.0);
        cam.settle();
        let (origin, dir) = cam.ray(cam.viewport().center()).unwrap();
        let hit = unit_to_geo(ray_sphere(origin, dir).unwrap());
        assert!((hit.lon - 30.0).abs() < 0.1);
        assert!((hit.lat - 10.0).abs() < 0.1);
    }

    #[test]
    fn test_project_then_ray_round_trip() {
        let cam = camera();
        let p = geo_to_unit(GeoCoord::new(15.0, 25.0));
        assert!(cam.is_front_facing(p));
        let screen = cam.project_to_screen(p).unwrap();
        let (origin, dir) = cam.ray(screen).unwrap();
        let hit = ray_sphere(origin, dir).unwrap();
        assert!((hit - p).length() < 1e-3);
    }

    #[test]
    fn test_corner_ray_misses_globe() {
        let cam = camera();
        let (origin, dir) = cam.ray(Vec2::new(0.0, 0.0)).unwrap();
        assert!(ray_sphere(origin, dir).is_none());
    }

    #[test]
    fn test_auto_rotation_resumes_after_idle() {
        let mut cam = camera();
        cam.note_interaction(Duration::from_secs(10));
        cam.update(0.016, Duration::from_secs(12));
        assert!(!cam.is_auto_rotating());
        let yaw = cam.target_yaw;
        cam.update(0.016, Duration::from_secs(16));
        assert!(cam.is_auto_rotating());
        assert!(cam.target_yaw > yaw);
    }

    #[test]
    fn test_dolly_clamped() {
        let mut cam = camera();
        cam.zoom_by(1e6);
        assert_eq!(cam.target_distance, cam.distance_bounds().0);
        cam.zoom_by(1e-6);
        assert_eq!(cam.target_distance, cam.distance_bounds().1);
    }

    #[test]
    fn test_far_bound_keeps_globe_visible() {
        let cam = camera();
        let (_, max) = cam.distance_bounds();
        // Angular radius of the globe from the far bound, in screen pixels.
        let radius_px = (1.0 / (max * max - 1.0).sqrt()) / (cam.fov_y / 2.0).tan() * 360.0;
        assert!(radius_px >= 0.35 * 720.0 - 0.5);
    }
}
