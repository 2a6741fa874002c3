//! Engine configuration with documented constants
//!
//! All tuning numbers for camera feel, level of detail, interaction and
//! animation timing are collected here. Every section deserializes from TOML
//! with defaults for omitted keys.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::error::{EngineError, Result};
use crate::core::types::{FactionId, PresentationMode};
use crate::projection::FlatProjectionKind;
use crate::theme::ThemeKind;

/// Top-level configuration for a [`crate::engine::MapEngine`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub mode: PresentationMode,
    pub projection: FlatProjectionKind,
    pub theme: ThemeKind,
    /// Faction controlled by the local player; its entities get the bright border.
    pub player_faction: Option<FactionId>,
    pub camera: CameraConfig,
    pub globe: GlobeConfig,
    pub lod: LodConfig,
    pub interaction: InteractionConfig,
    pub transitions: TransitionConfig,
    pub labels: LabelConfig,
}

// === CAMERA ===

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Fraction of the remaining distance to target left after one second.
    ///
    /// Each frame applies `current += (target - current) * (1 - decay^dt)`,
    /// so perceived speed does not depend on frame rate. At 0.0005 the camera
    /// covers ~12% of the gap per 60Hz frame.
    pub decay: f32,

    /// Upper zoom bound (magnification relative to the fitted map).
    pub max_zoom: f32,

    /// Zoom that `fly_to` raises the request to when the camera is further out.
    pub selection_zoom_floor: f32,

    /// Zoom factor per wheel notch.
    pub wheel_step: f32,

    /// Pixels moved per keyboard pan press.
    pub keyboard_pan_px: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            decay: 0.0005,
            max_zoom: 40.0,
            selection_zoom_floor: 2.0,
            wheel_step: 1.15,
            keyboard_pan_px: 40.0,
        }
    }
}

// === GLOBE ===

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobeConfig {
    /// Vertical field of view in degrees.
    pub fov_y_deg: f32,

    /// Closest camera distance from the globe center (globe radius = 1).
    pub min_distance: f32,

    /// Furthest camera distance. Further capped per viewport so the globe
    /// never shrinks below a usable size.
    pub max_distance: f32,

    /// Seconds without interaction before auto-rotation resumes.
    pub idle_timeout_secs: f32,

    /// Auto-rotation speed around the polar axis.
    pub auto_rotate_deg_per_sec: f32,

    /// Orbit sensitivity for drags, degrees per pixel at distance 1.
    pub orbit_deg_per_px: f32,

    /// Offscreen surface texture size (equirectangular, 2:1).
    pub texture_width: u32,
    pub texture_height: u32,

    pub star_count: usize,
    pub star_seed: u64,
}

impl Default for GlobeConfig {
    fn default() -> Self {
        Self {
            fov_y_deg: 45.0,
            min_distance: 1.15,
            max_distance: 4.0,
            idle_timeout_secs: 5.0,
            auto_rotate_deg_per_sec: 3.0,
            orbit_deg_per_px: 0.25,
            texture_width: 2048,
            texture_height: 1024,
            star_count: 1500,
            star_seed: 7,
        }
    }
}

// === LEVEL OF DETAIL ===

/// Zoom windows over which adjacent tiers cross-fade.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LodConfig {
    pub region_fade_start: f32,
    pub region_fade_end: f32,
    pub subregion_fade_start: f32,
    pub subregion_fade_end: f32,
}

impl Default for LodConfig {
    fn default() -> Self {
        Self {
            region_fade_start: 3.0,
            region_fade_end: 3.5,
            subregion_fade_start: 6.0,
            subregion_fade_end: 7.0,
        }
    }
}

// === INTERACTION ===

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Pointer travel (pixels) after which a press becomes a drag instead of a click.
    pub drag_threshold_px: f32,

    /// Maximum hover hit-test rate. Clicks are never throttled.
    pub hover_hz: f32,

    /// Hover brightness change per second (0 to 1 in 1/rate seconds).
    pub hover_fade_per_sec: f32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            drag_threshold_px: 4.0,
            hover_hz: 25.0,
            hover_fade_per_sec: 6.0,
        }
    }
}

// === TRANSITIONS ===

/// Ownership-change animation timeline, in milliseconds from registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionConfig {
    pub flash_ms: f32,
    pub blend_start_ms: f32,
    pub blend_end_ms: f32,
    pub ring_start_ms: f32,
    pub ring_end_ms: f32,
    /// Entries older than this are purged.
    pub lifetime_ms: f32,
    pub ring_max_radius_px: f32,
    /// Duration of the emphasis drawn when the selection changes.
    pub selection_focus_ms: f32,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            flash_ms: 300.0,
            blend_start_ms: 300.0,
            blend_end_ms: 800.0,
            ring_start_ms: 200.0,
            ring_end_ms: 1000.0,
            lifetime_ms: 1200.0,
            ring_max_radius_px: 48.0,
            selection_focus_ms: 450.0,
        }
    }
}

// === LABELS ===

/// One step of the label ladder: at `min_zoom` and above, entities with at
/// least `min_population` get a name label.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LabelRung {
    pub min_zoom: f32,
    pub min_population: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    /// Sorted by ascending `min_zoom`.
    pub ladder: Vec<LabelRung>,
    pub capital_marker_zoom: f32,
    pub city_marker_zoom: f32,
    pub max_labels: usize,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            ladder: vec![
                LabelRung { min_zoom: 0.0, min_population: 50_000_000 },
                LabelRung { min_zoom: 1.5, min_population: 10_000_000 },
                LabelRung { min_zoom: 3.0, min_population: 1_000_000 },
                LabelRung { min_zoom: 5.0, min_population: 0 },
            ],
            capital_marker_zoom: 4.0,
            city_marker_zoom: 6.0,
            max_labels: 120,
        }
    }
}

impl EngineConfig {
    /// Parse configuration from TOML text, then validate it.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(EngineError::InvalidConfig(msg));

        if !(self.camera.decay > 0.0 && self.camera.decay < 1.0) {
            return invalid(format!("camera.decay ({}) must be in (0, 1)", self.camera.decay));
        }
        if self.camera.max_zoom < 1.0 {
            return invalid(format!("camera.max_zoom ({}) must be >= 1", self.camera.max_zoom));
        }
        if self.camera.wheel_step <= 1.0 {
            return invalid(format!("camera.wheel_step ({}) must be > 1", self.camera.wheel_step));
        }

        let lod = &self.lod;
        if !(lod.region_fade_start < lod.region_fade_end
            && lod.region_fade_end <= lod.subregion_fade_start
            && lod.subregion_fade_start < lod.subregion_fade_end)
        {
            return invalid(format!(
                "lod fade windows must be ordered: [{}, {}] then [{}, {}]",
                lod.region_fade_start, lod.region_fade_end, lod.subregion_fade_start, lod.subregion_fade_end
            ));
        }

        if self.globe.min_distance <= 1.0 || self.globe.max_distance <= self.globe.min_distance {
            return invalid(format!(
                "globe distances must satisfy 1 < min ({}) < max ({})",
                self.globe.min_distance, self.globe.max_distance
            ));
        }
        if self.globe.texture_width == 0 || self.globe.texture_height == 0 {
            return invalid("globe texture size must be non-zero".into());
        }

        if self.interaction.hover_hz <= 0.0 {
            return invalid(format!("interaction.hover_hz ({}) must be positive", self.interaction.hover_hz));
        }

        let t = &self.transitions;
        if t.blend_start_ms > t.blend_end_ms || t.ring_start_ms > t.ring_end_ms {
            return invalid("transition phases must start before they end".into());
        }
        if t.flash_ms > t.lifetime_ms || t.blend_end_ms > t.lifetime_ms || t.ring_end_ms > t.lifetime_ms {
            return invalid(format!("transition phases must finish within lifetime_ms ({})", t.lifetime_ms));
        }

        if self
            .labels
            .ladder
            .windows(2)
            .any(|w| w[0].min_zoom > w[1].min_zoom)
        {
            return invalid("labels.ladder must be sorted by min_zoom".into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            mode = "globe"
            theme = "midnight"
            player_faction = "red"

            [camera]
            max_zoom = 20.0
            "#,
        )
        .unwrap();

        assert_eq!(config.mode, PresentationMode::Globe);
        assert_eq!(config.theme, ThemeKind::Midnight);
        assert_eq!(config.player_faction, Some(FactionId::from("red")));
        assert_eq!(config.camera.max_zoom, 20.0);
        assert_eq!(config.camera.wheel_step, 1.15);
        assert_eq!(config.lod.region_fade_start, 3.0);
    }

    #[test]
    fn test_unordered_fade_windows_rejected() {
        let mut config = EngineConfig::default();
        config.lod.subregion_fade_start = 2.0;
        assert!(matches!(config.validate(), Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn test_transition_outside_lifetime_rejected() {
        let mut config = EngineConfig::default();
        config.transitions.ring_end_ms = 5000.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_toml_is_error() {
        assert!(matches!(
            EngineConfig::from_toml_str("camera = 3"),
            Err(EngineError::Toml(_))
        ));
    }
}
