//! Theme palettes consumed by the path cache, renderer and labels.

use serde::{Deserialize, Serialize};

use super::color::Color;

/// Selectable visual themes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeKind {
    #[default]
    Classic,
    Parchment,
    Midnight,
    Contrast,
}

impl ThemeKind {
    pub const ALL: [ThemeKind; 4] = [Self::Classic, Self::Parchment, Self::Midnight, Self::Contrast];

    /// Next theme in [`ThemeKind::ALL`], wrapping.
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn palette(self) -> Palette {
        match self {
            Self::Classic => Palette::classic(),
            Self::Parchment => Palette::parchment(),
            Self::Midnight => Palette::midnight(),
            Self::Contrast => Palette::contrast(),
        }
    }
}

impl std::str::FromStr for ThemeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "classic" => Ok(Self::Classic),
            "parchment" => Ok(Self::Parchment),
            "midnight" => Ok(Self::Midnight),
            "contrast" => Ok(Self::Contrast),
            other => Err(format!("unknown theme '{}'", other)),
        }
    }
}

/// Colors and intensities for one theme.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    pub kind: ThemeKind,
    pub background: Color,
    pub grid: Color,
    /// Fill for unowned entities without a usable base color.
    pub neutral_fill: Color,
    /// How strongly an entity's own base color shows when neutral (0..1).
    pub base_color_intensity: f32,
    /// How strongly a faction color replaces the land tone when owned (0..1).
    pub owned_intensity: f32,
    pub land_tone: Color,
    pub border: Color,
    pub border_hover: Color,
    pub player_border: Color,
    pub border_width: f32,
    pub player_border_width: f32,
    /// Brighten amount at full hover brightness.
    pub hover_boost: f32,
    pub selection_boost: f32,
    pub selection_glow: Color,
    pub selection_line: Color,
    pub war_border: Color,
    pub allied_border: Color,
    pub hostile_border: Color,
    pub flash: Color,
    pub ring: Color,
    pub label: Color,
    pub city_marker: Color,
    pub vignette: Color,
    pub atmosphere: Color,
    pub star: Color,
}

impl Palette {
    pub fn classic() -> Self {
        Self {
            kind: ThemeKind::Classic,
            background: Color::rgb(0.07, 0.11, 0.18),
            grid: Color::rgba(0.55, 0.7, 0.9, 0.08),
            neutral_fill: Color::rgb(0.42, 0.44, 0.42),
            base_color_intensity: 0.55,
            owned_intensity: 0.85,
            land_tone: Color::rgb(0.36, 0.38, 0.34),
            border: Color::rgba(0.1, 0.12, 0.14, 0.85),
            border_hover: Color::rgba(0.85, 0.88, 0.92, 0.95),
            player_border: Color::rgb(1.0, 0.84, 0.2),
            border_width: 1.0,
            player_border_width: 2.5,
            hover_boost: 0.22,
            selection_boost: 0.12,
            selection_glow: Color::rgba(1.0, 0.9, 0.45, 0.45),
            selection_line: Color::rgb(1.0, 0.95, 0.7),
            war_border: Color::rgb(0.95, 0.15, 0.12),
            allied_border: Color::rgba(0.3, 0.75, 1.0, 0.55),
            hostile_border: Color::rgba(1.0, 0.55, 0.1, 0.7),
            flash: Color::WHITE,
            ring: Color::rgb(1.0, 0.95, 0.8),
            label: Color::rgba(0.95, 0.96, 0.98, 0.9),
            city_marker: Color::rgb(0.98, 0.98, 0.92),
            vignette: Color::rgba(0.0, 0.0, 0.0, 0.45),
            atmosphere: Color::rgba(0.35, 0.6, 1.0, 0.35),
            star: Color::rgba(0.9, 0.92, 1.0, 0.85),
        }
    }

    pub fn parchment() -> Self {
        Self {
            kind: ThemeKind::Parchment,
            background: Color::rgb(0.82, 0.76, 0.62),
            grid: Color::rgba(0.35, 0.25, 0.12, 0.12),
            neutral_fill: Color::rgb(0.86, 0.8, 0.66),
            base_color_intensity: 0.35,
            owned_intensity: 0.6,
            land_tone: Color::rgb(0.9, 0.84, 0.7),
            border: Color::rgba(0.3, 0.2, 0.1, 0.8),
            border_hover: Color::rgba(0.15, 0.08, 0.02, 0.95),
            player_border: Color::rgb(0.75, 0.02, 0.02),
            border_width: 1.2,
            player_border_width: 2.5,
            hover_boost: 0.18,
            selection_boost: 0.1,
            selection_glow: Color::rgba(0.6, 0.1, 0.05, 0.35),
            selection_line: Color::rgb(0.4, 0.05, 0.02),
            war_border: Color::rgb(0.7, 0.05, 0.05),
            allied_border: Color::rgba(0.1, 0.3, 0.6, 0.5),
            hostile_border: Color::rgba(0.75, 0.35, 0.05, 0.65),
            flash: Color::rgb(1.0, 0.98, 0.9),
            ring: Color::rgb(0.45, 0.2, 0.05),
            label: Color::rgba(0.2, 0.12, 0.05, 0.9),
            city_marker: Color::rgb(0.25, 0.15, 0.05),
            vignette: Color::rgba(0.3, 0.18, 0.05, 0.5),
            atmosphere: Color::rgba(0.95, 0.85, 0.6, 0.3),
            star: Color::rgba(0.98, 0.94, 0.85, 0.7),
        }
    }

    pub fn midnight() -> Self {
        Self {
            kind: ThemeKind::Midnight,
            background: Color::rgb(0.01, 0.02, 0.05),
            grid: Color::rgba(0.3, 0.5, 1.0, 0.1),
            neutral_fill: Color::rgb(0.12, 0.14, 0.2),
            base_color_intensity: 0.3,
            owned_intensity: 0.7,
            land_tone: Color::rgb(0.1, 0.12, 0.18),
            border: Color::rgba(0.35, 0.5, 0.8, 0.5),
            border_hover: Color::rgba(0.7, 0.85, 1.0, 0.95),
            player_border: Color::rgb(0.3, 1.0, 0.85),
            border_width: 1.0,
            player_border_width: 2.5,
            hover_boost: 0.3,
            selection_boost: 0.15,
            selection_glow: Color::rgba(0.3, 0.9, 1.0, 0.5),
            selection_line: Color::rgb(0.8, 1.0, 1.0),
            war_border: Color::rgb(1.0, 0.2, 0.35),
            allied_border: Color::rgba(0.3, 0.9, 0.6, 0.5),
            hostile_border: Color::rgba(1.0, 0.6, 0.2, 0.65),
            flash: Color::rgb(0.85, 0.95, 1.0),
            ring: Color::rgb(0.6, 0.9, 1.0),
            label: Color::rgba(0.8, 0.9, 1.0, 0.85),
            city_marker: Color::rgb(1.0, 0.9, 0.6),
            vignette: Color::rgba(0.0, 0.0, 0.02, 0.6),
            atmosphere: Color::rgba(0.2, 0.45, 1.0, 0.45),
            star: Color::rgba(0.85, 0.9, 1.0, 0.95),
        }
    }

    pub fn contrast() -> Self {
        Self {
            kind: ThemeKind::Contrast,
            background: Color::BLACK,
            grid: Color::rgba(1.0, 1.0, 1.0, 0.12),
            neutral_fill: Color::rgb(0.3, 0.3, 0.3),
            base_color_intensity: 0.0,
            owned_intensity: 1.0,
            land_tone: Color::rgb(0.3, 0.3, 0.3),
            border: Color::WHITE,
            border_hover: Color::rgb(1.0, 1.0, 0.0),
            player_border: Color::rgb(0.0, 1.0, 1.0),
            border_width: 1.5,
            player_border_width: 3.0,
            hover_boost: 0.35,
            selection_boost: 0.2,
            selection_glow: Color::rgba(1.0, 1.0, 0.0, 0.6),
            selection_line: Color::rgb(1.0, 1.0, 0.0),
            war_border: Color::rgb(1.0, 0.0, 0.0),
            allied_border: Color::rgba(0.0, 0.6, 1.0, 0.7),
            hostile_border: Color::rgba(1.0, 0.5, 0.0, 0.8),
            flash: Color::WHITE,
            ring: Color::WHITE,
            label: Color::WHITE,
            city_marker: Color::WHITE,
            vignette: Color::rgba(0.0, 0.0, 0.0, 0.3),
            atmosphere: Color::rgba(1.0, 1.0, 1.0, 0.25),
            star: Color::WHITE,
        }
    }

    /// Display color for an owned entity: faction color over the land tone.
    pub fn owned_fill(&self, faction_color: Color) -> Color {
        self.land_tone.lerp(faction_color.with_alpha(1.0), self.owned_intensity)
    }

    /// Display color for a neutral entity with an optional base color.
    pub fn neutral_entity_fill(&self, base: Option<Color>) -> Color {
        match base {
            Some(base) => self.neutral_fill.lerp(base.with_alpha(1.0), self.base_color_intensity),
            None => self.neutral_fill,
        }
    }

    /// Steady-state fill: owner's faction color when owned, else the entity's base color.
    pub fn entity_fill(&self, owner_color: Option<Color>, base: Color) -> Color {
        match owner_color {
            Some(color) => self.owned_fill(color),
            None => self.neutral_entity_fill(Some(base)),
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::classic()
    }
}
