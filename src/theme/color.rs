//! RGBA color with CSS-style parsing and blending helpers.

use serde::{Deserialize, Serialize};

/// RGBA color (0.0 to 1.0 per channel)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);
    /// Substituted for any color string that fails to parse.
    pub const NEUTRAL_GRAY: Color = Color::rgba(0.5, 0.5, 0.5, 1.0);

    /// Pack color into u32 (RGBA8 format).
    pub fn to_u32(&self) -> u32 {
        let r = (self.r.clamp(0.0, 1.0) * 255.0).round() as u32;
        let g = (self.g.clamp(0.0, 1.0) * 255.0).round() as u32;
        let b = (self.b.clamp(0.0, 1.0) * 255.0).round() as u32;
        let a = (self.a.clamp(0.0, 1.0) * 255.0).round() as u32;
        (r << 24) | (g << 16) | (b << 8) | a
    }

    /// Unpack color from u32 (RGBA8 format).
    pub fn from_u32(packed: u32) -> Self {
        Self {
            r: ((packed >> 24) & 0xFF) as f32 / 255.0,
            g: ((packed >> 16) & 0xFF) as f32 / 255.0,
            b: ((packed >> 8) & 0xFF) as f32 / 255.0,
            a: (packed & 0xFF) as f32 / 255.0,
        }
    }

    /// Channels as an array, for vertex data.
    pub fn to_array(&self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Parse `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb(r, g, b)`, `rgba(r, g, b, a)`
    /// or one of a few named colors.
    pub fn parse(input: &str) -> Option<Self> {
        let s = input.trim();
        if let Some(hex) = s.strip_prefix('#') {
            return Self::parse_hex(hex);
        }
        let lower = s.to_ascii_lowercase();
        if let Some(body) = lower.strip_prefix("rgba(").and_then(|b| b.strip_suffix(')')) {
            return Self::parse_components(body, true);
        }
        if let Some(body) = lower.strip_prefix("rgb(").and_then(|b| b.strip_suffix(')')) {
            return Self::parse_components(body, false);
        }
        match lower.as_str() {
            "white" => Some(Self::WHITE),
            "black" => Some(Self::BLACK),
            "gray" | "grey" => Some(Self::NEUTRAL_GRAY),
            "red" => Some(Self::rgb(1.0, 0.0, 0.0)),
            "green" => Some(Self::rgb(0.0, 0.5, 0.0)),
            "blue" => Some(Self::rgb(0.0, 0.0, 1.0)),
            "transparent" => Some(Self::TRANSPARENT),
            _ => None,
        }
    }

    /// Parse, falling back to neutral gray so a bad color never fails a draw.
    pub fn parse_or_neutral(input: &str) -> Self {
        Self::parse(input).unwrap_or_else(|| {
            tracing::debug!("Unparseable color {:?}, using neutral gray", input);
            Self::NEUTRAL_GRAY
        })
    }

    fn parse_hex(hex: &str) -> Option<Self> {
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok().map(|v| v as f32 / 255.0);
        match hex.len() {
            3 => {
                let expand = |i: usize| {
                    let c = &hex[i..i + 1];
                    channel(&format!("{c}{c}"))
                };
                Some(Self::rgb(expand(0)?, expand(1)?, expand(2)?))
            }
            6 => Some(Self::rgb(channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?)),
            8 => Some(Self::rgba(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
                channel(&hex[6..8])?,
            )),
            _ => None,
        }
    }

    fn parse_components(body: &str, with_alpha: bool) -> Option<Self> {
        let parts: Vec<&str> = body.split(',').map(str::trim).collect();
        let expected = if with_alpha { 4 } else { 3 };
        if parts.len() != expected {
            return None;
        }
        let channel = |s: &str| {
            s.parse::<f32>()
                .ok()
                .filter(|v| (0.0..=255.0).contains(v))
                .map(|v| v / 255.0)
        };
        let a = if with_alpha {
            parts[3].parse::<f32>().ok().filter(|v| (0.0..=1.0).contains(v))?
        } else {
            1.0
        };
        Some(Self::rgba(channel(parts[0])?, channel(parts[1])?, channel(parts[2])?, a))
    }

    /// Linear interpolation of every channel; `t` is clamped to [0, 1].
    pub fn lerp(&self, other: Color, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }

    pub fn with_alpha(&self, a: f32) -> Self {
        Self { a: a.clamp(0.0, 1.0), ..*self }
    }

    /// Scale alpha by a factor (e.g. tier opacity).
    pub fn fade(&self, factor: f32) -> Self {
        self.with_alpha(self.a * factor)
    }

    /// Move RGB toward white by `amount` (0 = unchanged, 1 = white).
    pub fn brighten(&self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);
        Self {
            r: self.r + (1.0 - self.r) * amount,
            g: self.g + (1.0 - self.g) * amount,
            b: self.b + (1.0 - self.b) * amount,
            a: self.a,
        }
    }

    /// Darken color by a factor (0.0 = black, 1.0 = unchanged)
    pub fn darken(&self, factor: f32) -> Self {
        Self {
            r: self.r * factor,
            g: self.g * factor,
            b: self.b * factor,
            a: self.a,
        }
    }

    /// Euclidean RGB distance, used by tests and blend checks.
    pub fn distance(&self, other: &Color) -> f32 {
        let dr = self.r - other.r;
        let dg = self.g - other.g;
        let db = self.b - other.b;
        (dr * dr + dg * dg + db * db).sqrt()
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::NEUTRAL_GRAY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_to_u32() {
        assert_eq!(Color::WHITE.to_u32(), 0xFFFFFFFF);
        assert_eq!(Color::rgba(1.0, 0.0, 0.0, 1.0).to_u32(), 0xFF0000FF);
    }

    #[test]
    fn test_parse_hex_forms() {
        let c = Color::parse("#ff8000").unwrap();
        assert!((c.r - 1.0).abs() < 0.01 && (c.g - 0.502).abs() < 0.01 && c.b == 0.0);

        let short = Color::parse("#f80").unwrap();
        assert!((short.g - 0.533).abs() < 0.01);

        let with_alpha = Color::parse("#00000080").unwrap();
        assert!((with_alpha.a - 0.502).abs() < 0.01);
    }

    #[test]
    fn test_parse_functional_forms() {
        let c = Color::parse("rgb(255, 0, 128)").unwrap();
        assert!((c.b - 0.502).abs() < 0.01);
        let c = Color::parse("RGBA(0,255,0,0.25)").unwrap();
        assert!((c.g - 1.0).abs() < 1e-6);
        assert!((c.a - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_unparseable_falls_back_to_gray() {
        assert_eq!(Color::parse_or_neutral("#zzz"), Color::NEUTRAL_GRAY);
        assert_eq!(Color::parse_or_neutral("rgb(300, 0, 0)"), Color::NEUTRAL_GRAY);
        assert_eq!(Color::parse_or_neutral(""), Color::NEUTRAL_GRAY);
    }

    #[test]
    fn test_lerp_midpoint() {
        let mid = Color::BLACK.lerp(Color::WHITE, 0.5);
        assert!((mid.r - 0.5).abs() < 1e-6);
        let clamped = Color::BLACK.lerp(Color::WHITE, 3.0);
        assert_eq!(clamped, Color::WHITE);
    }

    #[test]
    fn test_brighten_moves_toward_white() {
        let c = Color::rgb(0.2, 0.4, 0.6).brighten(0.5);
        assert!((c.r - 0.6).abs() < 1e-6);
        assert!((c.b - 0.8).abs() < 1e-6);
    }
}
