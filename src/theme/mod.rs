//! Theme selection and color palettes.

pub mod color;
pub mod palette;

pub use color::Color;
pub use palette::{Palette, ThemeKind};
