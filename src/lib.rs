//! Warmap - geospatial render and interaction engine for a strategy game map

pub mod animation;
pub mod camera;
pub mod core;
pub mod engine;
pub mod interaction;
pub mod lod;
pub mod projection;
pub mod render;
pub mod renderer;
pub mod theme;
pub mod world;
