//! Pointer input: event dispatch and hit-testing.

pub mod hit_test;
pub mod input;

pub use hit_test::{hit_test_flat, hit_test_geo, hit_test_globe};
pub use input::{InputAction, InputDispatcher, InputEvent, PointerButton};
