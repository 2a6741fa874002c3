//! Time-boxed visual state: ownership transitions, selection emphasis, hover fade.

pub mod hover;
pub mod transitions;

pub use hover::HoverState;
pub use transitions::{RingSample, SelectionFocus, Transition, TransitionRegistry, TransitionSample};
