//! Terminal user interface: rendering and keyboard input.
//!
//! The UI is a pure consumer of the app's session snapshot; no auth logic
//! lives here.

pub mod input;
pub mod render;
pub mod styles;
