//! GPU rendering for the showcase window.

mod shared;

pub mod native;

pub use native::Renderer;
