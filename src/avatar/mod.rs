//! Avatar simulation: geometry, animation, physics, drag, window
//! tracking, speech, and the coordinator that ties them together.

pub mod animation;
pub mod bubble;
pub mod drag;
pub mod geometry;
pub mod overlay;
pub mod physics;
pub mod tracker;
