//! Desktop game-advisor overlay engine.
//!
//! An animated avatar lives on top of a tracked game window: it can be
//! dragged and thrown (with bounce physics inside the window bounds),
//! plays a small state-machine of animations, dodges clicks aimed at the
//! game, and fronts a screen-analysis advice service.
//!
//! The crate is renderer-agnostic: drawing goes through [`render::RenderSink`]
//! and platform window/process access through the traits in [`platform`].
//! All simulation state is owned by [`avatar::overlay::OverlayCoordinator`],
//! driven by explicit events and a fixed 50ms tick.

pub mod avatar;
pub mod platform;
pub mod render;
pub mod services;

pub use avatar::animation::{AnimState, Pose};
pub use avatar::geometry::{Rect, Size, Vec2};
pub use avatar::overlay::{AdviceJob, OverlayCoordinator, PointerEvent};
pub use platform::{CaptureService, NativeHandle, ProbeError, ProcessEntry, TrackedWindow, WindowProbe};
pub use render::{LogSink, RenderSink};
pub use services::advice::{AdviceClient, AdviceError, Game, ScreenAnalysisRequest, ScreenAnalysisResponse};
pub use services::config::OverlayConfig;
pub use services::scanner::WindowScanner;
