//! Injected platform abstractions.
//!
//! Window/process discovery, native handles, and screen capture are owned
//! by the caller behind these traits. Lookup failures are ordinary `None`
//! or error values: the simulation continues without the capability.

use serde::{Deserialize, Serialize};

use crate::avatar::geometry::Rect;

/// Opaque native window handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NativeHandle(pub u64);

/// A running process as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEntry {
    pub pid: u32,
    pub name: String,
}

/// A game window the scanner matched against the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedWindow {
    pub game_name: String,
    pub process_name: String,
    pub rect: Rect,
    /// `None` when the handle could not be resolved; z-ordering and
    /// capture are then unavailable but tracking still works.
    pub handle: Option<NativeHandle>,
}

/// Process/window discovery, injected into the scanner.
pub trait WindowProbe: Send + Sync {
    fn running_processes(&self) -> Result<Vec<ProcessEntry>, ProbeError>;

    /// Resolve the main window handle for a process, if any.
    fn resolve_native_handle(&self, pid: u32) -> Option<NativeHandle>;

    /// Current window rectangle for a handle.
    fn window_rect(&self, handle: NativeHandle) -> Option<Rect>;

    /// Raise the window. Best effort; failure is ignored.
    fn bring_to_front(&self, _handle: NativeHandle) {}
}

/// Screen capture, injected into the advice flow. Produces a base64 PNG.
pub trait CaptureService: Send + Sync {
    fn capture_window(
        &self,
        handle: Option<NativeHandle>,
        rect: Rect,
    ) -> Result<String, ProbeError>;
}

/// Platform-boundary failure. Deliberately stringly: the engine only ever
/// logs these and degrades.
#[derive(Debug, Clone)]
pub struct ProbeError {
    message: String,
}

impl ProbeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ProbeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ProbeError {}

impl From<std::io::Error> for ProbeError {
    fn from(err: std::io::Error) -> Self {
        Self::new(err.to_string())
    }
}
