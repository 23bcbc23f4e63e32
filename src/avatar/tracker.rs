//! Avatar anchor arbitration across tracked-window updates.
//!
//! Owns the last landed position and decides, for every window-rectangle
//! update, whether the avatar gets re-anchored, merely re-bounded, or left
//! alone. Updates arriving mid-drag or mid-flight never reposition.

use std::time::{Duration, Instant};

use crate::avatar::geometry::{Rect, Size, Vec2};
use crate::platform::TrackedWindow;

/// Post-landing interval during which window updates must preserve the
/// landed position instead of recomputing a default anchor.
pub const POSITION_UPDATE_COOLDOWN: Duration = Duration::from_millis(5_000);

/// Inset from the left/top/right edges when clamping into a window.
const EDGE_INSET: f64 = 10.0;
/// Inset above the bottom edge; the avatar "stands" this high.
const FLOOR_INSET: f64 = 5.0;

/// Resting coordinates captured after physics settled or a walk finished.
#[derive(Debug, Clone, Copy)]
pub struct LandedPosition {
    pub pos: Vec2,
    pub completed_at: Instant,
}

/// Identity of the previous update; re-anchoring outside the cooldown
/// happens only when this actually changed.
#[derive(Debug, Clone, PartialEq)]
struct WindowKey {
    game_name: String,
    rect: Rect,
}

/// What the coordinator should do with the avatar after an update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    /// Boundary refreshed; avatar untouched.
    BoundsOnly,
    /// Move the avatar to this point.
    MoveTo(Vec2),
}

/// Movement modes that block repositioning.
#[derive(Debug, Clone, Copy, Default)]
pub struct Busy {
    pub dragging: bool,
    pub flying: bool,
}

#[derive(Default)]
pub struct PositionTracker {
    bounds: Option<Rect>,
    landed: Option<LandedPosition>,
    last_window: Option<WindowKey>,
}

impl PositionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bounds(&self) -> Option<Rect> {
        self.bounds
    }

    pub fn landed(&self) -> Option<LandedPosition> {
        self.landed
    }

    /// Record the avatar's resting position. A no-op while dragging, so a
    /// drag that resumed concurrently can never corrupt the anchor.
    pub fn capture_landed(&mut self, pos: Vec2, dragging: bool, now: Instant) {
        if dragging {
            log::debug!("drag active, landed position not captured");
            return;
        }
        log::debug!("landed position captured: ({:.0}, {:.0})", pos.x, pos.y);
        self.landed = Some(LandedPosition {
            pos,
            completed_at: now,
        });
    }

    /// Forget the anchor and boundary, e.g. when the tracked window went
    /// away or the overlay deactivated.
    pub fn reset(&mut self) {
        self.bounds = None;
        self.landed = None;
        self.last_window = None;
    }

    /// Arbitrate a window-rectangle update.
    pub fn on_window_update(
        &mut self,
        window: &TrackedWindow,
        busy: Busy,
        avatar: Size,
        now: Instant,
    ) -> Placement {
        let rect = window.rect;
        self.bounds = Some(rect);

        let key = WindowKey {
            game_name: window.game_name.clone(),
            rect,
        };
        let window_changed = self.last_window.as_ref() != Some(&key);
        self.last_window = Some(key);

        // Mid-drag or mid-flight: boundary only, never reposition.
        if busy.dragging || busy.flying {
            log::debug!("avatar busy, boundary-only update");
            return Placement::BoundsOnly;
        }

        if let Some(landed) = self.landed {
            let in_cooldown = now.duration_since(landed.completed_at) < POSITION_UPDATE_COOLDOWN;

            if in_cooldown {
                // Hold the landing spot, clamped into the new rect.
                let clamped = clamp_landing(landed.pos, avatar, rect);
                self.landed = Some(LandedPosition {
                    pos: clamped,
                    completed_at: landed.completed_at,
                });
                return Placement::MoveTo(clamped);
            }

            if window_changed {
                // Cooldown over: re-anchor from the landing spot only when
                // the window genuinely moved or switched.
                let clamped = clamp_landing(landed.pos, avatar, rect);
                self.landed = Some(LandedPosition {
                    pos: clamped,
                    completed_at: landed.completed_at,
                });
                return Placement::MoveTo(clamped);
            }

            return Placement::BoundsOnly;
        }

        // First activation: bottom-center of the window.
        Placement::MoveTo(bottom_center(avatar, rect))
    }
}

/// Pull a point inside `rect`, honoring the standing insets. Positions
/// already inside are left untouched.
fn clamp_landing(mut pos: Vec2, avatar: Size, rect: Rect) -> Vec2 {
    if pos.x < rect.left {
        pos.x = rect.left + EDGE_INSET;
    } else if pos.x + avatar.width > rect.right {
        pos.x = rect.right - avatar.width - EDGE_INSET;
    }

    if pos.y < rect.top {
        pos.y = rect.top + EDGE_INSET;
    } else if pos.y + avatar.height > rect.bottom {
        pos.y = rect.bottom - avatar.height - FLOOR_INSET;
    }
    pos
}

/// Default anchor: bottom-center, standing `FLOOR_INSET` above the floor.
fn bottom_center(avatar: Size, rect: Rect) -> Vec2 {
    let mut x = rect.center_x() - avatar.width * 0.5;
    if x < rect.left {
        x = rect.left + EDGE_INSET;
    } else if x + avatar.width > rect.right {
        x = rect.right - avatar.width - EDGE_INSET;
    }
    Vec2::new(x, rect.bottom - avatar.height - FLOOR_INSET)
}
