//! Pointer drag-to-throw handling.
//!
//! One session at a time: pointer-down opens it, pointer-up closes it and
//! converts the accumulated drag delta into a release velocity.

use super::geometry::Vec2;

/// Drags shorter than this are treated as a non-throw.
const MIN_THROW_DISTANCE: f64 = 15.0;
/// Release speed cap in px/s.
const MAX_THROW_POWER: f64 = 200.0;
/// Drag distance at which the cosmetic feedback saturates.
const FEEDBACK_FULL_DISTANCE: f64 = 100.0;

#[derive(Debug, Clone, Copy)]
struct DragSession {
    pointer_start: Vec2,
    avatar_start: Vec2,
}

/// Avatar position and cosmetic feedback for an in-progress drag.
#[derive(Debug, Clone, Copy)]
pub struct DragUpdate {
    pub position: Vec2,
    /// `0.0..=1.0`, proportional to drag distance. Purely cosmetic.
    pub feedback: f64,
}

/// Outcome of closing a drag session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragRelease {
    /// Below the throw threshold (including a zero-length drag); the
    /// avatar settles where it is.
    Settle,
    /// Hand off to the physics engine with this release velocity.
    Throw { velocity: Vec2 },
}

#[derive(Default)]
pub struct DragController {
    session: Option<DragSession>,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Open a session. Ignored when a drag is already active or the input
    /// is not the primary button. Returns whether a session opened.
    pub fn on_pointer_down(&mut self, pointer: Vec2, primary: bool, avatar_pos: Vec2) -> bool {
        if !primary || self.session.is_some() {
            return false;
        }
        self.session = Some(DragSession {
            pointer_start: pointer,
            avatar_start: avatar_pos,
        });
        log::debug!(
            "drag started: pointer=({:.0}, {:.0}) avatar=({:.0}, {:.0})",
            pointer.x,
            pointer.y,
            avatar_pos.x,
            avatar_pos.y
        );
        true
    }

    pub fn on_pointer_move(&mut self, pointer: Vec2) -> Option<DragUpdate> {
        let session = self.session?;
        let delta = pointer - session.pointer_start;
        Some(DragUpdate {
            position: session.avatar_start + delta,
            feedback: (delta.length() / FEEDBACK_FULL_DISTANCE).min(1.0),
        })
    }

    /// Close the session and compute the release.
    pub fn on_pointer_up(&mut self, pointer: Vec2) -> Option<DragRelease> {
        let session = self.session.take()?;
        let delta = pointer - session.pointer_start;
        let distance = delta.length();

        if distance <= MIN_THROW_DISTANCE {
            log::debug!("drag released below throw threshold ({distance:.1}px)");
            return Some(DragRelease::Settle);
        }

        let power = distance.min(MAX_THROW_POWER);
        // distance > 0 is guaranteed by the threshold check above.
        let velocity = delta * (power / distance);
        log::debug!(
            "throw: distance={:.1} velocity=({:.1}, {:.1})",
            distance,
            velocity.x,
            velocity.y
        );
        Some(DragRelease::Throw { velocity })
    }
}
