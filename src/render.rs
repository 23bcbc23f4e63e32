//! Rendering adapter boundary.
//!
//! The coordinator pushes position/state/message commands into a
//! [`RenderSink`]; how shapes and widgets are drawn is the sink's problem.
//! Plain composition, no inheritance: the avatar is a data record, the
//! sink is the view.

use std::time::Duration;

use crate::avatar::animation::{AnimState, Pose};
use crate::avatar::bubble::MessageKind;
use crate::avatar::geometry::Vec2;

pub trait RenderSink {
    /// Show or hide the whole overlay (avatar, companion button, bubble).
    fn set_overlay_visible(&mut self, visible: bool);

    fn set_avatar_position(&mut self, pos: Vec2);

    fn set_avatar_state(&mut self, state: AnimState);

    /// Per-tick visual snapshot (limb swing, tilt, drag feedback scale).
    fn set_avatar_pose(&mut self, pose: Pose);

    /// Position of the action button anchored to the avatar.
    fn set_companion_position(&mut self, pos: Vec2);

    /// Collision flash/shake. Rate-limited by the physics engine.
    fn play_collision_effect(&mut self);

    /// `duration: None` means "show until explicitly dismissed"
    /// (strategy messages).
    fn show_message(&mut self, text: &str, kind: MessageKind, duration: Option<Duration>);

    fn hide_message(&mut self);
}

/// Sink that logs every command. Used by the demo binary and as a
/// stand-in wherever no real renderer is attached.
#[derive(Debug, Default)]
pub struct LogSink;

impl RenderSink for LogSink {
    fn set_overlay_visible(&mut self, visible: bool) {
        log::info!("overlay visible: {visible}");
    }

    fn set_avatar_position(&mut self, pos: Vec2) {
        log::trace!("avatar position: ({:.1}, {:.1})", pos.x, pos.y);
    }

    fn set_avatar_state(&mut self, state: AnimState) {
        log::debug!("avatar state: {state:?}");
    }

    fn set_avatar_pose(&mut self, _pose: Pose) {}

    fn set_companion_position(&mut self, pos: Vec2) {
        log::trace!("companion position: ({:.1}, {:.1})", pos.x, pos.y);
    }

    fn play_collision_effect(&mut self) {
        log::debug!("collision effect");
    }

    fn show_message(&mut self, text: &str, kind: MessageKind, duration: Option<Duration>) {
        log::info!("message [{kind:?}] ({duration:?}): {text}");
    }

    fn hide_message(&mut self) {
        log::debug!("message hidden");
    }
}
