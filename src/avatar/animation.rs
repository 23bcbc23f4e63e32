//! Avatar animation state machine.
//!
//! Seven states, one active effect at a time. Entering a state tears the
//! previous effect down completely; an effect is expressed as a pure
//! function of elapsed state time so the renderer can sample a [`Pose`]
//! snapshot every tick instead of chaining timers.

use serde::{Deserialize, Serialize};

use super::geometry::Vec2;

/// What the avatar is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimState {
    Idle,
    Walking,
    Talking,
    Thinking,
    Dragging,
    Flying,
    Stunned,
}

// Effect cycle lengths in milliseconds.
const IDLE_CYCLE_MS: f64 = 2_000.0;
const WALK_CYCLE_MS: f64 = 1_000.0;
const TALK_CYCLE_MS: f64 = 600.0;
const TALK_REPEATS: f64 = 3.0;
const THINK_CYCLE_MS: f64 = 3_000.0;
const THINK_REPEATS: f64 = 2.0;
const STUN_CYCLE_MS: f64 = 600.0;
const STUN_REPEATS: f64 = 2.0;
const DRAG_SHAKE_CYCLE_MS: f64 = 200.0;
const FLY_PULSE_CYCLE_MS: f64 = 200.0;

/// Fraction of the flight direction the body tilts toward.
const FLIGHT_TILT_FACTOR: f64 = 0.3;

/// Per-tick visual snapshot consumed by the rendering adapter.
///
/// Rotations are in degrees, scales are multiplicative with 1.0 neutral.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub body_rotation: f64,
    pub head_rotation: f64,
    pub head_scale_y: f64,
    pub body_scale_y: f64,
    /// Limb swing phase in `-1.0..=1.0`; renderers map it to leg/arm angles.
    pub limb_swing: f64,
    /// Whole-avatar scale (drag feedback rides on top of this).
    pub scale: f64,
    pub eyes_closed: bool,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            body_rotation: 0.0,
            head_rotation: 0.0,
            head_scale_y: 1.0,
            body_scale_y: 1.0,
            limb_swing: 0.0,
            scale: 1.0,
            eyes_closed: false,
        }
    }
}

pub struct AnimationMachine {
    state: AnimState,
    elapsed_ms: f64,
    /// Body tilt computed once when Flying is entered.
    flight_tilt: f64,
}

impl Default for AnimationMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimationMachine {
    pub fn new() -> Self {
        Self {
            state: AnimState::Idle,
            elapsed_ms: 0.0,
            flight_tilt: 0.0,
        }
    }

    pub fn state(&self) -> AnimState {
        self.state
    }

    /// Switch states. A no-op when `next` equals the current state, so a
    /// running effect is never restarted mid-cycle.
    pub fn set_state(&mut self, next: AnimState) {
        if next == self.state {
            return;
        }
        self.state = next;
        self.elapsed_ms = 0.0;
    }

    /// Enter Flying with the body tilted toward the release velocity.
    pub fn enter_flying(&mut self, velocity: Vec2) {
        if self.state != AnimState::Flying {
            self.set_state(AnimState::Flying);
        }
        self.flight_tilt = velocity.y.atan2(velocity.x).to_degrees() * FLIGHT_TILT_FACTOR;
    }

    /// Advance the active effect by `dt_ms`.
    ///
    /// Returns the state a finite effect auto-transitions into once it has
    /// played out (Talking and Thinking fall back to Idle). Dragging
    /// freezes the looping Idle/Walking effects.
    pub fn advance(&mut self, dt_ms: f64, dragging: bool) -> Option<AnimState> {
        if dragging && matches!(self.state, AnimState::Idle | AnimState::Walking) {
            return None;
        }

        self.elapsed_ms += dt_ms;

        let finished = match self.state {
            AnimState::Talking => self.elapsed_ms >= TALK_CYCLE_MS * TALK_REPEATS,
            AnimState::Thinking => self.elapsed_ms >= THINK_CYCLE_MS * THINK_REPEATS,
            _ => false,
        };

        if finished && !dragging {
            return Some(AnimState::Idle);
        }
        None
    }

    /// Whether the Stunned oscillation has played both repeats.
    pub fn stun_played_out(&self) -> bool {
        self.state == AnimState::Stunned && self.elapsed_ms >= STUN_CYCLE_MS * STUN_REPEATS
    }

    /// Sample the current visual snapshot.
    pub fn pose(&self) -> Pose {
        let mut pose = Pose::default();
        let t = self.elapsed_ms;

        match self.state {
            AnimState::Idle => {
                // Slow breathing: scale up over the first half of the
                // cycle, back down over the second.
                let phase = triangle(t, IDLE_CYCLE_MS);
                pose.head_scale_y = 1.0 + 0.05 * phase;
                pose.body_scale_y = 1.0 + 0.02 * phase;
            }
            AnimState::Walking => {
                // Four-phase limb swing: 0 -> +1 -> 0 -> -1.
                let cycle = (t % WALK_CYCLE_MS) / WALK_CYCLE_MS;
                pose.limb_swing = (cycle * std::f64::consts::TAU).sin();
            }
            AnimState::Talking => {
                let phase = triangle(t, TALK_CYCLE_MS);
                pose.head_scale_y = 1.0 + 0.1 * phase;
                pose.body_scale_y = 1.0 + 0.05 * phase;
            }
            AnimState::Thinking => {
                // Head tilts one way then the other across the cycle.
                let cycle = (t % THINK_CYCLE_MS) / THINK_CYCLE_MS;
                pose.head_rotation = if cycle < 0.333 {
                    5.0 * (cycle / 0.333)
                } else if cycle < 0.666 {
                    5.0 - 10.0 * ((cycle - 0.333) / 0.333)
                } else {
                    -5.0 + 5.0 * ((cycle - 0.666) / 0.334)
                };
            }
            AnimState::Dragging => {
                pose.scale = 1.1;
                // Micro-shake.
                let half = (t / (DRAG_SHAKE_CYCLE_MS * 0.5)) as i64;
                pose.head_rotation = if half % 2 == 0 { 2.0 } else { -2.0 };
            }
            AnimState::Flying => {
                pose.body_rotation = self.flight_tilt;
                pose.limb_swing = 1.0; // limbs spread
                let half = (t / (FLY_PULSE_CYCLE_MS * 0.5)) as i64;
                pose.head_scale_y = if half % 2 == 0 { 0.95 } else { 1.05 };
            }
            AnimState::Stunned => {
                if self.stun_played_out() {
                    return pose;
                }
                pose.eyes_closed = true;
                let third = (t / (STUN_CYCLE_MS / 3.0)) as i64;
                pose.body_rotation = if third % 2 == 0 { 5.0 } else { -5.0 };
            }
        }
        pose
    }
}

/// 0 -> 1 -> 0 ramp across one cycle of `period_ms`.
fn triangle(t_ms: f64, period_ms: f64) -> f64 {
    let cycle = (t_ms % period_ms) / period_ms;
    if cycle < 0.5 {
        cycle * 2.0
    } else {
        (1.0 - cycle) * 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_state_is_idempotent() {
        let mut machine = AnimationMachine::new();
        machine.set_state(AnimState::Talking);
        machine.advance(500.0, false);
        assert!(machine.elapsed_ms > 0.0);

        // Re-entering the same state must not restart the running effect.
        machine.set_state(AnimState::Talking);
        assert_eq!(machine.elapsed_ms, 500.0);

        machine.set_state(AnimState::Idle);
        assert_eq!(machine.elapsed_ms, 0.0);
    }

    #[test]
    fn talking_auto_transitions_to_idle() {
        let mut machine = AnimationMachine::new();
        machine.set_state(AnimState::Talking);

        assert_eq!(machine.advance(1_700.0, false), None);
        assert_eq!(machine.advance(200.0, false), Some(AnimState::Idle));
    }

    #[test]
    fn talking_completion_suppressed_while_dragging() {
        let mut machine = AnimationMachine::new();
        machine.set_state(AnimState::Talking);
        assert_eq!(machine.advance(2_000.0, true), None);
    }

    #[test]
    fn thinking_runs_two_repeats() {
        let mut machine = AnimationMachine::new();
        machine.set_state(AnimState::Thinking);
        assert_eq!(machine.advance(5_900.0, false), None);
        assert_eq!(machine.advance(200.0, false), Some(AnimState::Idle));
    }

    #[test]
    fn dragging_freezes_idle_effect() {
        let mut machine = AnimationMachine::new();
        machine.advance(1_000.0, true);
        assert_eq!(machine.elapsed_ms, 0.0);

        machine.advance(1_000.0, false);
        assert_eq!(machine.elapsed_ms, 1_000.0);
    }

    #[test]
    fn flying_tilt_follows_release_velocity() {
        let mut machine = AnimationMachine::new();
        machine.enter_flying(Vec2::new(100.0, 100.0));
        // atan2(100, 100) = 45 degrees, tilted at 30%.
        let pose = machine.pose();
        assert!((pose.body_rotation - 13.5).abs() < 1e-9);
    }

    #[test]
    fn stunned_closes_eyes_until_played_out() {
        let mut machine = AnimationMachine::new();
        machine.set_state(AnimState::Stunned);
        machine.advance(300.0, false);
        assert!(machine.pose().eyes_closed);
        assert!(!machine.stun_played_out());

        machine.advance(1_000.0, false);
        assert!(machine.stun_played_out());
        assert!(!machine.pose().eyes_closed);
    }
}
