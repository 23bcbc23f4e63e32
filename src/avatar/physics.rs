//! Gravity/friction/bounce simulation for thrown avatars.
//!
//! Runs on a fixed tick while the avatar is flying. Collision-effect rate
//! limiting uses accumulated simulation time rather than the wall clock so
//! the engine stays deterministic under test.

use rand::Rng;

use super::geometry::{Rect, Size, Vec2};

/// Gravity acceleration in px/s².
pub const GRAVITY: f64 = 400.0;
/// Velocity retained across a wall bounce.
pub const BOUNCE_DAMPING: f64 = 0.75;
/// Per-tick velocity multiplier while airborne.
pub const AIR_FRICTION: f64 = 0.995;
/// Per-tick velocity multiplier while resting on the floor.
pub const GROUND_FRICTION: f64 = 0.9;
/// Below this speed the avatar is considered stopped.
pub const MIN_VELOCITY: f64 = 1.0;
/// Fixed integration step in seconds.
pub const TICK_SECONDS: f64 = 0.05;

/// Floor bounces slower than this snap the vertical velocity to zero.
const FLOOR_SNAP_SPEED: f64 = 15.0;
/// Residual vertical speed zeroed while resting on the floor.
const REST_SNAP_SPEED: f64 = 5.0;
/// Minimum horizontal speed before a floor hit perturbs it.
const PERTURB_MIN_SPEED: f64 = 10.0;
/// Collision visual effects fire at most once per this interval.
const COLLISION_EFFECT_COOLDOWN_MS: f64 = 200.0;

/// Result of a single integration step.
#[derive(Debug, Clone, Copy)]
pub struct StepOutcome {
    pub position: Vec2,
    /// A boundary was hit this tick.
    pub collided: bool,
    /// The rate-limited collision visual effect should play.
    pub collision_effect: bool,
    /// The avatar came to rest; flying has ended and velocity is zeroed.
    pub settled: bool,
}

pub struct PhysicsEngine {
    velocity: Vec2,
    flying: bool,
    sim_time_ms: f64,
    last_effect_ms: Option<f64>,
}

impl Default for PhysicsEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsEngine {
    pub fn new() -> Self {
        Self {
            velocity: Vec2::ZERO,
            flying: false,
            sim_time_ms: 0.0,
            last_effect_ms: None,
        }
    }

    pub fn is_flying(&self) -> bool {
        self.flying
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Start a flight with the given release velocity.
    pub fn launch(&mut self, velocity: Vec2) {
        self.velocity = velocity;
        self.flying = true;
        self.last_effect_ms = None;
    }

    /// Abort the active run, e.g. when the avatar is grabbed mid-air.
    /// Velocity is zeroed so the `flying => velocity != 0` invariant holds.
    pub fn cancel(&mut self) {
        self.flying = false;
        self.velocity = Vec2::ZERO;
    }

    /// One fixed-dt integration step. Must only be called while flying.
    pub fn step<R: Rng>(
        &mut self,
        position: Vec2,
        bounds: Rect,
        avatar: Size,
        rng: &mut R,
    ) -> StepOutcome {
        self.sim_time_ms += TICK_SECONDS * 1_000.0;

        self.velocity.y += GRAVITY * TICK_SECONDS;

        let mut new_x = position.x + self.velocity.x * TICK_SECONDS;
        let mut new_y = position.y + self.velocity.y * TICK_SECONDS;

        let floor = bounds.bottom - avatar.height;
        let right_limit = bounds.right - avatar.width;
        let mut collided = false;

        // Horizontal walls.
        if new_x <= bounds.left {
            new_x = bounds.left;
            if self.velocity.x < 0.0 {
                self.velocity.x = bounce_wall(self.velocity.x);
                collided = true;
            }
        } else if new_x >= right_limit {
            new_x = right_limit;
            if self.velocity.x > 0.0 {
                self.velocity.x = bounce_wall(self.velocity.x);
                collided = true;
            }
        }

        // Ceiling and floor.
        if new_y <= bounds.top {
            new_y = bounds.top;
            if self.velocity.y < 0.0 {
                self.velocity.y = bounce_wall(self.velocity.y);
                collided = true;
            }
        } else if new_y >= floor {
            new_y = floor;
            if self.velocity.y > 0.0 {
                self.velocity.y = bounce_floor(self.velocity.y);
                collided = true;

                // A hard landing scuffs the horizontal velocity a little.
                if self.velocity.x.abs() > PERTURB_MIN_SPEED {
                    self.velocity.x += rng.gen_range(-1.0..1.0);
                }
            }
        }

        let collision_effect = collided && self.effect_ready();
        if collision_effect {
            self.last_effect_ms = Some(self.sim_time_ms);
        }

        // Friction.
        let on_ground = new_y >= floor - 1e-9;
        if on_ground {
            self.velocity.x *= GROUND_FRICTION;
            self.velocity.y *= GROUND_FRICTION;
            if self.velocity.y.abs() < REST_SNAP_SPEED {
                self.velocity.y = 0.0;
            }
        } else {
            self.velocity.x *= AIR_FRICTION;
            self.velocity.y *= AIR_FRICTION;
        }

        // Stop conditions: at rest on the floor, or hovering with nothing
        // left in the tank (clamped into a corner, for instance).
        let vx = self.velocity.x.abs();
        let vy = self.velocity.y.abs();
        let settled = if on_ground {
            vx < MIN_VELOCITY && vy < MIN_VELOCITY
        } else {
            vx < MIN_VELOCITY && vy < MIN_VELOCITY * 2.0
        };

        if settled {
            self.flying = false;
            self.velocity = Vec2::ZERO;
        }

        StepOutcome {
            position: Vec2::new(new_x, new_y),
            collided,
            collision_effect,
            settled,
        }
    }

    fn effect_ready(&self) -> bool {
        match self.last_effect_ms {
            None => true,
            Some(at) => self.sim_time_ms - at > COLLISION_EFFECT_COOLDOWN_MS,
        }
    }
}

/// Wall/ceiling bounce: reverse and damp.
fn bounce_wall(v: f64) -> f64 {
    -v * BOUNCE_DAMPING
}

/// Floor bounce: extra damping, with tiny rebounds snapped flat.
fn bounce_floor(vy: f64) -> f64 {
    let out = -vy * BOUNCE_DAMPING * 0.5;
    if out.abs() < FLOOR_SNAP_SPEED {
        0.0
    } else {
        out
    }
}
