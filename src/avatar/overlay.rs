//! Overlay coordinator.
//!
//! Single-writer core of the overlay: every mutation of avatar state
//! (position, velocity, animation state, drag session, landed position)
//! happens through this struct on one logical task. Background collaborators
//! (window scanner, advice client) marshal their results in as discrete
//! events; periodic work runs off one `tick` call.
//!
//! Movement modes are prioritized Dragging > Flying > scripted Walking >
//! idle scheduler; starting a mode cancels the timers of the one below it.

use std::time::{Duration, Instant};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::animation::{AnimState, AnimationMachine};
use super::bubble::{MessageKind, SpeechState};
use super::drag::{DragController, DragRelease};
use super::geometry::{Rect, Size, Vec2};
use super::physics::PhysicsEngine;
use super::tracker::{Busy, Placement, PositionTracker};
use crate::platform::TrackedWindow;
use crate::render::RenderSink;
use crate::services::advice::{quick_tip, strategy_prompt, AdviceError, ScreenAnalysisResponse};

pub const AVATAR_WIDTH: f64 = 60.0;
pub const AVATAR_HEIGHT: f64 = 80.0;

/// Gap between the avatar and its action button.
const COMPANION_GAP: f64 = 5.0;
const COMPANION_SIZE: f64 = 30.0;

/// Cadence of the idle-activity scheduler.
const IDLE_ACTIVITY_INTERVAL: Duration = Duration::from_secs(5);
/// How long a game-area click stays relevant for avoidance.
const CLICK_MEMORY_DURATION: Duration = Duration::from_secs(3);
/// Clicks closer than this to the avatar center trigger avoidance.
const AVOIDANCE_RADIUS: f64 = 150.0;
/// How far past its center the avatar retreats from a click.
const AVOIDANCE_STEP: f64 = 120.0;
const AVOIDANCE_EDGE_INSET: f64 = 20.0;
/// Walks shorter than this are stretched so the move stays perceptible.
const MIN_AVOIDANCE_WALK: f64 = 30.0;
const FALLBACK_WALK: f64 = 50.0;

/// Scripted walks cover their distance in this time.
const WALK_DURATION: Duration = Duration::from_secs(2);
/// Walk-completion position sync fires slightly after the walk ends.
const WALK_SYNC_DELAY: Duration = Duration::from_millis(2_100);
/// Stunned -> Idle recovery delay.
const STUN_RECOVERY: Duration = Duration::from_secs(1);
/// Delay before the post-analysis follow-up message.
const FOLLOWUP_DELAY: Duration = Duration::from_secs(5);
/// Second staged progress message during an analysis.
const ANALYSIS_PROGRESS_DELAY: Duration = Duration::from_millis(800);

/// Standing height above the window floor (matches the tracker's anchor).
const FLOOR_INSET: f64 = 5.0;

const IDLE_TIPS: &[&str] = &[
    "You're playing hard today! Keep it up!",
    "A short break now and then works wonders.",
    "Nice focus! You're really in the zone.",
    "Enjoying the game? I'm here if you need me.",
    "Stuck on something? Ask me for an analysis!",
];

const FOLLOWUP_MESSAGES: &[&str] = &[
    "Looks like things are going well!",
    "Call on me whenever you need help!",
    "Have fun out there!",
    "Hope that analysis was useful!",
];

/// Pointer input in screen coordinates.
#[derive(Debug, Clone, Copy)]
pub enum PointerEvent {
    Down { pos: Vec2, primary: bool },
    Move { pos: Vec2 },
    Up { pos: Vec2 },
}

/// Everything the network collaborator needs to run one screen analysis.
#[derive(Debug, Clone)]
pub struct AdviceJob {
    pub game: TrackedWindow,
    pub prompt: String,
}

#[derive(Debug, Clone, Copy)]
struct WalkPlan {
    from: Vec2,
    to: Vec2,
    started_at: Instant,
}

#[derive(Debug, Clone, Copy)]
struct ClickMemory {
    pos: Vec2,
    at: Instant,
}

pub struct OverlayCoordinator<R: RenderSink> {
    sink: R,
    anim: AnimationMachine,
    physics: PhysicsEngine,
    drag: DragController,
    tracker: PositionTracker,
    speech: SpeechState,

    position: Vec2,
    avatar: Size,
    active: bool,
    current_game: Option<TrackedWindow>,

    walk: Option<WalkPlan>,
    walk_sync_due: Option<Instant>,
    stun_recovery_due: Option<Instant>,
    followup_due: Option<Instant>,
    analysis_progress_due: Option<Instant>,
    next_idle_check: Option<Instant>,
    last_tick: Option<Instant>,

    click_memory: Option<ClickMemory>,
    advice_pending: bool,
    pending_game_tip: Option<&'static str>,
    tip_index: usize,
    drag_feedback: f64,
    rng: SmallRng,
}

impl<R: RenderSink> OverlayCoordinator<R> {
    pub fn new(sink: R) -> Self {
        Self::with_rng(sink, SmallRng::from_entropy())
    }

    /// Deterministic construction for tests.
    pub fn with_rng(sink: R, rng: SmallRng) -> Self {
        Self {
            sink,
            anim: AnimationMachine::new(),
            physics: PhysicsEngine::new(),
            drag: DragController::new(),
            tracker: PositionTracker::new(),
            speech: SpeechState::new(),
            position: Vec2::ZERO,
            avatar: Size::new(AVATAR_WIDTH, AVATAR_HEIGHT),
            active: false,
            current_game: None,
            walk: None,
            walk_sync_due: None,
            stun_recovery_due: None,
            followup_due: None,
            analysis_progress_due: None,
            next_idle_check: None,
            last_tick: None,
            click_memory: None,
            advice_pending: false,
            pending_game_tip: None,
            tip_index: 0,
            drag_feedback: 0.0,
            rng,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn state(&self) -> AnimState {
        self.anim.state()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_active()
    }

    pub fn is_flying(&self) -> bool {
        self.physics.is_flying()
    }

    pub fn landed_position(&self) -> Option<Vec2> {
        self.tracker.landed().map(|l| l.pos)
    }

    fn busy(&self) -> Busy {
        Busy {
            dragging: self.drag.is_active(),
            flying: self.physics.is_flying(),
        }
    }

    fn avatar_rect(&self) -> Rect {
        Rect::new(
            self.position.x,
            self.position.y,
            self.position.x + self.avatar.width,
            self.position.y + self.avatar.height,
        )
    }

    fn companion_anchor(&self) -> Vec2 {
        Vec2::new(
            self.position.x + self.avatar.width + COMPANION_GAP,
            self.position.y - COMPANION_GAP,
        )
    }

    fn companion_rect(&self) -> Rect {
        let anchor = self.companion_anchor();
        Rect::new(
            anchor.x,
            anchor.y,
            anchor.x + COMPANION_SIZE,
            anchor.y + COMPANION_SIZE,
        )
    }

    fn set_state(&mut self, state: AnimState) {
        self.anim.set_state(state);
        self.sink.set_avatar_state(self.anim.state());
    }

    fn move_avatar(&mut self, pos: Vec2) {
        self.position = pos;
        self.sink.set_avatar_position(pos);
        self.sink.set_companion_position(self.companion_anchor());
    }

    /// Display a message, subject to strategy/minimized protection.
    /// Returns whether it was actually shown.
    fn say(&mut self, text: &str, kind: MessageKind, now: Instant) -> bool {
        if !self.active || !self.speech.allows(kind) {
            return false;
        }
        if !self.physics.is_flying() && !self.drag.is_active() {
            self.set_state(AnimState::Talking);
        }
        let duration = self.speech.show(text, kind, now);
        self.sink.show_message(text, kind, duration);
        true
    }

    // ---- window tracking ---------------------------------------------

    /// Feed a window-tracker result. `None` means "no tracked window".
    pub fn handle_window_update(&mut self, update: Option<TrackedWindow>, now: Instant) {
        match update {
            None => {
                if self.active {
                    self.deactivate();
                }
            }
            Some(window) => {
                if window.rect.sanitize().is_none() {
                    log::warn!("ignoring degenerate window rect: {:?}", window.rect);
                    return;
                }
                if self.active {
                    self.apply_window_update(window, now);
                } else {
                    self.activate(window, now);
                }
            }
        }
    }

    fn activate(&mut self, window: TrackedWindow, now: Instant) {
        log::info!("tracking {} ({})", window.game_name, window.process_name);
        self.active = true;
        let placement = self
            .tracker
            .on_window_update(&window, self.busy(), self.avatar, now);
        self.sink.set_overlay_visible(true);
        if let Placement::MoveTo(pos) = placement {
            self.move_avatar(pos);
        }

        let welcome = format!(
            "You're playing {}! Ask me whenever you need a hand.",
            window.game_name
        );
        // First idle tip opens with something specific to this game.
        self.pending_game_tip = Some(quick_tip(&window.game_name));
        self.current_game = Some(window);
        self.say(&welcome, MessageKind::Normal, now);
        self.next_idle_check = Some(now + IDLE_ACTIVITY_INTERVAL);
    }

    fn apply_window_update(&mut self, window: TrackedWindow, now: Instant) {
        let placement = self
            .tracker
            .on_window_update(&window, self.busy(), self.avatar, now);
        self.current_game = Some(window);
        if let Placement::MoveTo(pos) = placement {
            self.move_avatar(pos);
        }
    }

    fn deactivate(&mut self) {
        log::info!("tracked window gone, hiding overlay");
        self.active = false;
        self.current_game = None;
        self.tracker.reset();
        self.physics.cancel();
        self.drag = DragController::new();
        self.speech.dismiss();
        self.walk = None;
        self.walk_sync_due = None;
        self.stun_recovery_due = None;
        self.followup_due = None;
        self.analysis_progress_due = None;
        self.next_idle_check = None;
        self.click_memory = None;
        self.pending_game_tip = None;
        self.drag_feedback = 0.0;
        self.sink.hide_message();
        self.sink.set_overlay_visible(false);
    }

    // ---- pointer input -----------------------------------------------

    pub fn handle_pointer(&mut self, event: PointerEvent, now: Instant) {
        if !self.active {
            return;
        }
        match event {
            PointerEvent::Down { pos, primary } => {
                if self.avatar_rect().contains(pos) {
                    if self.drag.on_pointer_down(pos, primary, self.position) {
                        self.begin_drag();
                    }
                } else if primary && !self.companion_rect().contains(pos) {
                    // Game-area click: remember it and scurry away if the
                    // avatar is in the way.
                    self.click_memory = Some(ClickMemory { pos, at: now });
                    self.try_avoidance(now);
                }
            }
            PointerEvent::Move { pos } => {
                if let Some(update) = self.drag.on_pointer_move(pos) {
                    self.drag_feedback = update.feedback;
                    self.move_avatar(update.position);
                }
            }
            PointerEvent::Up { pos } => match self.drag.on_pointer_up(pos) {
                None => {}
                Some(DragRelease::Settle) => {
                    self.drag_feedback = 0.0;
                    self.set_state(AnimState::Idle);
                }
                Some(DragRelease::Throw { velocity }) => {
                    self.drag_feedback = 0.0;
                    self.physics.launch(velocity);
                    self.anim.enter_flying(velocity);
                    self.sink.set_avatar_state(AnimState::Flying);
                }
            },
        }
    }

    /// Drag start cancels whatever movement mode held the avatar, plus any
    /// timers belonging to it.
    fn begin_drag(&mut self) {
        self.physics.cancel();
        self.walk = None;
        self.walk_sync_due = None;
        self.stun_recovery_due = None;
        self.set_state(AnimState::Dragging);
    }

    // ---- click avoidance and scripted walks --------------------------

    fn try_avoidance(&mut self, now: Instant) {
        if self.physics.is_flying()
            || self.drag.is_active()
            || self.speech.is_active()
            || self.advice_pending
        {
            return;
        }
        let Some(bounds) = self.tracker.bounds() else {
            return;
        };
        let Some(click) = self.click_memory else {
            return;
        };
        if now.duration_since(click.at) >= CLICK_MEMORY_DURATION {
            return;
        }

        let center = self.position + Vec2::new(self.avatar.width * 0.5, self.avatar.height * 0.5);
        let away = center - click.pos;
        if away.length() >= AVOIDANCE_RADIUS {
            return;
        }
        // A click dead-center degenerates to "run right".
        let dir = away.normalized().unwrap_or(Vec2::new(1.0, 0.0));

        let min_x = bounds.left + AVOIDANCE_EDGE_INSET;
        let max_x = bounds.right - self.avatar.width - AVOIDANCE_EDGE_INSET;
        if max_x <= min_x {
            return; // window too small to retreat in
        }

        let target_center_x = center.x + dir.x * AVOIDANCE_STEP;
        let target_x = (target_center_x - self.avatar.width * 0.5).clamp(min_x, max_x);

        let mut delta = target_x - self.position.x;
        if delta.abs() < MIN_AVOIDANCE_WALK {
            delta = if delta >= 0.0 {
                FALLBACK_WALK
            } else {
                -FALLBACK_WALK
            };
            delta = delta.clamp(min_x - self.position.x, max_x - self.position.x);
        }

        let floor_y = bounds.bottom - self.avatar.height - FLOOR_INSET;
        log::debug!("avoiding click at ({:.0}, {:.0}), walking {delta:.0}px", click.pos.x, click.pos.y);
        self.start_walk(Vec2::new(self.position.x + delta, floor_y), now);
    }

    fn start_walk(&mut self, target: Vec2, now: Instant) {
        if self.drag.is_active() || self.physics.is_flying() {
            return;
        }
        self.set_state(AnimState::Walking);
        self.walk = Some(WalkPlan {
            from: self.position,
            to: target,
            started_at: now,
        });
        self.walk_sync_due = Some(now + WALK_SYNC_DELAY);
    }

    // ---- advice flow -------------------------------------------------

    /// Companion-button press: restores a minimized bubble, otherwise
    /// starts a screen analysis.
    pub fn handle_companion_click(&mut self, now: Instant) -> Option<AdviceJob> {
        if self.speech.is_minimized() {
            self.speech.restore();
            return None;
        }
        self.begin_screen_analysis(now)
    }

    /// Start a screen analysis. Returns the job the network collaborator
    /// should execute, or `None` when it cannot start (no game, already
    /// pending). Duplicate requests are rejected with a visible warning,
    /// never queued.
    pub fn begin_screen_analysis(&mut self, now: Instant) -> Option<AdviceJob> {
        if !self.active {
            return None;
        }
        let Some(game) = self.current_game.clone() else {
            self.say("No game detected right now.", MessageKind::Warning, now);
            return None;
        };
        if self.advice_pending {
            self.say(
                "Screen analysis is already in progress. Hang tight!",
                MessageKind::Warning,
                now,
            );
            return None;
        }

        self.advice_pending = true;
        self.say("Capturing the screen...", MessageKind::Thinking, now);
        self.set_state(AnimState::Thinking);
        self.analysis_progress_due = Some(now + ANALYSIS_PROGRESS_DELAY);

        Some(AdviceJob {
            prompt: strategy_prompt(&game.game_name),
            game,
        })
    }

    /// Marshal a finished analysis back onto the coordinator.
    pub fn handle_advice_result(
        &mut self,
        result: Result<ScreenAnalysisResponse, AdviceError>,
        now: Instant,
    ) {
        self.advice_pending = false;
        self.analysis_progress_due = None;

        match result {
            Ok(response) if response.success => {
                self.set_state(AnimState::Talking);
                let text = format!("Analysis complete!\n\n{}", response.analysis);
                self.say(&text, MessageKind::Strategy, now);
            }
            Ok(response) => {
                self.set_state(AnimState::Idle);
                let reason = response
                    .error_message
                    .unwrap_or_else(|| "no response received".to_string());
                self.say(
                    &format!("Screen analysis failed:\n{reason}"),
                    MessageKind::Warning,
                    now,
                );
            }
            Err(err) => {
                log::warn!("screen analysis failed: {err}");
                self.set_state(AnimState::Idle);
                self.say(
                    &format!("Something went wrong during analysis:\n{err}"),
                    MessageKind::Warning,
                    now,
                );
            }
        }
        self.followup_due = Some(now + FOLLOWUP_DELAY);
    }

    // ---- bubble UI events --------------------------------------------

    pub fn handle_bubble_dismissed(&mut self, now: Instant) {
        self.speech.dismiss();
        self.sink.hide_message();
        if !self.physics.is_flying() && !self.drag.is_active() {
            self.set_state(AnimState::Idle);
        }
        self.next_idle_check = Some(now + IDLE_ACTIVITY_INTERVAL);
    }

    pub fn handle_bubble_minimized(&mut self) {
        self.speech.minimize();
    }

    // ---- tick --------------------------------------------------------

    /// Advance the world. Called at the physics cadence (50ms) by the
    /// runtime loop; all timers and schedulers hang off this.
    pub fn tick(&mut self, now: Instant) {
        if !self.active {
            self.last_tick = Some(now);
            return;
        }

        let dt_ms = self
            .last_tick
            .map(|t| now.saturating_duration_since(t).as_secs_f64() * 1_000.0)
            .unwrap_or(0.0);
        self.last_tick = Some(now);

        self.tick_physics(now);
        self.tick_walk(now);

        if self.speech.tick(now) {
            self.sink.hide_message();
            if !self.physics.is_flying() && !self.drag.is_active() {
                self.set_state(AnimState::Idle);
            }
        }

        if let Some(at) = self.next_idle_check {
            if now >= at {
                self.next_idle_check = Some(now + IDLE_ACTIVITY_INTERVAL);
                self.idle_activity(now);
            }
        }

        self.tick_timers(now);

        if let Some(next) = self.anim.advance(dt_ms, self.drag.is_active()) {
            self.set_state(next);
        }
        let mut pose = self.anim.pose();
        pose.scale += self.drag_feedback * 0.2;
        self.sink.set_avatar_pose(pose);
    }

    fn tick_physics(&mut self, now: Instant) {
        if !self.physics.is_flying() || self.drag.is_active() {
            return;
        }
        let Some(bounds) = self.tracker.bounds() else {
            return;
        };

        let out = self
            .physics
            .step(self.position, bounds, self.avatar, &mut self.rng);
        self.move_avatar(out.position);
        if out.collision_effect {
            self.sink.play_collision_effect();
        }
        if out.settled {
            self.on_physics_settled(now);
        }
    }

    fn on_physics_settled(&mut self, now: Instant) {
        // A drag may have resumed within the same tick; everything below
        // is conditional on that.
        if self.drag.is_active() {
            return;
        }
        self.tracker.capture_landed(self.position, false, now);
        self.set_state(AnimState::Stunned);
        self.stun_recovery_due = Some(now + STUN_RECOVERY);
    }

    fn tick_walk(&mut self, now: Instant) {
        let Some(walk) = self.walk else {
            return;
        };
        let t = now.duration_since(walk.started_at).as_secs_f64() / WALK_DURATION.as_secs_f64();
        if t >= 1.0 {
            self.walk = None;
            self.move_avatar(walk.to);
            if !self.drag.is_active() {
                self.set_state(AnimState::Idle);
            }
        } else {
            self.move_avatar(lerp(walk.from, walk.to, t));
        }
    }

    fn tick_timers(&mut self, now: Instant) {
        if take_due(&mut self.walk_sync_due, now) && !self.drag.is_active() {
            // Walk finished: the avatar's real position becomes the anchor.
            self.tracker.capture_landed(self.position, false, now);
        }

        if take_due(&mut self.stun_recovery_due, now)
            && !self.drag.is_active()
            && self.anim.state() == AnimState::Stunned
        {
            self.set_state(AnimState::Idle);
        }

        if take_due(&mut self.analysis_progress_due, now) && self.advice_pending {
            self.say(
                "Talking to the server...\nthis may take a moment!",
                MessageKind::Thinking,
                now,
            );
            self.set_state(AnimState::Thinking);
        }

        // Replaces a lingering timed bubble; strategy messages are
        // protected inside `say`.
        if take_due(&mut self.followup_due, now) && !self.advice_pending {
            let message = FOLLOWUP_MESSAGES[self.rng.gen_range(0..FOLLOWUP_MESSAGES.len())];
            self.say(message, MessageKind::Normal, now);
        }
    }

    fn idle_activity(&mut self, now: Instant) {
        // Only a genuinely idle avatar starts spontaneous activity.
        if self.anim.state() != AnimState::Idle
            || self.speech.is_active()
            || self.advice_pending
            || self.walk.is_some()
        {
            return;
        }

        if let Some(click) = self.click_memory {
            if now.duration_since(click.at) < CLICK_MEMORY_DURATION {
                self.try_avoidance(now);
                return;
            }
        }

        match self.rng.gen_range(0..3u8) {
            0 => self.set_state(AnimState::Thinking),
            1 => {
                let tip = match self.pending_game_tip.take() {
                    Some(tip) => tip,
                    None => {
                        let tip = IDLE_TIPS[self.tip_index % IDLE_TIPS.len()];
                        self.tip_index += 1;
                        tip
                    }
                };
                self.say(tip, MessageKind::Advice, now);
            }
            _ => self.set_state(AnimState::Idle),
        }
    }

    #[cfg(test)]
    fn place_avatar(&mut self, pos: Vec2) {
        self.move_avatar(pos);
    }
}

fn lerp(from: Vec2, to: Vec2, t: f64) -> Vec2 {
    from + (to - from) * t
}

fn take_due(slot: &mut Option<Instant>, now: Instant) -> bool {
    match slot {
        Some(at) if now >= *at => {
            *slot = None;
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::avatar::animation::Pose;
    use crate::avatar::physics::TICK_SECONDS;

    #[derive(Default)]
    struct RecordingSink {
        states: Vec<AnimState>,
        messages: Vec<(String, MessageKind)>,
        visible: Vec<bool>,
        collisions: usize,
        hides: usize,
    }

    impl RenderSink for RecordingSink {
        fn set_overlay_visible(&mut self, visible: bool) {
            self.visible.push(visible);
        }
        fn set_avatar_position(&mut self, _pos: Vec2) {}
        fn set_avatar_state(&mut self, state: AnimState) {
            self.states.push(state);
        }
        fn set_avatar_pose(&mut self, _pose: Pose) {}
        fn set_companion_position(&mut self, _pos: Vec2) {}
        fn play_collision_effect(&mut self) {
            self.collisions += 1;
        }
        fn show_message(&mut self, text: &str, kind: MessageKind, _duration: Option<Duration>) {
            self.messages.push((text.to_string(), kind));
        }
        fn hide_message(&mut self) {
            self.hides += 1;
        }
    }

    fn window() -> TrackedWindow {
        TrackedWindow {
            game_name: "Minecraft".to_string(),
            process_name: "javaw.exe".to_string(),
            rect: Rect::new(0.0, 0.0, 800.0, 600.0),
            handle: None,
        }
    }

    fn coordinator() -> OverlayCoordinator<RecordingSink> {
        OverlayCoordinator::with_rng(RecordingSink::default(), SmallRng::seed_from_u64(42))
    }

    fn activated(now: Instant) -> OverlayCoordinator<RecordingSink> {
        let mut c = coordinator();
        c.handle_window_update(Some(window()), now);
        c
    }

    /// Run ticks at the physics cadence until the flight settles.
    fn settle(c: &mut OverlayCoordinator<RecordingSink>, mut now: Instant) -> Instant {
        let dt = Duration::from_secs_f64(TICK_SECONDS);
        for _ in 0..4_000 {
            now += dt;
            c.tick(now);
            if !c.is_flying() {
                return now;
            }
        }
        panic!("flight never settled");
    }

    #[test]
    fn activation_places_avatar_and_greets() {
        let now = Instant::now();
        let c = activated(now);

        assert!(c.is_active());
        assert_eq!(c.position(), Vec2::new(370.0, 515.0));
        assert_eq!(c.sink.visible, vec![true]);
        assert_eq!(c.sink.messages.len(), 1);
        assert!(c.sink.messages[0].0.contains("Minecraft"));
        assert_eq!(c.state(), AnimState::Talking);
    }

    #[test]
    fn missing_window_hides_everything() {
        let now = Instant::now();
        let mut c = activated(now);

        c.handle_window_update(None, now);
        assert!(!c.is_active());
        assert_eq!(c.sink.visible, vec![true, false]);
        assert!(c.sink.hides > 0);
        assert!(c.landed_position().is_none());
    }

    #[test]
    fn throw_flies_settles_and_captures_landing_once() {
        let now = Instant::now();
        let mut c = activated(now);
        c.handle_bubble_dismissed(now);
        c.place_avatar(Vec2::new(100.0, 100.0));

        // Grab the avatar and fling it by (150, -80): distance 170 < cap.
        let grab = Vec2::new(110.0, 110.0);
        c.handle_pointer(
            PointerEvent::Down {
                pos: grab,
                primary: true,
            },
            now,
        );
        assert_eq!(c.state(), AnimState::Dragging);

        c.handle_pointer(
            PointerEvent::Up {
                pos: grab + Vec2::new(150.0, -80.0),
            },
            now,
        );
        assert!(c.is_flying());
        assert_eq!(c.state(), AnimState::Flying);

        let settled_at = settle(&mut c, now);
        assert!(!c.is_flying());
        assert_eq!(c.state(), AnimState::Stunned);

        // Landed on the floor of the boundary, captured exactly once.
        let landed = c.landed_position().expect("landing captured");
        assert!((landed.y - (600.0 - AVATAR_HEIGHT)).abs() < 1e-6);

        // The flight hit the floor at least once on the way down.
        assert!(c.sink.collisions >= 1);
        assert!(c.sink.states.contains(&AnimState::Flying));
        assert!(c.sink.states.contains(&AnimState::Stunned));

        // Stun recovery brings the avatar back to Idle.
        c.tick(settled_at + Duration::from_millis(1_050));
        assert_eq!(c.state(), AnimState::Idle);
        assert_eq!(c.landed_position().unwrap(), landed);
    }

    #[test]
    fn grabbing_mid_flight_cancels_physics() {
        let now = Instant::now();
        let mut c = activated(now);
        c.place_avatar(Vec2::new(100.0, 100.0));

        let grab = Vec2::new(110.0, 110.0);
        c.handle_pointer(
            PointerEvent::Down {
                pos: grab,
                primary: true,
            },
            now,
        );
        c.handle_pointer(
            PointerEvent::Up {
                pos: grab + Vec2::new(200.0, 0.0),
            },
            now,
        );
        assert!(c.is_flying());

        // One physics tick, then snatch the avatar out of the air.
        let later = now + Duration::from_millis(50);
        c.tick(later);
        let pos = c.position();
        c.handle_pointer(
            PointerEvent::Down {
                pos: pos + Vec2::new(10.0, 10.0),
                primary: true,
            },
            later,
        );

        assert!(!c.is_flying());
        assert!(c.is_dragging());
        assert_eq!(c.state(), AnimState::Dragging);

        // Physics ticks do nothing while dragging.
        c.tick(later + Duration::from_millis(50));
        assert_eq!(c.position(), pos);
    }

    #[test]
    fn short_release_settles_to_idle() {
        let now = Instant::now();
        let mut c = activated(now);
        c.place_avatar(Vec2::new(100.0, 100.0));

        let grab = Vec2::new(120.0, 130.0);
        c.handle_pointer(
            PointerEvent::Down {
                pos: grab,
                primary: true,
            },
            now,
        );
        c.handle_pointer(
            PointerEvent::Up {
                pos: grab + Vec2::new(8.0, 8.0),
            },
            now,
        );

        assert!(!c.is_flying());
        assert_eq!(c.state(), AnimState::Idle);
    }

    #[test]
    fn window_update_mid_flight_is_bounds_only() {
        let now = Instant::now();
        let mut c = activated(now);
        c.place_avatar(Vec2::new(100.0, 100.0));

        let grab = Vec2::new(110.0, 110.0);
        c.handle_pointer(
            PointerEvent::Down {
                pos: grab,
                primary: true,
            },
            now,
        );
        c.handle_pointer(
            PointerEvent::Up {
                pos: grab + Vec2::new(100.0, -100.0),
            },
            now,
        );
        assert!(c.is_flying());

        let pos = c.position();
        let mut moved = window();
        moved.rect = Rect::new(50.0, 50.0, 900.0, 700.0);
        c.handle_window_update(Some(moved), now);

        // Never repositions mid-flight.
        assert_eq!(c.position(), pos);
        assert!(c.is_flying());
    }

    #[test]
    fn click_near_avatar_triggers_scripted_walk() {
        let now = Instant::now();
        let mut c = activated(now);
        c.handle_bubble_dismissed(now);
        // Avatar center at (420, 310).
        c.place_avatar(Vec2::new(390.0, 270.0));

        // Click just outside the avatar, well within the 150px radius.
        let start_x = c.position().x;
        c.handle_pointer(
            PointerEvent::Down {
                pos: Vec2::new(470.0, 300.0),
                primary: true,
            },
            now,
        );

        assert_eq!(c.state(), AnimState::Walking);
        let walk = c.walk.expect("walk plan started");
        assert!((walk.to.x - start_x).abs() >= MIN_AVOIDANCE_WALK);
        // Vertically pinned to the floor.
        assert!((walk.to.y - (600.0 - AVATAR_HEIGHT - FLOOR_INSET)).abs() < 1e-9);

        // Walk completes and the avatar re-anchors.
        c.tick(now + Duration::from_millis(2_000));
        assert_eq!(c.position(), walk.to);
        assert_eq!(c.state(), AnimState::Idle);

        c.tick(now + Duration::from_millis(2_150));
        assert_eq!(c.landed_position(), Some(walk.to));
    }

    #[test]
    fn far_click_does_not_move_avatar() {
        let now = Instant::now();
        let mut c = activated(now);
        c.handle_bubble_dismissed(now);
        c.place_avatar(Vec2::new(100.0, 500.0));

        c.handle_pointer(
            PointerEvent::Down {
                pos: Vec2::new(700.0, 100.0),
                primary: true,
            },
            now,
        );
        assert!(c.walk.is_none());
    }

    #[test]
    fn drag_start_cancels_walk_and_sync_timer() {
        let now = Instant::now();
        let mut c = activated(now);
        c.handle_bubble_dismissed(now);
        c.place_avatar(Vec2::new(390.0, 270.0));

        c.handle_pointer(
            PointerEvent::Down {
                pos: Vec2::new(470.0, 300.0),
                primary: true,
            },
            now,
        );
        assert!(c.walk.is_some());

        // Mid-walk grab.
        let later = now + Duration::from_millis(500);
        c.tick(later);
        let pos = c.position();
        c.handle_pointer(
            PointerEvent::Down {
                pos: pos + Vec2::new(5.0, 5.0),
                primary: true,
            },
            later,
        );

        assert!(c.walk.is_none());
        assert!(c.walk_sync_due.is_none());

        // The cancelled sync timer must not capture a landing later.
        c.tick(now + Duration::from_millis(2_200));
        assert!(c.landed_position().is_none());
    }

    #[test]
    fn duplicate_advice_requests_rejected_with_warning() {
        let now = Instant::now();
        let mut c = activated(now);

        let job = c.begin_screen_analysis(now);
        assert!(job.is_some());
        assert!(job.unwrap().prompt.contains("Minecraft"));
        assert_eq!(c.state(), AnimState::Thinking);

        let second = c.begin_screen_analysis(now);
        assert!(second.is_none());
        let (text, kind) = c.sink.messages.last().unwrap();
        assert_eq!(*kind, MessageKind::Warning);
        assert!(text.contains("already in progress"));
    }

    #[test]
    fn successful_analysis_shows_strategy_message() {
        let now = Instant::now();
        let mut c = activated(now);
        c.begin_screen_analysis(now).unwrap();

        c.handle_advice_result(
            Ok(ScreenAnalysisResponse {
                analysis: "Build a shelter before nightfall.".to_string(),
                success: true,
                error_message: None,
            }),
            now,
        );

        let (text, kind) = c.sink.messages.last().unwrap();
        assert_eq!(*kind, MessageKind::Strategy);
        assert!(text.contains("shelter"));

        // The strategy message blocks idle tips indefinitely.
        let mut t = now;
        for _ in 0..200 {
            t += Duration::from_millis(100);
            c.tick(t);
        }
        let strategy_count = c
            .sink
            .messages
            .iter()
            .filter(|(_, k)| *k == MessageKind::Strategy)
            .count();
        assert_eq!(strategy_count, 1);
        assert!(c
            .sink
            .messages
            .iter()
            .all(|(_, k)| *k != MessageKind::Advice));
    }

    #[test]
    fn failed_analysis_warns_and_returns_to_idle() {
        let now = Instant::now();
        let mut c = activated(now);
        c.begin_screen_analysis(now).unwrap();

        c.handle_advice_result(Err(AdviceError::http("connection refused")), now);

        assert!(!c.advice_pending);
        let (text, kind) = c.sink.messages.last().unwrap();
        assert_eq!(*kind, MessageKind::Warning);
        assert!(text.contains("connection refused"));

        // Follow-up message fires once the warning expired.
        let mut t = now;
        for _ in 0..140 {
            t += Duration::from_millis(50);
            c.tick(t);
        }
        let (_, last_kind) = c.sink.messages.last().unwrap();
        assert_eq!(*last_kind, MessageKind::Normal);
    }

    #[test]
    fn idle_scheduler_eventually_speaks_rotating_tips() {
        let now = Instant::now();
        let mut c = activated(now);

        let mut t = now;
        // Run simulated time until a few tips have been spoken.
        for _ in 0..20_000 {
            t += Duration::from_millis(50);
            c.tick(t);
            let spoken = c
                .sink
                .messages
                .iter()
                .filter(|(_, k)| *k == MessageKind::Advice)
                .count();
            if spoken >= 3 {
                break;
            }
        }

        let tips: Vec<&str> = c
            .sink
            .messages
            .iter()
            .filter(|(_, k)| *k == MessageKind::Advice)
            .map(|(text, _)| text.as_str())
            .collect();
        assert!(!tips.is_empty());
        // The first tip is specific to the tracked game, the rest rotate.
        assert_eq!(tips[0], quick_tip("Minecraft"));
        for (i, tip) in tips.iter().skip(1).enumerate() {
            assert_eq!(*tip, IDLE_TIPS[i % IDLE_TIPS.len()]);
        }
    }
}
