//! Speech-bubble session model.
//!
//! Tracks what is currently displayed and arbitrates which messages may
//! replace it. Strategy messages persist until dismissed and outrank
//! everything else; a minimized bubble likewise blocks non-strategy
//! messages until restored.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Normal,
    Advice,
    Warning,
    Success,
    Thinking,
    /// Persistent, high-priority walkthrough text.
    Strategy,
}

impl MessageKind {
    /// Persistent kinds are shown until explicitly dismissed.
    pub fn is_persistent(self) -> bool {
        matches!(self, MessageKind::Strategy)
    }
}

const BASE_DISPLAY_SECONDS: f64 = 2.0;
const SECONDS_PER_CHAR: f64 = 0.1;
const MAX_DISPLAY_SECONDS: f64 = 12.0;

/// Reading time for a message: 2s plus 0.1s per character, capped at 12s.
pub fn display_duration(text: &str) -> Duration {
    let chars = text.trim().chars().count() as f64;
    let seconds = (BASE_DISPLAY_SECONDS + chars * SECONDS_PER_CHAR).min(MAX_DISPLAY_SECONDS);
    Duration::from_secs_f64(seconds.max(BASE_DISPLAY_SECONDS))
}

#[derive(Debug, Clone, Copy)]
struct ActiveMessage {
    kind: MessageKind,
    /// `None` for persistent messages.
    expires_at: Option<Instant>,
}

/// Session state of the speech bubble.
#[derive(Debug, Default)]
pub struct SpeechState {
    active: Option<ActiveMessage>,
    minimized: bool,
}

impl SpeechState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn is_minimized(&self) -> bool {
        self.minimized
    }

    pub fn kind(&self) -> Option<MessageKind> {
        self.active.map(|m| m.kind)
    }

    /// Whether a new message of `kind` may be displayed right now.
    pub fn allows(&self, kind: MessageKind) -> bool {
        if kind == MessageKind::Strategy {
            return true;
        }
        if self.minimized {
            return false;
        }
        !matches!(self.kind(), Some(MessageKind::Strategy))
    }

    /// Record a message as displayed. Returns the auto-hide duration the
    /// renderer should use (`None` for persistent messages). Callers must
    /// check [`SpeechState::allows`] first.
    pub fn show(&mut self, text: &str, kind: MessageKind, now: Instant) -> Option<Duration> {
        self.minimized = false;
        if kind.is_persistent() {
            self.active = Some(ActiveMessage {
                kind,
                expires_at: None,
            });
            return None;
        }
        let duration = display_duration(text);
        self.active = Some(ActiveMessage {
            kind,
            expires_at: Some(now + duration),
        });
        Some(duration)
    }

    /// Expire a timed message. Returns true when a message just closed.
    pub fn tick(&mut self, now: Instant) -> bool {
        if let Some(ActiveMessage {
            expires_at: Some(at),
            ..
        }) = self.active
        {
            if now >= at {
                self.active = None;
                return true;
            }
        }
        false
    }

    pub fn dismiss(&mut self) {
        self.active = None;
        self.minimized = false;
    }

    /// Collapse the bubble to its minimized bar. No-op when nothing shows.
    pub fn minimize(&mut self) {
        if self.active.is_some() {
            self.minimized = true;
        }
    }

    pub fn restore(&mut self) {
        self.minimized = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_duration_scales_with_length() {
        assert_eq!(display_duration(""), Duration::from_secs_f64(2.0));
        assert_eq!(display_duration("hello"), Duration::from_secs_f64(2.5));
        // Long text caps at 12 seconds.
        let long = "x".repeat(500);
        assert_eq!(display_duration(&long), Duration::from_secs_f64(12.0));
    }

    #[test]
    fn strategy_blocks_lower_priority_messages() {
        let mut speech = SpeechState::new();
        let now = Instant::now();

        assert_eq!(speech.show("walkthrough", MessageKind::Strategy, now), None);
        assert!(!speech.allows(MessageKind::Normal));
        assert!(!speech.allows(MessageKind::Advice));
        // A newer strategy message may still replace it.
        assert!(speech.allows(MessageKind::Strategy));

        speech.dismiss();
        assert!(speech.allows(MessageKind::Normal));
    }

    #[test]
    fn minimized_bubble_blocks_until_restored() {
        let mut speech = SpeechState::new();
        let now = Instant::now();

        speech.show("hi", MessageKind::Normal, now);
        speech.minimize();
        assert!(!speech.allows(MessageKind::Normal));
        assert!(speech.allows(MessageKind::Strategy));

        speech.restore();
        assert!(speech.allows(MessageKind::Normal));
    }

    #[test]
    fn timed_messages_expire() {
        let mut speech = SpeechState::new();
        let now = Instant::now();

        let duration = speech.show("hello", MessageKind::Advice, now).unwrap();
        assert!(!speech.tick(now));
        assert!(speech.tick(now + duration));
        assert!(!speech.is_active());
    }

    #[test]
    fn persistent_messages_never_expire() {
        let mut speech = SpeechState::new();
        let now = Instant::now();

        speech.show("strategy", MessageKind::Strategy, now);
        assert!(!speech.tick(now + Duration::from_secs(3600)));
        assert!(speech.is_active());
    }
}
