//! Typing-state debounce for the composer.
//!
//! Driven by explicit [`Instant`]s so the TUI loop can tick it on every
//! frame and tests can advance time without sleeping.

use std::time::{Duration, Instant};

use collab_proto::typing::TypingSignal;

/// Emits typing start/stop transitions from keystrokes and a timeout.
#[derive(Debug, Clone)]
pub struct TypingDebounce {
    timeout: Duration,
    deadline: Option<Instant>,
}

impl TypingDebounce {
    /// Creates an idle debounce that stops after `timeout` without input.
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            deadline: None,
        }
    }

    /// Whether a typing-start has been emitted without a matching stop.
    #[must_use]
    pub const fn is_typing(&self) -> bool {
        self.deadline.is_some()
    }

    /// A keystroke at `now`. Emits `Start` on the first keystroke of a
    /// burst; every keystroke re-arms the timer.
    pub fn on_input(&mut self, now: Instant) -> Option<TypingSignal> {
        let was_typing = self.is_typing();
        self.deadline = Some(now + self.timeout);
        (!was_typing).then_some(TypingSignal::Start)
    }

    /// Emits `Stop` once the timer has expired.
    pub fn tick(&mut self, now: Instant) -> Option<TypingSignal> {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                Some(TypingSignal::Stop)
            }
            _ => None,
        }
    }

    /// A send: always emits `Stop` and clears the timer.
    pub const fn on_send(&mut self) -> TypingSignal {
        self.deadline = None;
        TypingSignal::Stop
    }

    /// Clears state without emitting anything, for partner switches.
    pub const fn reset(&mut self) {
        self.deadline = None;
    }
}
