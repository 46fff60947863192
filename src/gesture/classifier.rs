//! Gesture classifier
//!
//! Turns the raw key event stream into intents: Escape switches to the
//! primary input method, and a quick Shift press-and-release toggles
//! between primary and secondary.

use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::events::Intent;
use crate::hotkey::keys::{self, codes, ModifierState};
use crate::hotkey::{HotkeyEvent, KeyEvent, KeyEventKind};

/// A Shift release fires only if it follows the press by less than this
pub const DOUBLE_TAP_WINDOW: Duration = Duration::from_millis(300);

/// Everything the classifier remembers between events
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifierState {
    /// A lone Shift is currently held down
    pub shift_held: bool,
    /// Clock reading (nanoseconds) when that Shift went down
    pub last_shift_press_nanos: i64,
}

/// Pure transition function: classify one event against the current state.
///
/// `now_nanos` is the clock reading for this event. Total over its input:
/// every event yields a next state and at most one intent.
pub fn process(
    state: ClassifierState,
    event: &KeyEvent,
    now_nanos: i64,
) -> (Option<Intent>, ClassifierState) {
    match event.kind {
        KeyEventKind::KeyDown if event.key_code == codes::ESC => {
            (Some(Intent::SwitchToPrimary), state)
        }
        KeyEventKind::KeyDown if !keys::is_modifier_key(event.key_code) => {
            // Any ordinary keystroke cancels a pending tap
            (None, ClassifierState { shift_held: false, ..state })
        }
        KeyEventKind::FlagsChanged if keys::is_shift_key(event.key_code) => {
            process_shift(state, event.flags, now_nanos)
        }
        _ => (None, state),
    }
}

fn process_shift(
    state: ClassifierState,
    flags: u64,
    now_nanos: i64,
) -> (Option<Intent>, ClassifierState) {
    let modifiers = ModifierState::from_flags(flags);

    if modifiers.has_chord_modifier() {
        return (None, ClassifierState { shift_held: false, ..state });
    }

    if modifiers.shift {
        if state.shift_held {
            return (None, state);
        }
        return (
            None,
            ClassifierState {
                shift_held: true,
                last_shift_press_nanos: now_nanos,
            },
        );
    }

    if !state.shift_held {
        return (None, state);
    }

    let released = ClassifierState { shift_held: false, ..state };
    let held_for = now_nanos.saturating_sub(state.last_shift_press_nanos);
    if held_for < DOUBLE_TAP_WINDOW.as_nanos() as i64 {
        (Some(Intent::ToggleInputMethod), released)
    } else {
        (None, released)
    }
}

/// Owns the single classifier state and feeds it the event stream
pub struct GestureClassifier {
    state: ClassifierState,
    /// Monotonic origin for event timestamps
    origin: Instant,
    /// Channel for emitting intents
    intent_tx: mpsc::UnboundedSender<Intent>,
}

impl GestureClassifier {
    /// Create a new classifier in the initial state
    pub fn new(intent_tx: mpsc::UnboundedSender<Intent>) -> Self {
        Self {
            state: ClassifierState::default(),
            origin: Instant::now(),
            intent_tx,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> ClassifierState {
        self.state
    }

    /// Run the classifier, processing events until the source goes away
    pub async fn run(&mut self, mut hotkey_rx: mpsc::Receiver<HotkeyEvent>) {
        info!("gesture classifier started");

        while let Some(event) = hotkey_rx.recv().await {
            match event {
                HotkeyEvent::Key(key) => {
                    let now = self.origin.elapsed().as_nanos() as i64;
                    self.handle_key(&key, now);
                }
                HotkeyEvent::TapDisabled => {
                    warn!("event tap was disabled, resetting gesture state");
                    self.state = ClassifierState::default();
                }
            }
        }

        info!("gesture classifier stopped");
    }

    /// Apply one key event at clock reading `now_nanos`
    fn handle_key(&mut self, event: &KeyEvent, now_nanos: i64) -> Option<Intent> {
        let (intent, next) = process(self.state, event, now_nanos);

        if next != self.state {
            debug!(from = ?self.state, to = ?next, "classifier state changed");
        }
        self.state = next;

        if let Some(intent) = intent {
            info!(%intent, "gesture recognised");
            if self.intent_tx.send(intent).is_err() {
                warn!(%intent, "intent receiver closed, dropping intent");
            }
        }

        intent
    }
}
