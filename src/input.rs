//! Key handling: map key events to actions and keep the held state of the digit keys.

use crate::game::{DIGIT_KEYS, HeldKeys};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::{Duration, Instant};

/// Terminals without release events only report presses (and OS repeats); a digit with no
/// press/repeat for this long counts as released.
pub const KEY_RELEASE_TIMEOUT: Duration = Duration::from_millis(150);
/// Without release events, a press this long after the previous one is a new tap, not OS
/// auto-repeat (which runs at 30 Hz or faster).
pub const RETAP_GAP: Duration = Duration::from_millis(50);

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Digit(u8),
    Restart,
    Quit,
    None,
}

/// Map key event to game action. Digits on the main row and the keypad both work.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    if modifiers.contains(KeyModifiers::CONTROL) {
        return match code {
            KeyCode::Char('c') => Action::Quit,
            _ => Action::None,
        };
    }
    match code {
        KeyCode::Char(c @ '0'..='9') => Action::Digit(c as u8 - b'0'),
        KeyCode::Char('r' | 'R') => Action::Restart,
        KeyCode::Char('q' | 'Q') | KeyCode::Esc => Action::Quit,
        _ => Action::None,
    }
}

/// Held state of the ten digit keys, built from press/repeat/release events.
#[derive(Debug, Clone, Default)]
pub struct KeyTracker {
    /// Last press or repeat seen per digit; `None` = released.
    last_seen: [Option<Instant>; DIGIT_KEYS],
    /// Digit tapped again while still counted as held; the next sample shows it released once.
    retapped: [bool; DIGIT_KEYS],
    /// Set once a release event arrives; from then on releases are trusted and the timeout is off.
    reports_release: bool,
}

impl KeyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one key event. Non-digit keys are ignored.
    pub fn handle(&mut self, key: KeyEvent, now: Instant) {
        let Action::Digit(d) = key_to_action(key) else {
            return;
        };
        let slot = &mut self.last_seen[d as usize];
        match key.kind {
            KeyEventKind::Press => {
                if !self.reports_release
                    && slot.is_some_and(|at| now.saturating_duration_since(at) >= RETAP_GAP)
                {
                    self.retapped[d as usize] = true;
                }
                *slot = Some(now);
            }
            KeyEventKind::Repeat => *slot = Some(now),
            KeyEventKind::Release => {
                self.reports_release = true;
                self.retapped[d as usize] = false;
                *slot = None;
            }
        }
    }

    /// Which digits are held right now.
    pub fn held(&mut self, now: Instant) -> HeldKeys {
        let mut held = [false; DIGIT_KEYS];
        for (d, slot) in self.last_seen.iter_mut().enumerate() {
            if std::mem::take(&mut self.retapped[d]) {
                continue;
            }
            if let Some(at) = *slot {
                if !self.reports_release && now.saturating_duration_since(at) > KEY_RELEASE_TIMEOUT {
                    *slot = None;
                } else {
                    held[d] = true;
                }
            }
        }
        held
    }

    /// Forget everything held (new game).
    pub fn clear(&mut self) {
        self.last_seen = [None; DIGIT_KEYS];
        self.retapped = [false; DIGIT_KEYS];
    }
}
