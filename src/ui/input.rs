/// Keyboard tracking and translation of raw input into session commands.
///
/// Terminals rarely report key releases, so a key counts as held for
/// `HOLD_TIMEOUT` after its last Press/Repeat event. When the terminal does
/// report releases (`honor_release`), those end the hold immediately.
///
/// Keyboard and gamepad both fill a `Controls` snapshot each frame; the
/// snapshot, not the devices, decides which `Command`s the session sees.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEventKind, KeyModifiers};

use crate::sim::game::Command;

/// Autorepeat on most terminals fires every ~30-50 ms after an initial
/// ~250-500 ms delay; this bridges the gap without feeling sticky.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_JUMP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char(' '), KeyCode::Char('w'), KeyCode::Char('W')];
const KEYS_DEBUG: &[KeyCode] = &[KeyCode::Tab];
const KEYS_MONOCHROME: &[KeyCode] = &[KeyCode::Char('m'), KeyCode::Char('M')];
const KEYS_RESTART: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')];

/// One frame of player intent, merged from every input device.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Controls {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    pub debug: bool,
    pub monochrome: bool,
    pub restart: bool,
    pub quit: bool,
}

impl Controls {
    pub fn merge(self, o: Controls) -> Controls {
        Controls {
            left: self.left || o.left,
            right: self.right || o.right,
            jump: self.jump || o.jump,
            debug: self.debug || o.debug,
            monochrome: self.monochrome || o.monochrome,
            restart: self.restart || o.restart,
            quit: self.quit || o.quit,
        }
    }

    /// Commands for this frame, in the order the session should apply them.
    /// Holding both directions cancels out.
    pub fn commands(&self) -> Vec<Command> {
        let mut cmds = Vec::with_capacity(4);
        if self.quit {
            cmds.push(Command::Quit);
            return cmds;
        }
        if self.restart {
            cmds.push(Command::Restart);
        }
        if self.debug {
            cmds.push(Command::ToggleDebug);
        }
        if self.monochrome {
            cmds.push(Command::ToggleMonochrome);
        }
        cmds.push(match (self.left, self.right) {
            (true, false) => Command::MoveLeft,
            (false, true) => Command::MoveRight,
            _ => Command::Stop,
        });
        if self.jump {
            cmds.push(Command::Jump);
        }
        cmds
    }
}

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,
    /// Keys that went from released to held during the last drain.
    fresh_presses: Vec<KeyCode>,
    ctrl_c: bool,
    /// Whether to trust Release events (keyboard enhancement confirmed).
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            ctrl_c: false,
            honor_release: false,
        }
    }

    /// Drain all pending terminal events without blocking.
    /// Call once per frame, before building `controls()`.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.ctrl_c = false;

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                if key.modifiers.contains(KeyModifiers::CONTROL)
                    && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
                {
                    self.ctrl_c = true;
                    continue;
                }
                self.on_key(key.code, key.kind, Instant::now());
            }
        }

        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    fn on_key(&mut self, code: KeyCode, kind: KeyEventKind, now: Instant) {
        match kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&code);
            }
            // Unreliable without enhancement; the timeout handles it.
            KeyEventKind::Release => {}
            _ => {
                if !self.is_held_at(code, now) {
                    self.fresh_presses.push(code);
                }
                self.last_active.insert(code, now);
            }
        }
    }

    pub fn controls(&self) -> Controls {
        let now = Instant::now();
        let held = |keys: &[KeyCode]| keys.iter().any(|k| self.is_held_at(*k, now) || self.fresh_presses.contains(k));
        let pressed = |keys: &[KeyCode]| keys.iter().any(|k| self.fresh_presses.contains(k));
        Controls {
            left: held(KEYS_LEFT),
            right: held(KEYS_RIGHT),
            jump: pressed(KEYS_JUMP),
            debug: pressed(KEYS_DEBUG),
            monochrome: pressed(KEYS_MONOCHROME),
            restart: pressed(KEYS_RESTART),
            quit: self.ctrl_c || pressed(KEYS_QUIT),
        }
    }

    fn is_held_at(&self, code: KeyCode, now: Instant) -> bool {
        self.last_active
            .get(&code)
            .is_some_and(|t| now.saturating_duration_since(*t) < HOLD_TIMEOUT)
    }
}
