//! Slide navigation: a clamped index counter and the inputs that drive it.
//!
//! [`Navigator`] never wraps and never leaves `0..len`. Stepping past either
//! end is a no-op, not an error. Whether a step is allowed at all (e.g. while
//! an export is running) is decided by the controller before it gets here.

use crate::{Error, Result};

/// A navigation transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavCommand {
    Next,
    Previous,
}

/// On-screen navigation controls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Previous,
    Next,
}

impl Button {
    pub fn command(self) -> NavCommand {
        match self {
            Button::Previous => NavCommand::Previous,
            Button::Next => NavCommand::Next,
        }
    }
}

/// A key-down event as reported by the host.
///
/// `key` is the logical key name (`"ArrowRight"`), `code` the physical key
/// (`"Space"`). `repeat` is set for auto-repeat events while a key is held.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: String,
    pub code: String,
    pub repeat: bool,
}

impl KeyEvent {
    /// A fresh (non-repeat) press where key and code carry the same name
    pub fn press(name: &str) -> Self {
        Self {
            key: name.to_string(),
            code: name.to_string(),
            repeat: false,
        }
    }

    pub fn new(key: &str, code: &str) -> Self {
        Self {
            key: key.to_string(),
            code: code.to_string(),
            repeat: false,
        }
    }
}

/// Key bindings for the two navigation transitions.
///
/// An entry matches an event if it equals either the event's `key` or its
/// `code`, so `"Space"` matches the space bar whatever the layout reports as
/// its key value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keymap {
    pub next: Vec<String>,
    pub previous: Vec<String>,
}

impl Default for Keymap {
    fn default() -> Self {
        Self {
            next: vec!["ArrowRight".to_string(), "Space".to_string()],
            previous: vec!["ArrowLeft".to_string()],
        }
    }
}

impl Keymap {
    /// Map a key event to a transition. Auto-repeat events never map.
    pub fn resolve(&self, event: &KeyEvent) -> Option<NavCommand> {
        if event.repeat {
            return None;
        }
        let hit = |names: &[String]| names.iter().any(|n| *n == event.key || *n == event.code);
        if hit(&self.next) {
            Some(NavCommand::Next)
        } else if hit(&self.previous) {
            Some(NavCommand::Previous)
        } else {
            None
        }
    }
}

/// Clamped slide index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Navigator {
    current: usize,
    len: usize,
}

impl Navigator {
    /// Start at the first slide of a `len`-slide deck. `len` must be non-zero.
    pub fn new(len: usize) -> Result<Self> {
        if len == 0 {
            return Err(Error::DeckError("cannot navigate an empty deck".to_string()));
        }
        Ok(Self { current: 0, len })
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn at_first(&self) -> bool {
        self.current == 0
    }

    pub fn at_last(&self) -> bool {
        self.current + 1 == self.len
    }

    /// Whether `button` would do anything from the current position
    pub fn is_enabled(&self, button: Button) -> bool {
        match button {
            Button::Previous => !self.at_first(),
            Button::Next => !self.at_last(),
        }
    }

    /// Advance one slide, clamped at the last. Returns whether the index changed.
    pub fn next(&mut self) -> bool {
        let target = (self.current + 1).min(self.len - 1);
        self.set(target)
    }

    /// Step back one slide, clamped at the first. Returns whether the index changed.
    pub fn previous(&mut self) -> bool {
        let target = self.current.saturating_sub(1);
        self.set(target)
    }

    pub fn apply(&mut self, cmd: NavCommand) -> bool {
        match cmd {
            NavCommand::Next => self.next(),
            NavCommand::Previous => self.previous(),
        }
    }

    fn set(&mut self, target: usize) -> bool {
        let changed = target != self.current;
        self.current = target;
        changed
    }
}
