#![forbid(unsafe_code)]

//! Advisory gates for mode-dependent collaborators.
//!
//! A collaborator that emits terminal-dependent output (styling, private
//! mode toggles) can hang its emission off a [`Gate`]: enabled when the
//! terminal is in a known mode, disabled while it is not, and destroyed
//! once the capability is known to be permanently absent. Gates are
//! advisory: nothing here touches the driver.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

const ENABLED: u8 = 0;
const DISABLED: u8 = 1;
const DESTROYED: u8 = 2;

/// Tri-state advisory toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Enabled,
    Disabled,
    /// Permanently disabled; `enable`/`disable` have no further effect.
    Destroyed,
}

/// A process-wide advisory switch. `const`-constructible so collaborators
/// can declare gates as statics.
pub struct Gate {
    state: AtomicU8,
}

impl Gate {
    /// A new gate, enabled.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(ENABLED),
        }
    }

    #[must_use]
    pub fn state(&self) -> GateState {
        match self.state.load(Ordering::SeqCst) {
            ENABLED => GateState::Enabled,
            DISABLED => GateState::Disabled,
            _ => GateState::Destroyed,
        }
    }

    /// Open the gate. Returns `false` once destroyed.
    pub fn enable(&self) -> bool {
        self.transition(ENABLED)
    }

    /// Close the gate without destroying it. Returns `false` once
    /// destroyed.
    pub fn disable(&self) -> bool {
        self.transition(DISABLED)
    }

    /// Permanently disable the gate.
    pub fn destroy(&self) {
        self.state.store(DESTROYED, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state.load(Ordering::SeqCst) == ENABLED
    }

    /// Run `open` when the gate is open, `closed` otherwise.
    pub fn select<T>(&self, open: impl FnOnce() -> T, closed: impl FnOnce() -> T) -> T {
        if self.is_open() {
            open()
        } else {
            closed()
        }
    }

    fn transition(&self, target: u8) -> bool {
        self.state
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |state| {
                (state != DESTROYED).then_some(target)
            })
            .is_ok()
    }
}

impl Default for Gate {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Gate").field(&self.state()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_enabled() {
        let gate = Gate::new();
        assert!(gate.is_open());
        assert_eq!(gate.state(), GateState::Enabled);
    }

    #[test]
    fn disable_then_enable() {
        let gate = Gate::new();
        assert!(gate.disable());
        assert!(!gate.is_open());
        assert!(gate.enable());
        assert!(gate.is_open());
    }

    #[test]
    fn destroy_is_terminal() {
        let gate = Gate::new();
        gate.destroy();
        assert!(!gate.enable());
        assert!(!gate.disable());
        assert_eq!(gate.state(), GateState::Destroyed);
        assert!(!gate.is_open());
    }

    #[test]
    fn select_follows_state() {
        let gate = Gate::new();
        assert_eq!(gate.select(|| "styled", || ""), "styled");
        gate.disable();
        assert_eq!(gate.select(|| "styled", || ""), "");
    }

    #[test]
    fn gates_work_as_statics() {
        static STYLE_GATE: Gate = Gate::new();
        assert!(STYLE_GATE.is_open());
        STYLE_GATE.disable();
        assert!(!STYLE_GATE.is_open());
        STYLE_GATE.enable();
    }
}
