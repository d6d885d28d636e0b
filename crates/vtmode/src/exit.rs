#![forbid(unsafe_code)]

//! Exit-time rollback.
//!
//! Every modification registered with `reset_atexit` must be reverted
//! before the process image goes away, on normal and unhandled-error
//! paths alike (anything short of SIGKILL-class termination). Three
//! mechanisms cover those paths:
//!
//! 1. A panic hook, installed once and chained in front of the previous
//!    hook, rolls the global coordinator back before unwinding proceeds.
//! 2. On Unix, a listener thread for SIGINT/SIGTERM rolls back and exits
//!    with the conventional `128 + signal` status.
//! 3. [`ExitGuard`] covers the normal-return path: hold one in `main`
//!    and the rollback runs when it drops.
//!
//! Each item rolls back at most once no matter how these paths overlap
//! with explicit purges.

use std::sync::OnceLock;

use crate::ledger::installed_controller;

#[cfg(unix)]
use signal_hook::consts::signal::{SIGINT, SIGTERM};
#[cfg(unix)]
use signal_hook::iterator::Signals;

/// Install the panic hook and (on Unix) the termination-signal listener.
/// Idempotent; called by the global coordinator's initializer.
pub(crate) fn install_exit_hooks() {
    static HOOKS: OnceLock<()> = OnceLock::new();
    HOOKS.get_or_init(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            rollback_global();
            previous(info);
        }));

        #[cfg(unix)]
        spawn_signal_listener();
    });
}

fn rollback_global() {
    if let Some(controller) = installed_controller() {
        controller.exit_rollback();
    }
}

#[cfg(unix)]
fn spawn_signal_listener() {
    let Ok(mut signals) = Signals::new([SIGINT, SIGTERM]) else {
        return;
    };
    std::thread::spawn(move || {
        if let Some(signal) = signals.forever().next() {
            #[cfg(feature = "tracing")]
            tracing::warn!(signal, "termination signal received, rolling back terminal state");
            rollback_global();
            std::process::exit(128 + signal);
        }
    });
}

/// RAII handle for the normal-exit path: dropping it rolls the global
/// coordinator back. Hold one for the lifetime of `main`.
#[must_use = "the rollback runs when the guard drops"]
#[derive(Debug)]
pub struct ExitGuard {
    _priv: (),
}

impl Drop for ExitGuard {
    fn drop(&mut self) {
        rollback_global();
    }
}

/// Initialize the global coordinator's exit hooks and return the guard
/// covering the normal-return path.
pub fn exit_guard() -> ExitGuard {
    // Touching the controller installs the panic/signal hooks.
    let _ = crate::ledger::controller();
    ExitGuard { _priv: () }
}
