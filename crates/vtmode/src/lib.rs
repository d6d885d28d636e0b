#![deny(unsafe_code)]

//! Cross-platform terminal-mode control with tracked, revertible
//! modifications.
//!
//! Terminal driver state (echo, line buffering, control-character
//! bindings, virtual-terminal sequence processing) is a process-global
//! resource the OS hands back in two very different shapes: a POSIX
//! attribute tuple or a Windows console-mode word. This crate puts one
//! semantic surface over both and guarantees that every mutation can be
//! observed, composed, introspected, and deterministically unwound
//! before the process exits.
//!
//! # Guarantees
//!
//! 1. **Every change is tracked** - each mutation is a registered
//!    [`item::ModItem`] keyed by its (stream, value, axis) identity;
//!    an identical modification is detected and deduplicated, never
//!    re-applied.
//! 2. **Baselines are ground truth** - a stream's driver state is
//!    snapshotted the first time it is touched and never overwritten.
//! 3. **Rollback is LIFO and exactly-once** - explicit purges, the
//!    on-demand [`cache_purge`], and the exit paths (panic hook, signal
//!    listener, [`exit::ExitGuard`]) revert items newest-first, at most
//!    once each.
//! 4. **Not-a-terminal is recoverable** - redirected or IDE-hosted
//!    streams surface a first-class error the
//!    [`guard::DeviceErrorGuard`] can dispatch on.
//!
//! # Example
//!
//! ```no_run
//! use vtmode::guard::DeviceErrorGuard;
//!
//! let _exit = vtmode::exit_guard();
//! let mode = DeviceErrorGuard::new()
//!     .on_inappropriate_device(|_| Ok(vtmode::TermMod::Pseudo))
//!     .run(|| {
//!         vtmode::ansi_out()?;
//!         vtmode::no_echo()?;
//!         vtmode::non_block()
//!     })?;
//! // ... read keys, draw ...
//! mode.purge()?;
//! # Ok::<(), vtmode::ModeError>(())
//! ```

pub mod axis;
pub mod backend;
pub mod composite;
pub mod consts;
pub mod error;
pub mod exit;
pub mod gate;
pub mod guard;
pub mod headless;
pub mod item;
pub mod ledger;
pub mod ops;
pub mod selector;
pub mod state;

pub use axis::{Axis, CcSlot, FlagAxis, FlagOp, ModValue, SetWhen};
pub use composite::{ModGroup, TermMod};
pub use error::ModeError;
pub use exit::{exit_guard, ExitGuard};
pub use gate::{Gate, GateState};
pub use guard::DeviceErrorGuard;
pub use item::{ModItem, ModOptions};
pub use ledger::{
    add_flag, cache_purge, check_build, controller, handle, request, sub_flag, ModeController,
};
pub use ops::{
    ansi_in, ansi_out, no_echo, no_impl_def, no_process, non_block,
    regedit_permanent_virtual_terminal_level_command,
};
pub use selector::{StreamId, StreamSelector};
pub use state::DriverState;
