#![forbid(unsafe_code)]

//! Platform adapter: the only component that speaks OS vocabulary.
//!
//! Everything above this layer works in terms of [`DriverState`] values
//! and the [`DriverBackend`] trait. The POSIX backend wraps the termios
//! attribute tuple; the Windows backend wraps console-mode bitmasks; the
//! in-memory backend in [`crate::headless`] records writes for tests and
//! headless runs.

use std::sync::Arc;

use crate::axis::SetWhen;
use crate::error::ModeError;
use crate::selector::{StreamId, StreamSelector};
use crate::state::DriverState;

#[cfg(unix)]
mod unix;
#[cfg(unix)]
pub use unix::TermiosBackend;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use windows::ConsoleBackend;

/// Which driver model a backend speaks.
///
/// High-level operations branch on this at run time, so a console-family
/// in-memory backend exercises the Windows paths from any host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverFamily {
    /// termios attribute tuples (flag fields plus control characters).
    Posix,
    /// Console-mode bitmask, one per stream.
    Console,
}

/// Uniform surface over the platform's terminal driver.
pub trait DriverBackend: Send + Sync {
    /// The driver model this backend speaks.
    fn family(&self) -> DriverFamily;

    /// Resolve a symbolic selector into a stream id.
    ///
    /// # Errors
    ///
    /// [`ModeError::InvalidHandle`] when the OS reports no valid handle.
    fn handle(&self, selector: StreamSelector) -> Result<StreamId, ModeError>;

    /// Query the driver state of a stream.
    ///
    /// This is the sole producer of [`ModeError::NotATerminal`]: the
    /// driver rejects the query when the stream is not a terminal.
    fn state(&self, stream: StreamId) -> Result<DriverState, ModeError>;

    /// Write a driver state to a stream.
    ///
    /// # Errors
    ///
    /// [`ModeError::ApplyFailed`] when the driver rejects the write.
    fn apply(&self, stream: StreamId, state: &DriverState, when: SetWhen)
        -> Result<(), ModeError>;

    /// Verify the host meets a feature's minimum console build.
    ///
    /// No-op for POSIX-family backends.
    fn check_build(&self, required: u32) -> Result<(), ModeError>;
}

/// The backend for the platform this process runs on.
#[cfg(unix)]
pub(crate) fn platform_backend() -> Arc<dyn DriverBackend> {
    Arc::new(TermiosBackend::new())
}

#[cfg(windows)]
pub(crate) fn platform_backend() -> Arc<dyn DriverBackend> {
    Arc::new(ConsoleBackend::new())
}

#[cfg(not(any(unix, windows)))]
pub(crate) fn platform_backend() -> Arc<dyn DriverBackend> {
    compile_error!("no terminal driver backend for this platform");
}
