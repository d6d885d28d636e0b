#![forbid(unsafe_code)]

//! Error taxonomy for terminal-mode control.
//!
//! Backends raise typed errors; nothing above them translates except the
//! high-level operations, which package [`ModeError::NotSupported`] as a
//! pseudo-modification. [`crate::guard::DeviceErrorGuard`] is the only
//! component that performs recovery. Exit-time rollback swallows per-item
//! errors so one failure cannot skip the remaining items.

use std::fmt;

use crate::item::ModItem;

/// Errors raised while observing or mutating terminal driver state.
#[derive(Debug, Clone)]
pub enum ModeError {
    /// The driver rejected a query or write because the stream is not a
    /// terminal (redirected, piped, or emulated by an IDE). Carries the
    /// OS code: errno 25 on POSIX, Win32 error 6.
    NotATerminal { code: i32 },
    /// The OS reported no valid handle for the requested stream.
    InvalidHandle { code: i32 },
    /// The driver accepted the query but rejected the write.
    ApplyFailed { code: i32, what: &'static str },
    /// The console host build is below the required feature threshold.
    BuildTooOld { build: u32, required: u32 },
    /// The operation is meaningful only on the other platform. High-level
    /// operations turn this into a pseudo-modification instead of
    /// surfacing it.
    NotSupported,
    /// A value failed normalization for its axis.
    InvalidInput(String),
    /// A modification with the same (stream, value, axis) identity is
    /// already registered. Control flow, not a fault: the existing item
    /// rides along so callers can deduplicate.
    Duplicate(ModItem),
}

impl ModeError {
    /// Whether this is the inappropriate-device class the
    /// [`crate::guard::DeviceErrorGuard`] dispatches on.
    #[must_use]
    pub fn is_inappropriate_device(&self) -> bool {
        matches!(self, Self::NotATerminal { .. })
    }
}

impl fmt::Display for ModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotATerminal { code } => {
                write!(f, "stream is not a terminal (os error {code})")
            }
            Self::InvalidHandle { code } => {
                write!(f, "no valid handle for stream (os error {code})")
            }
            Self::ApplyFailed { code, what } => {
                write!(f, "{what} failed (os error {code})")
            }
            Self::BuildTooOld { build, required } => {
                write!(f, "console host build {build} is below required build {required}")
            }
            Self::NotSupported => write!(f, "operation not supported on this platform"),
            Self::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            Self::Duplicate(item) => write!(f, "modification already registered: {item:?}"),
        }
    }
}

impl std::error::Error for ModeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inappropriate_device_class_is_narrow() {
        assert!(ModeError::NotATerminal { code: 25 }.is_inappropriate_device());
        assert!(!ModeError::InvalidHandle { code: 9 }.is_inappropriate_device());
        assert!(!ModeError::ApplyFailed { code: 5, what: "tcsetattr" }.is_inappropriate_device());
        assert!(!ModeError::NotSupported.is_inappropriate_device());
    }

    #[test]
    fn display_names_the_failing_call() {
        let err = ModeError::ApplyFailed { code: 22, what: "tcsetattr" };
        assert_eq!(err.to_string(), "tcsetattr failed (os error 22)");
    }
}
