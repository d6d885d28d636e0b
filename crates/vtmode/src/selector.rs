#![forbid(unsafe_code)]

//! Stream selectors and opaque stream identifiers.
//!
//! Callers address the standard streams symbolically; the platform backend
//! resolves a [`StreamSelector`] into a [`StreamId`] carrying whatever raw
//! value the OS uses (a file descriptor on POSIX, a console handle on
//! Windows). No other component touches raw descriptors or handles.

use std::fmt;

/// Symbolic selector for one of the standard streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamSelector {
    Stdin,
    Stdout,
    Stderr,
}

impl fmt::Display for StreamSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdin => write!(f, "stdin"),
            Self::Stdout => write!(f, "stdout"),
            Self::Stderr => write!(f, "stderr"),
        }
    }
}

/// Opaque identifier for an open standard stream.
///
/// Produced by a backend's `handle` method. The raw value is the file
/// descriptor on POSIX and the console handle on Windows; in-memory
/// backends use small integers. Identity (and therefore modification
/// deduplication) is keyed on the whole pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamId {
    selector: StreamSelector,
    raw: i64,
}

impl StreamId {
    /// Construct an id from a selector and the backend's raw value.
    ///
    /// Only backends construct ids; callers obtain them via `handle`.
    #[must_use]
    pub fn new(selector: StreamSelector, raw: i64) -> Self {
        Self { selector, raw }
    }

    /// The symbolic selector this id was resolved from.
    #[must_use]
    pub fn selector(&self) -> StreamSelector {
        self.selector
    }

    /// The backend's raw value (fd, handle, or synthetic index).
    #[must_use]
    pub fn raw(&self) -> i64 {
        self.raw
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.selector, self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_id_identity_includes_raw_value() {
        let a = StreamId::new(StreamSelector::Stdin, 0);
        let b = StreamId::new(StreamSelector::Stdin, 0);
        let c = StreamId::new(StreamSelector::Stdin, 7);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn display_is_compact() {
        let id = StreamId::new(StreamSelector::Stdout, 1);
        assert_eq!(id.to_string(), "stdout#1");
    }
}
