#![forbid(unsafe_code)]

//! termios backend.
//!
//! Borrows fds from the std stream handles rather than constructing
//! `BorrowedFd` from raw integers, so no unsafe is needed anywhere in
//! this backend.

use std::io;
use std::os::fd::{AsFd, AsRawFd};

use rustix::io::Errno;
use rustix::termios::{self, OptionalActions};

use crate::axis::SetWhen;
use crate::backend::{DriverBackend, DriverFamily};
use crate::error::ModeError;
use crate::selector::{StreamId, StreamSelector};
use crate::state::DriverState;

/// POSIX backend over `tcgetattr`/`tcsetattr`.
#[derive(Debug, Default)]
pub struct TermiosBackend;

impl TermiosBackend {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

fn with_fd<T>(selector: StreamSelector, f: impl FnOnce(&dyn AsFd) -> T) -> T {
    match selector {
        StreamSelector::Stdin => f(&io::stdin()),
        StreamSelector::Stdout => f(&io::stdout()),
        StreamSelector::Stderr => f(&io::stderr()),
    }
}

fn map_errno(errno: Errno, what: &'static str) -> ModeError {
    let code = errno.raw_os_error();
    match errno {
        Errno::NOTTY => ModeError::NotATerminal { code },
        Errno::BADF => ModeError::InvalidHandle { code },
        _ => ModeError::ApplyFailed { code, what },
    }
}

fn actions(when: SetWhen) -> OptionalActions {
    match when {
        SetWhen::Now => OptionalActions::Now,
        SetWhen::Drain => OptionalActions::Drain,
        SetWhen::Flush => OptionalActions::Flush,
    }
}

impl DriverBackend for TermiosBackend {
    fn family(&self) -> DriverFamily {
        DriverFamily::Posix
    }

    fn handle(&self, selector: StreamSelector) -> Result<StreamId, ModeError> {
        let fd = with_fd(selector, |fd| fd.as_fd().as_raw_fd());
        Ok(StreamId::new(selector, i64::from(fd)))
    }

    fn state(&self, stream: StreamId) -> Result<DriverState, ModeError> {
        with_fd(stream.selector(), |fd| termios::tcgetattr(fd))
            .map(DriverState::Termios)
            .map_err(|errno| map_errno(errno, "tcgetattr"))
    }

    fn apply(
        &self,
        stream: StreamId,
        state: &DriverState,
        when: SetWhen,
    ) -> Result<(), ModeError> {
        let DriverState::Termios(t) = state else {
            return Err(ModeError::InvalidInput(
                "termios backend expects a termios state".into(),
            ));
        };
        with_fd(stream.selector(), |fd| {
            termios::tcsetattr(fd, actions(when), t)
        })
        .map_err(|errno| map_errno(errno, "tcsetattr"))
    }

    fn check_build(&self, _required: u32) -> Result<(), ModeError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::FlagAxis;

    // CI rarely attaches a terminal; the contract here is "a typed error
    // or a real state, never a panic".
    #[test]
    fn state_query_yields_state_or_typed_device_error() {
        let backend = TermiosBackend::new();
        let stream = backend.handle(StreamSelector::Stdin).unwrap();
        match backend.state(stream) {
            Ok(state) => {
                let _ = state.flag_bits(FlagAxis::Local);
            }
            Err(err) => assert!(matches!(
                err,
                ModeError::NotATerminal { .. }
                    | ModeError::InvalidHandle { .. }
                    | ModeError::ApplyFailed { .. }
            )),
        }
    }

    #[test]
    fn round_trips_current_attributes_when_on_a_tty() {
        if !termios::isatty(io::stdin()) {
            return;
        }
        let backend = TermiosBackend::new();
        let stream = backend.handle(StreamSelector::Stdin).unwrap();
        let state = backend.state(stream).unwrap();
        // Writing back the state just read must be accepted verbatim.
        backend.apply(stream, &state, SetWhen::Now).unwrap();
    }
}
