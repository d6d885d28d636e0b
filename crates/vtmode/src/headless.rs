#![forbid(unsafe_code)]

//! In-memory driver backend.
//!
//! Holds a driver state per stream and records every write, so the whole
//! controller stack can run without a live terminal: tests assert on the
//! exact sequence of applied states, and headless environments (pipes,
//! IDE consoles, CI) can exercise mode logic without touching a driver.
//!
//! Both driver families are available from any host: [`HeadlessBackend::posix`]
//! serves POSIX-shaped tuples, [`HeadlessBackend::console`] serves
//! console-mode words and honors a configurable host build number.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::axis::SetWhen;
use crate::backend::{DriverBackend, DriverFamily};
use crate::consts::{
    CMD_ENABLE_ECHO_INPUT, CMD_ENABLE_LINE_INPUT, CMD_ENABLE_PROCESSED_INPUT,
    CMD_ENABLE_PROCESSED_OUTPUT, CMD_ENABLE_WRAP_AT_EOL_OUTPUT, ECHO, ICANON, IEXTEN, ISIG, IXON,
    OPOST,
};
use crate::error::ModeError;
use crate::selector::{StreamId, StreamSelector};
use crate::state::{AttrState, DriverState};

const SELECTORS: [StreamSelector; 3] = [
    StreamSelector::Stdin,
    StreamSelector::Stdout,
    StreamSelector::Stderr,
];

fn synthetic_id(selector: StreamSelector) -> StreamId {
    let raw = match selector {
        StreamSelector::Stdin => 0,
        StreamSelector::Stdout => 1,
        StreamSelector::Stderr => 2,
    };
    StreamId::new(selector, raw)
}

fn posix_baseline() -> DriverState {
    DriverState::Attrs(AttrState {
        iflag: IXON,
        oflag: OPOST,
        cflag: 0,
        lflag: ECHO | ICANON | ISIG | IEXTEN,
        ispeed: 38400,
        ospeed: 38400,
        cc: [0x03, 0x1c, 0x11, 0x13, 1, 0],
    })
}

fn console_baseline(selector: StreamSelector) -> DriverState {
    let mode = match selector {
        StreamSelector::Stdin => {
            CMD_ENABLE_PROCESSED_INPUT | CMD_ENABLE_LINE_INPUT | CMD_ENABLE_ECHO_INPUT
        }
        _ => CMD_ENABLE_PROCESSED_OUTPUT | CMD_ENABLE_WRAP_AT_EOL_OUTPUT,
    };
    DriverState::Mode(mode as u32)
}

#[derive(Debug)]
struct HeadlessInner {
    states: HashMap<StreamId, DriverState>,
    applied: Vec<(StreamId, DriverState)>,
    denied: HashSet<StreamSelector>,
}

/// In-memory backend with write recording.
#[derive(Debug)]
pub struct HeadlessBackend {
    family: DriverFamily,
    build: u32,
    inner: Mutex<HeadlessInner>,
}

impl HeadlessBackend {
    /// POSIX-family backend with a cooked-terminal baseline
    /// (echo, canonical input, signals, flow control, output processing,
    /// ctrl-C/ctrl-\/XON/XOFF bound).
    #[must_use]
    pub fn posix() -> Self {
        Self::with_family(DriverFamily::Posix)
    }

    /// Console-family backend with the default cooked console modes and
    /// a host build recent enough for virtual-terminal input.
    #[must_use]
    pub fn console() -> Self {
        Self::with_family(DriverFamily::Console)
    }

    fn with_family(family: DriverFamily) -> Self {
        let mut states = HashMap::new();
        for selector in SELECTORS {
            let state = match family {
                DriverFamily::Posix => posix_baseline(),
                DriverFamily::Console => console_baseline(selector),
            };
            states.insert(synthetic_id(selector), state);
        }
        Self {
            family,
            build: 22000,
            inner: Mutex::new(HeadlessInner {
                states,
                applied: Vec::new(),
                denied: HashSet::new(),
            }),
        }
    }

    /// Replace one stream's baseline state.
    #[must_use]
    pub fn with_state(self, selector: StreamSelector, state: DriverState) -> Self {
        self.inner
            .lock()
            .unwrap()
            .states
            .insert(synthetic_id(selector), state);
        self
    }

    /// Set the reported console host build.
    #[must_use]
    pub fn with_build(mut self, build: u32) -> Self {
        self.build = build;
        self
    }

    /// Make `state` queries for a stream fail with the
    /// inappropriate-device error, as a non-terminal stream would.
    pub fn deny_tty(&self, selector: StreamSelector) {
        self.inner.lock().unwrap().denied.insert(selector);
    }

    /// Number of state writes seen so far.
    #[must_use]
    pub fn apply_count(&self) -> usize {
        self.inner.lock().unwrap().applied.len()
    }

    /// Every state write, in order.
    #[must_use]
    pub fn applied(&self) -> Vec<(StreamId, DriverState)> {
        self.inner.lock().unwrap().applied.clone()
    }

    /// The current state of a stream.
    #[must_use]
    pub fn state_of(&self, selector: StreamSelector) -> Option<DriverState> {
        self.inner
            .lock()
            .unwrap()
            .states
            .get(&synthetic_id(selector))
            .cloned()
    }

    fn device_error(&self) -> ModeError {
        let code = match self.family {
            DriverFamily::Posix => 25,
            DriverFamily::Console => 6,
        };
        ModeError::NotATerminal { code }
    }
}

impl DriverBackend for HeadlessBackend {
    fn family(&self) -> DriverFamily {
        self.family
    }

    fn handle(&self, selector: StreamSelector) -> Result<StreamId, ModeError> {
        Ok(synthetic_id(selector))
    }

    fn state(&self, stream: StreamId) -> Result<DriverState, ModeError> {
        let inner = self.inner.lock().unwrap();
        if inner.denied.contains(&stream.selector()) {
            return Err(self.device_error());
        }
        inner
            .states
            .get(&stream)
            .cloned()
            .ok_or(ModeError::InvalidHandle { code: -1 })
    }

    fn apply(
        &self,
        stream: StreamId,
        state: &DriverState,
        _when: SetWhen,
    ) -> Result<(), ModeError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.denied.contains(&stream.selector()) {
            return Err(self.device_error());
        }
        inner.applied.push((stream, state.clone()));
        inner.states.insert(stream, state.clone());
        Ok(())
    }

    fn check_build(&self, required: u32) -> Result<(), ModeError> {
        match self.family {
            DriverFamily::Posix => Ok(()),
            DriverFamily::Console => {
                if self.build < required {
                    Err(ModeError::BuildTooOld {
                        build: self.build,
                        required,
                    })
                } else {
                    Ok(())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::{CcSlot, FlagAxis};

    #[test]
    fn posix_baseline_is_cooked() {
        let backend = HeadlessBackend::posix();
        let state = backend.state_of(StreamSelector::Stdin).unwrap();
        assert_eq!(state.flag_bits(FlagAxis::Local) & ECHO, ECHO);
        assert_eq!(state.cc(CcSlot::Intr).unwrap(), 0x03);
        assert_eq!(state.cc(CcSlot::Min).unwrap(), 1);
    }

    #[test]
    fn writes_are_recorded_in_order() {
        let backend = HeadlessBackend::posix();
        let stream = backend.handle(StreamSelector::Stdin).unwrap();
        let base = backend.state(stream).unwrap();
        let a = base.with_flag(FlagAxis::In, 0b01, crate::axis::FlagOp::Set);
        let b = base.with_flag(FlagAxis::In, 0b10, crate::axis::FlagOp::Set);
        backend.apply(stream, &a, SetWhen::Now).unwrap();
        backend.apply(stream, &b, SetWhen::Now).unwrap();
        assert_eq!(backend.apply_count(), 2);
        let applied = backend.applied();
        assert_eq!(applied[0].1.attrs(), a.attrs());
        assert_eq!(applied[1].1.attrs(), b.attrs());
    }

    #[test]
    fn denied_stream_reports_inappropriate_device() {
        let backend = HeadlessBackend::posix();
        backend.deny_tty(StreamSelector::Stdin);
        let stream = backend.handle(StreamSelector::Stdin).unwrap();
        assert!(backend.state(stream).unwrap_err().is_inappropriate_device());
    }
}
