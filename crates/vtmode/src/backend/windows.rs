// Raw Win32 console calls live here and nowhere else.
#![allow(unsafe_code)]

//! Console-mode backend.

use std::mem;

use winapi::shared::minwindef::DWORD;
use winapi::shared::winerror::ERROR_INVALID_HANDLE;
use winapi::um::consoleapi::{GetConsoleMode, SetConsoleMode};
use winapi::um::errhandlingapi::GetLastError;
use winapi::um::handleapi::INVALID_HANDLE_VALUE;
use winapi::um::processenv::GetStdHandle;
use winapi::um::sysinfoapi::GetVersionExW;
use winapi::um::winbase::{STD_ERROR_HANDLE, STD_INPUT_HANDLE, STD_OUTPUT_HANDLE};
use winapi::um::winnt::{HANDLE, OSVERSIONINFOW};

use crate::axis::SetWhen;
use crate::backend::{DriverBackend, DriverFamily};
use crate::error::ModeError;
use crate::selector::{StreamId, StreamSelector};
use crate::state::DriverState;

/// Windows backend over `GetConsoleMode`/`SetConsoleMode`.
#[derive(Debug, Default)]
pub struct ConsoleBackend;

impl ConsoleBackend {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

fn raw_handle(stream: StreamId) -> HANDLE {
    stream.raw() as isize as HANDLE
}

fn last_error() -> i32 {
    // SAFETY: reading the thread's last-error value.
    (unsafe { GetLastError() }) as i32
}

impl DriverBackend for ConsoleBackend {
    fn family(&self) -> DriverFamily {
        DriverFamily::Console
    }

    fn handle(&self, selector: StreamSelector) -> Result<StreamId, ModeError> {
        let code = match selector {
            StreamSelector::Stdin => STD_INPUT_HANDLE,
            StreamSelector::Stdout => STD_OUTPUT_HANDLE,
            StreamSelector::Stderr => STD_ERROR_HANDLE,
        };
        // SAFETY: GetStdHandle has no preconditions.
        let handle = unsafe { GetStdHandle(code) };
        if handle == INVALID_HANDLE_VALUE {
            return Err(ModeError::InvalidHandle { code: last_error() });
        }
        Ok(StreamId::new(selector, handle as isize as i64))
    }

    fn state(&self, stream: StreamId) -> Result<DriverState, ModeError> {
        let mut mode: DWORD = 0;
        // SAFETY: the handle came from GetStdHandle and the out pointer is
        // a live local.
        if unsafe { GetConsoleMode(raw_handle(stream), &mut mode) } == 0 {
            let code = last_error();
            if code == ERROR_INVALID_HANDLE as i32 {
                return Err(ModeError::NotATerminal { code });
            }
            return Err(ModeError::ApplyFailed {
                code,
                what: "GetConsoleMode",
            });
        }
        Ok(DriverState::Mode(mode))
    }

    fn apply(
        &self,
        stream: StreamId,
        state: &DriverState,
        _when: SetWhen,
    ) -> Result<(), ModeError> {
        let DriverState::Mode(mode) = state else {
            return Err(ModeError::InvalidInput(
                "console backend expects a console-mode state".into(),
            ));
        };
        // SAFETY: the handle came from GetStdHandle.
        if unsafe { SetConsoleMode(raw_handle(stream), *mode) } == 0 {
            return Err(ModeError::ApplyFailed {
                code: last_error(),
                what: "SetConsoleMode",
            });
        }
        Ok(())
    }

    fn check_build(&self, required: u32) -> Result<(), ModeError> {
        // SAFETY: zeroed OSVERSIONINFOW with the size field set is the
        // documented calling convention, and the struct outlives the call.
        let mut info: OSVERSIONINFOW = unsafe { mem::zeroed() };
        info.dwOSVersionInfoSize = mem::size_of::<OSVERSIONINFOW>() as DWORD;
        if unsafe { GetVersionExW(&mut info) } == 0 {
            return Err(ModeError::ApplyFailed {
                code: last_error(),
                what: "GetVersionExW",
            });
        }
        if info.dwBuildNumber < required {
            return Err(ModeError::BuildTooOld {
                build: info.dwBuildNumber,
                required,
            });
        }
        Ok(())
    }
}
