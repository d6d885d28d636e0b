#![forbid(unsafe_code)]

//! Symbolic flag constants for both driver families.
//!
//! POSIX bits are taken from the platform's termios on Unix; elsewhere
//! they carry the Linux values so POSIX-shaped in-memory backends behave
//! identically on every host. Console-mode bits follow the Windows
//! console API documentation and carry a `CMD_` prefix.

#[cfg(unix)]
use rustix::termios::{InputModes, LocalModes, OutputModes};

// ── POSIX flag bits ──────────────────────────────────────────────────────

#[cfg(unix)]
pub const ECHO: u64 = LocalModes::ECHO.bits() as u64;
#[cfg(unix)]
pub const ICANON: u64 = LocalModes::ICANON.bits() as u64;
#[cfg(unix)]
pub const ISIG: u64 = LocalModes::ISIG.bits() as u64;
#[cfg(unix)]
pub const IEXTEN: u64 = LocalModes::IEXTEN.bits() as u64;
#[cfg(unix)]
pub const IXON: u64 = InputModes::IXON.bits() as u64;
#[cfg(unix)]
pub const OPOST: u64 = OutputModes::OPOST.bits() as u64;

#[cfg(not(unix))]
pub const ECHO: u64 = 0x0008;
#[cfg(not(unix))]
pub const ICANON: u64 = 0x0002;
#[cfg(not(unix))]
pub const ISIG: u64 = 0x0001;
#[cfg(not(unix))]
pub const IEXTEN: u64 = 0x8000;
#[cfg(not(unix))]
pub const IXON: u64 = 0x0400;
#[cfg(not(unix))]
pub const OPOST: u64 = 0x0001;

// ── Console input-mode bits ──────────────────────────────────────────────

pub const CMD_ENABLE_PROCESSED_INPUT: u64 = 0x0001;
pub const CMD_ENABLE_LINE_INPUT: u64 = 0x0002;
pub const CMD_ENABLE_ECHO_INPUT: u64 = 0x0004;
pub const CMD_ENABLE_WINDOW_INPUT: u64 = 0x0008;
pub const CMD_ENABLE_MOUSE_INPUT: u64 = 0x0010;
pub const CMD_ENABLE_INSERT_MODE: u64 = 0x0020;
pub const CMD_ENABLE_QUICK_EDIT_MODE: u64 = 0x0040;
pub const CMD_ENABLE_EXTENDED_FLAGS: u64 = 0x0080;
pub const CMD_ENABLE_AUTO_POSITION: u64 = 0x0100;
pub const CMD_ENABLE_VIRTUAL_TERMINAL_INPUT: u64 = 0x0200;

// ── Console output-mode bits ─────────────────────────────────────────────

pub const CMD_ENABLE_PROCESSED_OUTPUT: u64 = 0x0001;
pub const CMD_ENABLE_WRAP_AT_EOL_OUTPUT: u64 = 0x0002;
pub const CMD_ENABLE_VIRTUAL_TERMINAL_PROCESSING: u64 = 0x0004;
pub const CMD_DISABLE_NEWLINE_AUTO_RETURN: u64 = 0x0008;
pub const CMD_ENABLE_LVB_GRID_WORLDWIDE: u64 = 0x0010;

/// First Windows build whose console host understands
/// virtual-terminal-input sequences.
pub const ENABLE_VIRTUAL_TERMINAL_BUILD_REQUIRED: u32 = 16257;

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn posix_bits_are_nonzero() {
        for bits in [ECHO, ICANON, ISIG, IEXTEN, IXON, OPOST] {
            assert_ne!(bits, 0);
        }
    }
}
