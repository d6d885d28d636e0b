#![forbid(unsafe_code)]

//! Named terminal configurations.
//!
//! Each operation is a near-parameterless entry point for one common
//! configuration, built on the deduplicating factory: calling an
//! operation twice yields handles to the same registered items and does
//! not re-apply the driver write. A not-supported signal escaping any
//! operation body is packaged as a pseudo-modification, never surfaced.
//!
//! | Operation      | POSIX                              | Console                              |
//! |----------------|------------------------------------|--------------------------------------|
//! | `ansi_in`      | no-op (pseudo)                     | enable virtual-terminal input        |
//! | `ansi_out`     | no-op (pseudo)                     | enable virtual-terminal processing   |
//! | `no_echo`      | clear ECHO                         | clear echo-input                     |
//! | `non_block`    | clear ICANON, VMIN=0, VTIME=0      | clear echo-input + line-input        |
//! | `no_process`   | clear ISIG + IXON                  | clear processed-input                |
//! | `no_impl_def`  | clear IEXTEN + OPOST               | extended-flags on, quick-edit off    |

use crate::axis::{Axis, CcSlot, FlagOp, ModValue};
use crate::backend::DriverFamily;
use crate::composite::{ModGroup, TermMod};
use crate::consts::{
    CMD_ENABLE_ECHO_INPUT, CMD_ENABLE_EXTENDED_FLAGS, CMD_ENABLE_LINE_INPUT,
    CMD_ENABLE_PROCESSED_INPUT, CMD_ENABLE_QUICK_EDIT_MODE, CMD_ENABLE_VIRTUAL_TERMINAL_INPUT,
    CMD_ENABLE_VIRTUAL_TERMINAL_PROCESSING, ECHO, ENABLE_VIRTUAL_TERMINAL_BUILD_REQUIRED, ICANON,
    IEXTEN, ISIG, IXON, OPOST,
};
use crate::error::ModeError;
use crate::item::{ModItem, ModOptions};
use crate::ledger::{controller, ModeController};
use crate::selector::StreamSelector::{self, Stdin, Stdout};

fn noted(note: &'static str) -> ModOptions {
    ModOptions {
        note: Some(note),
        ..ModOptions::default()
    }
}

/// Run one operation body, translating the typed not-supported signal
/// into a pseudo-modification. Every other error propagates unchanged.
fn pseudo_when_unsupported(
    build: impl FnOnce() -> Result<TermMod, ModeError>,
) -> Result<TermMod, ModeError> {
    match build() {
        Err(ModeError::NotSupported) => Ok(TermMod::Pseudo),
        other => other,
    }
}

impl ModeController {
    fn set(
        &self,
        selector: StreamSelector,
        value: ModValue,
        axis: Axis,
        note: &'static str,
    ) -> Result<ModItem, ModeError> {
        self.instance(FlagOp::Set, selector, value, axis, noted(note))
    }

    fn clear(
        &self,
        selector: StreamSelector,
        value: ModValue,
        axis: Axis,
        note: &'static str,
    ) -> Result<ModItem, ModeError> {
        self.instance(FlagOp::Clear, selector, value, axis, noted(note))
    }

    /// Enable virtual-terminal input sequences on stdin.
    ///
    /// POSIX terminals produce them natively, so this is a pseudo no-op
    /// there. On the console the host build is verified first.
    pub fn ansi_in(&self) -> Result<TermMod, ModeError> {
        pseudo_when_unsupported(|| match self.family() {
            DriverFamily::Posix => Ok(TermMod::Pseudo),
            DriverFamily::Console => {
                self.check_build(ENABLE_VIRTUAL_TERMINAL_BUILD_REQUIRED)?;
                let vt = self.set(
                    Stdin,
                    ModValue::bits(CMD_ENABLE_VIRTUAL_TERMINAL_INPUT),
                    Axis::In,
                    "ENABLE_VIRTUAL_TERMINAL_INPUT",
                )?;
                Ok(TermMod::Item(vt))
            }
        })
    }

    /// Enable virtual-terminal sequence processing on stdout.
    pub fn ansi_out(&self) -> Result<TermMod, ModeError> {
        pseudo_when_unsupported(|| match self.family() {
            DriverFamily::Posix => Ok(TermMod::Pseudo),
            DriverFamily::Console => {
                self.check_build(ENABLE_VIRTUAL_TERMINAL_BUILD_REQUIRED)?;
                let vt = self.set(
                    Stdout,
                    ModValue::bits(CMD_ENABLE_VIRTUAL_TERMINAL_PROCESSING),
                    Axis::Out,
                    "ENABLE_VIRTUAL_TERMINAL_PROCESSING",
                )?;
                Ok(TermMod::Item(vt))
            }
        })
    }

    /// Stop the driver from echoing input.
    pub fn no_echo(&self) -> Result<TermMod, ModeError> {
        pseudo_when_unsupported(|| {
            let item = match self.family() {
                DriverFamily::Posix => {
                    self.clear(Stdin, ModValue::bits(ECHO), Axis::Local, "ECHO")?
                }
                DriverFamily::Console => self.clear(
                    Stdin,
                    ModValue::bits(CMD_ENABLE_ECHO_INPUT),
                    Axis::In,
                    "ENABLE_ECHO_INPUT",
                )?,
            };
            Ok(TermMod::Item(item))
        })
    }

    /// Make reads return immediately with whatever is available.
    ///
    /// POSIX: leave canonical mode and zero the VMIN/VTIME read gate.
    /// Console: drop echo and line buffering together.
    pub fn non_block(&self) -> Result<TermMod, ModeError> {
        pseudo_when_unsupported(|| match self.family() {
            DriverFamily::Posix => {
                let icanon = self.clear(Stdin, ModValue::bits(ICANON), Axis::Local, "ICANON")?;
                let vmin = self.set(Stdin, ModValue::cc(0), Axis::CtrlChar(CcSlot::Min), "VMIN")?;
                let vtime =
                    self.set(Stdin, ModValue::cc(0), Axis::CtrlChar(CcSlot::Time), "VTIME")?;
                Ok(TermMod::Group(ModGroup::new(vec![icanon, vmin, vtime])))
            }
            DriverFamily::Console => {
                let echo = self.clear(
                    Stdin,
                    ModValue::bits(CMD_ENABLE_ECHO_INPUT),
                    Axis::In,
                    "ENABLE_ECHO_INPUT",
                )?;
                let line = self.clear(
                    Stdin,
                    ModValue::bits(CMD_ENABLE_LINE_INPUT),
                    Axis::In,
                    "ENABLE_LINE_INPUT",
                )?;
                Ok(TermMod::Group(ModGroup::new(vec![echo, line])))
            }
        })
    }

    /// Stop the driver from intercepting control characters
    /// (signal generation and flow control).
    pub fn no_process(&self) -> Result<TermMod, ModeError> {
        pseudo_when_unsupported(|| match self.family() {
            DriverFamily::Posix => {
                let isig = self.clear(Stdin, ModValue::bits(ISIG), Axis::Local, "ISIG")?;
                let ixon = self.clear(Stdin, ModValue::bits(IXON), Axis::In, "IXON")?;
                Ok(TermMod::Group(ModGroup::new(vec![isig, ixon])))
            }
            DriverFamily::Console => {
                let item = self.clear(
                    Stdin,
                    ModValue::bits(CMD_ENABLE_PROCESSED_INPUT),
                    Axis::In,
                    "ENABLE_PROCESSED_INPUT",
                )?;
                Ok(TermMod::Item(item))
            }
        })
    }

    /// Disable implementation-defined input and output processing.
    pub fn no_impl_def(&self) -> Result<TermMod, ModeError> {
        pseudo_when_unsupported(|| match self.family() {
            DriverFamily::Posix => {
                let iexten = self.clear(Stdin, ModValue::bits(IEXTEN), Axis::Local, "IEXTEN")?;
                let opost = self.clear(Stdout, ModValue::bits(OPOST), Axis::Out, "OPOST")?;
                Ok(TermMod::Group(ModGroup::new(vec![iexten, opost])))
            }
            DriverFamily::Console => {
                let extended = self.set(
                    Stdin,
                    ModValue::bits(CMD_ENABLE_EXTENDED_FLAGS),
                    Axis::In,
                    "ENABLE_EXTENDED_FLAGS",
                )?;
                let quick_edit = self.clear(
                    Stdin,
                    ModValue::bits(CMD_ENABLE_QUICK_EDIT_MODE),
                    Axis::In,
                    "ENABLE_QUICK_EDIT_MODE",
                )?;
                Ok(TermMod::Group(ModGroup::new(vec![extended, quick_edit])))
            }
        })
    }
}

/// Enable virtual-terminal input on the global coordinator.
pub fn ansi_in() -> Result<TermMod, ModeError> {
    controller().ansi_in()
}

/// Enable virtual-terminal output processing on the global coordinator.
pub fn ansi_out() -> Result<TermMod, ModeError> {
    controller().ansi_out()
}

/// Disable input echo on the global coordinator.
pub fn no_echo() -> Result<TermMod, ModeError> {
    controller().no_echo()
}

/// Make stdin reads non-blocking on the global coordinator.
pub fn non_block() -> Result<TermMod, ModeError> {
    controller().non_block()
}

/// Disable control-character interception on the global coordinator.
pub fn no_process() -> Result<TermMod, ModeError> {
    controller().no_process()
}

/// Disable implementation-defined processing on the global coordinator.
pub fn no_impl_def() -> Result<TermMod, ModeError> {
    controller().no_impl_def()
}

/// The shell command that permanently sets the console host's
/// virtual-terminal level for the current user. Pure string builder; no
/// registry access happens here.
#[must_use]
pub fn regedit_permanent_virtual_terminal_level_command(enable: bool) -> String {
    format!(
        "REG ADD HKCU\\CONSOLE /f /v VirtualTerminalLevel /t REG_DWORD /d {}",
        u8::from(enable)
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::headless::HeadlessBackend;

    #[test]
    fn regedit_command_is_pure() {
        assert_eq!(
            regedit_permanent_virtual_terminal_level_command(true),
            "REG ADD HKCU\\CONSOLE /f /v VirtualTerminalLevel /t REG_DWORD /d 1"
        );
        assert_eq!(
            regedit_permanent_virtual_terminal_level_command(false),
            "REG ADD HKCU\\CONSOLE /f /v VirtualTerminalLevel /t REG_DWORD /d 0"
        );
    }

    #[test]
    fn unsupported_signal_becomes_a_pseudo_result() {
        let out = pseudo_when_unsupported(|| Err(ModeError::NotSupported)).unwrap();
        assert!(!out.is_effective());
    }

    #[test]
    fn other_errors_pass_through_untranslated() {
        let err = pseudo_when_unsupported(|| {
            Err(ModeError::BuildTooOld {
                build: 1,
                required: 2,
            })
        })
        .unwrap_err();
        assert!(matches!(err, ModeError::BuildTooOld { .. }));
    }

    // No current operation builds a cc-axis value on the console family;
    // the translation must hold anyway for any operation body that does.
    #[test]
    fn cc_axis_on_console_yields_a_pseudo_result() {
        let controller = ModeController::new(Arc::new(HeadlessBackend::console()));
        let out = pseudo_when_unsupported(|| {
            let item = controller.set(
                Stdin,
                ModValue::cc_disabled(),
                Axis::CtrlChar(CcSlot::Intr),
                "VINTR",
            )?;
            Ok(TermMod::Item(item))
        })
        .unwrap();
        assert!(!out.is_effective());
        assert!(controller.items().is_empty());
    }
}
