#![forbid(unsafe_code)]

//! Opaque driver state and the portable accessors over it.
//!
//! A [`DriverState`] is whatever the platform hands back for a stream:
//! the full POSIX attribute tuple, a Windows console-mode word, or a
//! synthetic tuple used by in-memory backends. Accessors are pure; the
//! backend layer is the only thing that reads or writes a live driver.

use crate::axis::{Axis, CcSlot, FlagAxis, FlagOp, NormValue};
use crate::error::ModeError;

#[cfg(unix)]
use rustix::termios::{SpecialCodeIndex, Termios};

/// Platform-neutral POSIX-shaped attribute tuple.
///
/// Used by in-memory backends so both driver families can be exercised
/// without a live terminal. Field layout mirrors the POSIX tuple:
/// four flag words, two speeds, and a control-character array indexed
/// by [`CcSlot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrState {
    pub iflag: u64,
    pub oflag: u64,
    pub cflag: u64,
    pub lflag: u64,
    pub ispeed: u32,
    pub ospeed: u32,
    pub cc: [u8; CcSlot::COUNT],
}

impl Default for AttrState {
    fn default() -> Self {
        Self {
            iflag: 0,
            oflag: 0,
            cflag: 0,
            lflag: 0,
            ispeed: 0,
            ospeed: 0,
            cc: [0; CcSlot::COUNT],
        }
    }
}

/// Driver state for one stream, opaque to callers.
#[derive(Debug, Clone)]
pub enum DriverState {
    /// The real POSIX attribute tuple, kept verbatim so a rollback
    /// restores every field the driver reported.
    #[cfg(unix)]
    Termios(Termios),
    /// A Windows console-mode bitmask. There is exactly one flag field,
    /// so the axis selector is ignored.
    Mode(u32),
    /// Synthetic POSIX-shaped tuple used by in-memory backends.
    Attrs(AttrState),
}

#[cfg(unix)]
fn special_code(slot: CcSlot) -> SpecialCodeIndex {
    match slot {
        CcSlot::Intr => SpecialCodeIndex::VINTR,
        CcSlot::Quit => SpecialCodeIndex::VQUIT,
        CcSlot::Start => SpecialCodeIndex::VSTART,
        CcSlot::Stop => SpecialCodeIndex::VSTOP,
        CcSlot::Min => SpecialCodeIndex::VMIN,
        CcSlot::Time => SpecialCodeIndex::VTIME,
    }
}

impl DriverState {
    /// Read the bits of one flag field.
    #[must_use]
    pub fn flag_bits(&self, axis: FlagAxis) -> u64 {
        match self {
            #[cfg(unix)]
            Self::Termios(t) => match axis {
                FlagAxis::In => u64::from(t.input_modes.bits()),
                FlagAxis::Out => u64::from(t.output_modes.bits()),
                FlagAxis::Ctrl => u64::from(t.control_modes.bits()),
                FlagAxis::Local => u64::from(t.local_modes.bits()),
            },
            Self::Mode(mode) => u64::from(*mode),
            Self::Attrs(attrs) => match axis {
                FlagAxis::In => attrs.iflag,
                FlagAxis::Out => attrs.oflag,
                FlagAxis::Ctrl => attrs.cflag,
                FlagAxis::Local => attrs.lflag,
            },
        }
    }

    /// Return a copy with `bits` set or cleared on one flag field.
    #[must_use]
    pub fn with_flag(&self, axis: FlagAxis, bits: u64, op: FlagOp) -> Self {
        let current = self.flag_bits(axis);
        let next = match op {
            FlagOp::Set => current | bits,
            FlagOp::Clear => current & !bits,
        };
        match self {
            #[cfg(unix)]
            Self::Termios(t) => {
                use rustix::termios::{ControlModes, InputModes, LocalModes, OutputModes};
                let mut t = t.clone();
                match axis {
                    FlagAxis::In => t.input_modes = InputModes::from_bits_retain(next as _),
                    FlagAxis::Out => t.output_modes = OutputModes::from_bits_retain(next as _),
                    FlagAxis::Ctrl => t.control_modes = ControlModes::from_bits_retain(next as _),
                    FlagAxis::Local => t.local_modes = LocalModes::from_bits_retain(next as _),
                }
                Self::Termios(t)
            }
            Self::Mode(_) => Self::Mode(next as u32),
            Self::Attrs(attrs) => {
                let mut attrs = attrs.clone();
                match axis {
                    FlagAxis::In => attrs.iflag = next,
                    FlagAxis::Out => attrs.oflag = next,
                    FlagAxis::Ctrl => attrs.cflag = next,
                    FlagAxis::Local => attrs.lflag = next,
                }
                Self::Attrs(attrs)
            }
        }
    }

    /// Read one control-character slot.
    ///
    /// # Errors
    ///
    /// [`ModeError::NotSupported`] on console-mode state, which has no
    /// control-character array.
    pub fn cc(&self, slot: CcSlot) -> Result<u8, ModeError> {
        match self {
            #[cfg(unix)]
            Self::Termios(t) => Ok(t.special_codes[special_code(slot)]),
            Self::Mode(_) => Err(ModeError::NotSupported),
            Self::Attrs(attrs) => Ok(attrs.cc[slot.index()]),
        }
    }

    /// Return a copy with one control-character slot rebound.
    ///
    /// # Errors
    ///
    /// [`ModeError::NotSupported`] on console-mode state.
    pub fn with_cc(&self, slot: CcSlot, byte: u8) -> Result<Self, ModeError> {
        match self {
            #[cfg(unix)]
            Self::Termios(t) => {
                let mut t = t.clone();
                t.special_codes[special_code(slot)] = byte;
                Ok(Self::Termios(t))
            }
            Self::Mode(_) => Err(ModeError::NotSupported),
            Self::Attrs(attrs) => {
                let mut attrs = attrs.clone();
                attrs.cc[slot.index()] = byte;
                Ok(Self::Attrs(attrs))
            }
        }
    }

    /// Whether a canonical value is presently set on its axis.
    ///
    /// Flag bits count as set only when every bit is present; a cc value
    /// counts as set when the slot holds exactly that byte.
    pub(crate) fn contains(&self, value: NormValue, axis: Axis) -> Result<bool, ModeError> {
        match (value, axis.flag(), axis.cc_slot()) {
            (NormValue::Bits(bits), Some(flag), _) => {
                let field = self.flag_bits(flag);
                Ok(field | bits == field)
            }
            (NormValue::Cc(byte), _, Some(slot)) => Ok(self.cc(slot)? == byte),
            _ => Err(ModeError::InvalidInput(format!(
                "value {value:?} does not fit axis {axis}"
            ))),
        }
    }

    /// The console-mode word, when this is console-family state.
    #[must_use]
    pub fn mode_bits(&self) -> Option<u32> {
        match self {
            Self::Mode(mode) => Some(*mode),
            _ => None,
        }
    }

    /// The synthetic tuple, when this is in-memory POSIX-shaped state.
    #[must_use]
    pub fn attrs(&self) -> Option<&AttrState> {
        match self {
            Self::Attrs(attrs) => Some(attrs),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(lflag: u64) -> DriverState {
        DriverState::Attrs(AttrState {
            lflag,
            cc: [0x03, 0x1c, 0x11, 0x13, 1, 0],
            ..AttrState::default()
        })
    }

    #[test]
    fn set_then_clear_restores_flag_field() {
        let base = attrs(0b0101);
        let set = base.with_flag(FlagAxis::Local, 0b0010, FlagOp::Set);
        assert_eq!(set.flag_bits(FlagAxis::Local), 0b0111);
        let cleared = set.with_flag(FlagAxis::Local, 0b0010, FlagOp::Clear);
        assert_eq!(cleared.flag_bits(FlagAxis::Local), 0b0101);
    }

    #[test]
    fn mode_state_has_one_axis() {
        let state = DriverState::Mode(0x0007);
        assert_eq!(state.flag_bits(FlagAxis::In), 7);
        assert_eq!(state.flag_bits(FlagAxis::Local), 7);
        let next = state.with_flag(FlagAxis::Out, 0x0008, FlagOp::Set);
        assert_eq!(next.mode_bits(), Some(0x000f));
    }

    #[test]
    fn mode_state_rejects_cc_slots() {
        let state = DriverState::Mode(0);
        assert!(matches!(state.cc(CcSlot::Intr), Err(ModeError::NotSupported)));
        assert!(matches!(
            state.with_cc(CcSlot::Intr, 0x03),
            Err(ModeError::NotSupported)
        ));
    }

    #[test]
    fn cc_rebind_round_trips() {
        let base = attrs(0);
        assert_eq!(base.cc(CcSlot::Intr).unwrap(), 0x03);
        let disabled = base.with_cc(CcSlot::Intr, 0).unwrap();
        assert_eq!(disabled.cc(CcSlot::Intr).unwrap(), 0);
        let restored = disabled.with_cc(CcSlot::Intr, 0x03).unwrap();
        assert_eq!(restored.attrs(), base.attrs());
    }

    #[test]
    fn contains_requires_every_bit() {
        let state = attrs(0b0110);
        assert!(state
            .contains(NormValue::Bits(0b0110), Axis::Local)
            .unwrap());
        assert!(state.contains(NormValue::Bits(0b0010), Axis::Local).unwrap());
        assert!(!state
            .contains(NormValue::Bits(0b1010), Axis::Local)
            .unwrap());
    }

    #[test]
    fn contains_compares_cc_exactly() {
        let state = attrs(0);
        assert!(state
            .contains(NormValue::Cc(0x03), Axis::CtrlChar(CcSlot::Intr))
            .unwrap());
        assert!(!state
            .contains(NormValue::Cc(0), Axis::CtrlChar(CcSlot::Intr))
            .unwrap());
    }
}
