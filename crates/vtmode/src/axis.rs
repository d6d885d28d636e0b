#![forbid(unsafe_code)]

//! Modification axes, values, and timing codes.
//!
//! An [`Axis`] names which part of the driver state a modification targets:
//! one of the four POSIX flag fields, or a single control-character slot.
//! The Windows console has exactly one flag field, so the selector is
//! ignored there and control-character slots are rejected by the state
//! layer with a typed not-supported signal.

use std::fmt;

use crate::error::ModeError;

/// Control-character byte meaning "slot disabled".
pub const CC_DISABLED: u8 = 0;

/// The four POSIX bitfield axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagAxis {
    In,
    Out,
    Ctrl,
    Local,
}

/// Symbolic control-character slots.
///
/// `Intr`/`Quit`/`Start`/`Stop` are the interactive bindings (ctrl-C,
/// ctrl-\, XON, XOFF); `Min`/`Time` are the non-canonical read parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CcSlot {
    Intr,
    Quit,
    Start,
    Stop,
    Min,
    Time,
}

impl CcSlot {
    /// Dense index used by synthetic state tuples.
    pub(crate) fn index(self) -> usize {
        match self {
            Self::Intr => 0,
            Self::Quit => 1,
            Self::Start => 2,
            Self::Stop => 3,
            Self::Min => 4,
            Self::Time => 5,
        }
    }

    /// Number of slots, for sizing synthetic cc arrays.
    pub const COUNT: usize = 6;
}

/// Target of a modification: a flag field or a control-character slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    In,
    Out,
    Ctrl,
    Local,
    CtrlChar(CcSlot),
}

impl Axis {
    /// The flag-field view of this axis, if it is not a cc slot.
    #[must_use]
    pub fn flag(self) -> Option<FlagAxis> {
        match self {
            Self::In => Some(FlagAxis::In),
            Self::Out => Some(FlagAxis::Out),
            Self::Ctrl => Some(FlagAxis::Ctrl),
            Self::Local => Some(FlagAxis::Local),
            Self::CtrlChar(_) => None,
        }
    }

    /// The cc-slot view of this axis, if any.
    #[must_use]
    pub fn cc_slot(self) -> Option<CcSlot> {
        match self {
            Self::CtrlChar(slot) => Some(slot),
            _ => None,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::In => write!(f, "in"),
            Self::Out => write!(f, "out"),
            Self::Ctrl => write!(f, "ctrl"),
            Self::Local => write!(f, "local"),
            Self::CtrlChar(slot) => write!(f, "cc:{slot:?}"),
        }
    }
}

/// Whether a modification sets or clears its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagOp {
    Set,
    Clear,
}

/// POSIX timing code for applying a state change. Ignored off-POSIX.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SetWhen {
    /// Apply immediately (TCSANOW).
    #[default]
    Now,
    /// Apply after pending output drains (TCSADRAIN).
    Drain,
    /// Drain output and discard pending input (TCSAFLUSH).
    Flush,
}

/// A modification value: flag bits, or a control-character specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModValue {
    /// Bit constant for a flag axis.
    Bits(u64),
    /// Control-character byte; `None` disables the slot.
    Cc(Option<u8>),
}

impl ModValue {
    #[must_use]
    pub fn bits(bits: u64) -> Self {
        Self::Bits(bits)
    }

    #[must_use]
    pub fn cc(byte: u8) -> Self {
        Self::Cc(Some(byte))
    }

    #[must_use]
    pub fn cc_disabled() -> Self {
        Self::Cc(None)
    }

    /// Coerce this value into its canonical form for `axis`.
    ///
    /// A disabled cc becomes the zero byte, an integer on a cc axis is
    /// accepted as a character code, and cc bytes outside 0–0x7F are
    /// rejected. The canonical form is the identity component used for
    /// duplicate detection.
    pub(crate) fn normalize(self, axis: Axis) -> Result<NormValue, ModeError> {
        match (self, axis) {
            (Self::Bits(bits), Axis::CtrlChar(_)) => {
                if bits <= 0x7f {
                    Ok(NormValue::Cc(bits as u8))
                } else {
                    Err(ModeError::InvalidInput(format!(
                        "{bits:#x} is not a control character code (0..=0x7f)"
                    )))
                }
            }
            (Self::Cc(spec), Axis::CtrlChar(_)) => {
                let byte = spec.unwrap_or(CC_DISABLED);
                if byte <= 0x7f {
                    Ok(NormValue::Cc(byte))
                } else {
                    Err(ModeError::InvalidInput(format!(
                        "{byte:#x} is not a control character code (0..=0x7f)"
                    )))
                }
            }
            (Self::Bits(bits), _) => Ok(NormValue::Bits(bits)),
            (Self::Cc(_), _) => Err(ModeError::InvalidInput(format!(
                "control-character value on flag axis {axis}"
            ))),
        }
    }
}

/// Canonical value form after normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum NormValue {
    Bits(u64),
    Cc(u8),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_cc_normalizes_to_zero() {
        let norm = ModValue::cc_disabled()
            .normalize(Axis::CtrlChar(CcSlot::Intr))
            .unwrap();
        assert_eq!(norm, NormValue::Cc(0));
    }

    #[test]
    fn integer_is_coerced_on_cc_axis() {
        let norm = ModValue::bits(0x11)
            .normalize(Axis::CtrlChar(CcSlot::Start))
            .unwrap();
        assert_eq!(norm, NormValue::Cc(0x11));
    }

    #[test]
    fn out_of_range_cc_is_rejected() {
        let err = ModValue::cc(0x80)
            .normalize(Axis::CtrlChar(CcSlot::Intr))
            .unwrap_err();
        assert!(matches!(err, ModeError::InvalidInput(_)));
    }

    #[test]
    fn cc_value_on_flag_axis_is_rejected() {
        let err = ModValue::cc(0x03).normalize(Axis::Local).unwrap_err();
        assert!(matches!(err, ModeError::InvalidInput(_)));
    }

    #[test]
    fn flag_bits_pass_through() {
        let norm = ModValue::bits(0b1010).normalize(Axis::In).unwrap();
        assert_eq!(norm, NormValue::Bits(0b1010));
    }
}
