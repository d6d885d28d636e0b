//! Property tests for the pure state accessors.

use proptest::prelude::*;

use vtmode::axis::{Axis, CcSlot, FlagAxis, FlagOp, ModValue};
use vtmode::state::{AttrState, DriverState};

fn attr_state() -> impl Strategy<Value = DriverState> {
    (
        any::<u32>(),
        any::<u32>(),
        any::<u32>(),
        any::<u32>(),
        proptest::array::uniform6(0u8..=0x7f),
    )
        .prop_map(|(iflag, oflag, cflag, lflag, cc)| {
            DriverState::Attrs(AttrState {
                iflag: u64::from(iflag),
                oflag: u64::from(oflag),
                cflag: u64::from(cflag),
                lflag: u64::from(lflag),
                ispeed: 38400,
                ospeed: 38400,
                cc,
            })
        })
}

fn flag_axis() -> impl Strategy<Value = FlagAxis> {
    prop_oneof![
        Just(FlagAxis::In),
        Just(FlagAxis::Out),
        Just(FlagAxis::Ctrl),
        Just(FlagAxis::Local),
    ]
}

fn cc_slot() -> impl Strategy<Value = CcSlot> {
    prop_oneof![
        Just(CcSlot::Intr),
        Just(CcSlot::Quit),
        Just(CcSlot::Start),
        Just(CcSlot::Stop),
        Just(CcSlot::Min),
        Just(CcSlot::Time),
    ]
}

proptest! {
    #[test]
    fn set_then_clear_removes_exactly_the_bits(
        state in attr_state(),
        axis in flag_axis(),
        bits in any::<u32>(),
    ) {
        let bits = u64::from(bits);
        let base = state.flag_bits(axis);
        let round = state
            .with_flag(axis, bits, FlagOp::Set)
            .with_flag(axis, bits, FlagOp::Clear);
        prop_assert_eq!(round.flag_bits(axis), base & !bits);
    }

    #[test]
    fn set_clear_is_identity_when_bits_were_clear(
        state in attr_state(),
        axis in flag_axis(),
        bits in any::<u32>(),
    ) {
        let bits = u64::from(bits) & !state.flag_bits(axis);
        let round = state
            .with_flag(axis, bits, FlagOp::Set)
            .with_flag(axis, bits, FlagOp::Clear);
        prop_assert_eq!(round.flag_bits(axis), state.flag_bits(axis));
        // Other fields are untouched either way.
        for other in [FlagAxis::In, FlagAxis::Out, FlagAxis::Ctrl, FlagAxis::Local] {
            if other != axis {
                prop_assert_eq!(round.flag_bits(other), state.flag_bits(other));
            }
        }
    }

    #[test]
    fn set_makes_the_bits_visible(
        state in attr_state(),
        axis in flag_axis(),
        bits in any::<u32>(),
    ) {
        let bits = u64::from(bits);
        let set = state.with_flag(axis, bits, FlagOp::Set);
        prop_assert_eq!(set.flag_bits(axis) & bits, bits);
    }

    #[test]
    fn console_word_set_then_clear(mode in any::<u32>(), bits in any::<u32>()) {
        let state = DriverState::Mode(mode);
        let round = state
            .with_flag(FlagAxis::In, u64::from(bits), FlagOp::Set)
            .with_flag(FlagAxis::Local, u64::from(bits), FlagOp::Clear);
        // One axis: the selector must not matter.
        prop_assert_eq!(round.mode_bits(), Some(mode & !bits));
    }

    #[test]
    fn cc_write_read_round_trip(
        state in attr_state(),
        slot in cc_slot(),
        byte in 0u8..=0x7f,
    ) {
        let written = state.with_cc(slot, byte).unwrap();
        prop_assert_eq!(written.cc(slot).unwrap(), byte);
    }

    #[test]
    fn out_of_range_cc_specs_are_rejected(
        slot in cc_slot(),
        byte in 0x80u8..=0xff,
    ) {
        use std::sync::Arc;
        use vtmode::headless::HeadlessBackend;
        use vtmode::ledger::ModeController;
        use vtmode::selector::StreamSelector;

        let controller = ModeController::new(Arc::new(HeadlessBackend::posix()));
        let err = controller
            .request(StreamSelector::Stdin, ModValue::cc(byte), Axis::CtrlChar(slot))
            .unwrap_err();
        prop_assert!(matches!(err, vtmode::ModeError::InvalidInput(_)));
    }
}
