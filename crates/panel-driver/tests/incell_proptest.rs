//! Property tests for the in-cell decision tables.
//!
//! The decision logic must hold for any raw bitmask, including masks with
//! undefined high bits (restored states from diagnostic interfaces), so these
//! drive the full `u8` space instead of the eight defined states.

#![allow(clippy::unwrap_used)]

use panel_driver::{
    is_power_locked, is_power_on, IncellControl, IncellState, PowerDecision,
};
use proptest::prelude::*;

proptest! {
    #[test]
    fn power_on_decision_matches_the_predicates(bits in any::<u8>()) {
        let mut control = IncellControl::from_state(IncellState::from_bits(bits));
        let decision = control.decide_power_on();

        let system = bits & IncellState::SYSTEM_ON != 0;
        let expected = if !system && !is_power_on(bits) {
            PowerDecision::Execute
        } else {
            PowerDecision::Skip
        };
        prop_assert_eq!(decision, expected);
        // Deciding power-on always raises the system bit, whatever the input.
        prop_assert_ne!(control.state().bits() & IncellState::SYSTEM_ON, 0);
        // Nothing else changes.
        prop_assert_eq!(
            control.state().bits() & !IncellState::SYSTEM_ON,
            bits & !IncellState::SYSTEM_ON
        );
    }

    #[test]
    fn power_off_decision_matches_the_predicates(bits in any::<u8>()) {
        let mut control = IncellControl::from_state(IncellState::from_bits(bits));
        let decision = control.decide_power_off();

        let expected = if is_power_on(bits) && !is_power_locked(bits) {
            PowerDecision::Execute
        } else {
            PowerDecision::Skip
        };
        prop_assert_eq!(decision, expected);
        // Deciding power-off always clears the system bit.
        prop_assert_eq!(control.state().bits() & IncellState::SYSTEM_ON, 0);
        prop_assert_eq!(
            control.state().bits() & !IncellState::SYSTEM_ON,
            bits & !IncellState::SYSTEM_ON
        );
    }

    #[test]
    fn stored_decision_survives_marks_and_lock_changes(bits in any::<u8>(), lock in any::<bool>()) {
        let mut control = IncellControl::from_state(IncellState::from_bits(bits));
        let decision = control.decide_power_on();

        control.mark_power_on();
        control.set_lock(lock);
        control.mark_power_off();
        prop_assert_eq!(control.decision(), decision);
    }

    #[test]
    fn locked_panel_never_loses_power_across_a_blank(lock_bits in any::<u8>()) {
        // Whatever else is set, lock + power means the off decision is Skip.
        let bits = lock_bits | IncellState::LOCK_ON | IncellState::POWER_ON;
        let mut control = IncellControl::from_state(IncellState::from_bits(bits));
        prop_assert_eq!(control.decide_power_off(), PowerDecision::Skip);
        prop_assert!(is_power_on(control.state().bits()));
    }
}
