//! In-cell coordination state.
//!
//! The display and the in-cell touch controller share rails and reset timing,
//! so a power request from either side may have to be suppressed depending on
//! the combined state. Three bits are tracked: whether the *system* (display
//! pipeline) is up, whether panel *power* is physically on, and whether the
//! touch side holds a *lock* that pins power on across display transitions.
//!
//! Every power-on or power-off request first derives a [`PowerDecision`] from
//! the current bits — before any hardware action — and stores it; the
//! follow-up phase of the same request reads that stored decision exactly
//! once. A `Skip` decision makes the physical sequence a no-op while the
//! bookkeeping bits still advance.
//!
//! The singleton is shared behind [`crate::sequencer::IncellMutex`]; nothing
//! here touches hardware.

/// Composite in-cell state bitmask.
///
/// Bit assignment: bit 0 = power, bit 1 = lock, bit 2 = system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IncellState(u8);

impl IncellState {
    /// Panel power is physically on.
    pub const POWER_ON: u8 = 1 << 0;
    /// Touch side holds the power lock.
    pub const LOCK_ON: u8 = 1 << 1;
    /// Display system is up.
    pub const SYSTEM_ON: u8 = 1 << 2;

    /// All bits clear: system down, power off, unlocked.
    #[must_use]
    pub const fn new() -> Self {
        Self(0)
    }

    /// Build from a raw bitmask (diagnostic interfaces).
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Raw bitmask.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    const fn power(self) -> bool {
        self.0 & Self::POWER_ON != 0
    }

    const fn lock(self) -> bool {
        self.0 & Self::LOCK_ON != 0
    }

    const fn system(self) -> bool {
        self.0 & Self::SYSTEM_ON != 0
    }
}

/// `true` if the power bit is set in `state`. Pure over the bitmask.
#[must_use]
pub const fn is_power_on(state: u8) -> bool {
    state & IncellState::POWER_ON != 0
}

/// `true` if the lock bit is set in `state`. Pure over the bitmask.
#[must_use]
pub const fn is_power_locked(state: u8) -> bool {
    state & IncellState::LOCK_ON != 0
}

/// Whether the physical sequence of the current power transition executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerDecision {
    /// Run the hardware sequence.
    Execute,
    /// Suppress the hardware sequence; bookkeeping only.
    Skip,
}

/// The in-cell coordination singleton.
#[derive(Debug, Clone, Copy)]
pub struct IncellControl {
    state: IncellState,
    seq: PowerDecision,
}

impl IncellControl {
    /// Fresh control block: everything off, next decision defaults to skip.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: IncellState::new(),
            seq: PowerDecision::Skip,
        }
    }

    /// Restore from a known state (e.g. panel left on by the bootloader).
    #[must_use]
    pub const fn from_state(state: IncellState) -> Self {
        Self {
            state,
            seq: PowerDecision::Skip,
        }
    }

    /// Current composite state.
    #[must_use]
    pub const fn state(&self) -> IncellState {
        self.state
    }

    /// Decision stored by the most recent `decide_*` call.
    #[must_use]
    pub const fn decision(&self) -> PowerDecision {
        self.seq
    }

    /// Resolve the decision for a power-on request and mark the system up.
    ///
    /// Execute only when neither the system nor panel power is already on;
    /// a lock alone does not suppress bring-up.
    pub fn decide_power_on(&mut self) -> PowerDecision {
        let s = self.state;
        let seq = match (s.system(), s.lock(), s.power()) {
            (false, _, false) => PowerDecision::Execute,
            (false, _, true) => PowerDecision::Skip,
            (true, _, _) => {
                error!("power on requested but system is already on");
                PowerDecision::Skip
            }
        };

        self.state.0 |= IncellState::SYSTEM_ON;

        self.seq = seq;
        seq
    }

    /// Resolve the decision for a power-off request and mark the system down.
    ///
    /// Execute only when power is on and not locked; a locked panel keeps
    /// power across the display transition.
    pub fn decide_power_off(&mut self) -> PowerDecision {
        let s = self.state;
        let seq = match (s.system(), s.lock(), s.power()) {
            (true, false, true) => PowerDecision::Execute,
            (false, false, true) => {
                debug!("power off by unlock");
                PowerDecision::Execute
            }
            (_, true, true) => {
                debug!("power kept on in lock state");
                PowerDecision::Skip
            }
            (_, _, false) => {
                error!("power off requested but power is already off");
                PowerDecision::Skip
            }
        };

        self.state.0 &= !IncellState::SYSTEM_ON;

        self.seq = seq;
        seq
    }

    /// Record that panel power is physically on.
    pub fn mark_power_on(&mut self) {
        self.state.0 |= IncellState::POWER_ON;
    }

    /// Record that panel power is physically off.
    pub fn mark_power_off(&mut self) {
        self.state.0 &= !IncellState::POWER_ON;
    }

    /// Set or clear the touch-side power lock.
    pub fn set_lock(&mut self, locked: bool) {
        if locked {
            self.state.0 |= IncellState::LOCK_ON;
        } else {
            self.state.0 &= !IncellState::LOCK_ON;
        }
    }
}

impl Default for IncellControl {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POWER: u8 = IncellState::POWER_ON;
    const LOCK: u8 = IncellState::LOCK_ON;
    const SYSTEM: u8 = IncellState::SYSTEM_ON;

    fn control(bits: u8) -> IncellControl {
        IncellControl::from_state(IncellState::from_bits(bits))
    }

    #[test]
    fn power_on_executes_only_from_cold_states() {
        // S000 and S010: system down, power off (lock irrelevant).
        for bits in [0, LOCK] {
            let mut c = control(bits);
            assert_eq!(c.decide_power_on(), PowerDecision::Execute, "bits {bits:#05b}");
        }
        // S001, S011: power already on.
        for bits in [POWER, LOCK | POWER] {
            let mut c = control(bits);
            assert_eq!(c.decide_power_on(), PowerDecision::Skip, "bits {bits:#05b}");
        }
        // System already on: always skip.
        for bits in [SYSTEM, SYSTEM | POWER, SYSTEM | LOCK, SYSTEM | LOCK | POWER] {
            let mut c = control(bits);
            assert_eq!(c.decide_power_on(), PowerDecision::Skip, "bits {bits:#05b}");
        }
    }

    #[test]
    fn power_on_always_raises_system_bit() {
        for bits in 0..8 {
            let mut c = control(bits);
            let _ = c.decide_power_on();
            assert_ne!(c.state().bits() & SYSTEM, 0, "bits {bits:#05b}");
        }
    }

    #[test]
    fn power_off_executes_only_when_powered_and_unlocked() {
        for bits in 0..8 {
            let mut c = control(bits);
            let expected = if bits & POWER != 0 && bits & LOCK == 0 {
                PowerDecision::Execute
            } else {
                PowerDecision::Skip
            };
            assert_eq!(c.decide_power_off(), expected, "bits {bits:#05b}");
        }
    }

    #[test]
    fn power_off_always_clears_system_bit() {
        for bits in 0..8 {
            let mut c = control(bits);
            let _ = c.decide_power_off();
            assert_eq!(c.state().bits() & SYSTEM, 0, "bits {bits:#05b}");
        }
    }

    #[test]
    fn decision_is_stored_until_next_decide() {
        let mut c = control(0);
        assert_eq!(c.decide_power_on(), PowerDecision::Execute);
        assert_eq!(c.decision(), PowerDecision::Execute);
        c.mark_power_on();
        assert_eq!(c.decision(), PowerDecision::Execute);
        assert_eq!(c.decide_power_on(), PowerDecision::Skip);
        assert_eq!(c.decision(), PowerDecision::Skip);
    }

    #[test]
    fn mark_power_flips_only_the_power_bit() {
        let mut c = control(LOCK | SYSTEM);
        c.mark_power_on();
        assert_eq!(c.state().bits(), LOCK | SYSTEM | POWER);
        c.mark_power_off();
        assert_eq!(c.state().bits(), LOCK | SYSTEM);
    }

    #[test]
    fn lock_round_trip() {
        let mut c = control(POWER);
        c.set_lock(true);
        assert!(is_power_locked(c.state().bits()));
        c.set_lock(false);
        assert!(!is_power_locked(c.state().bits()));
    }

    #[test]
    fn predicates_are_pure_over_every_bitmask() {
        for bits in 0..=u8::MAX {
            assert_eq!(is_power_on(bits), bits & POWER != 0);
            assert_eq!(is_power_locked(bits), bits & LOCK != 0);
        }
    }
}
