//! Short-circuit detection watchdog.
//!
//! The display-error flag line asserts when the panel's supply detects an
//! over-current/short condition. The line is noisy around real faults, so one
//! edge is never trusted: a fault interrupt opens a *chatter episode* in which
//! the deferred worker re-polls the line at a fixed interval. Only when the
//! fault stays asserted across the configured number of consecutive polls is
//! the hardware considered failed, and the watchdog escalates to a platform
//! shutdown it retries forever — by design, an unsafe panel never returns to
//! service.
//!
//! Split per execution context:
//!
//! - [`ShortDetectState`] is the interrupt-side half. [`handle_irq`] does the
//!   minimum legal in interrupt context: atomic checks and a signal to the
//!   worker. Duplicate interrupts during an active check are dropped without
//!   touching the chatter counter.
//! - [`ShortDetect`] is the worker half. It owns the fault input and the
//!   shutdown capability; all line reads, IRQ masking and the escalation loop
//!   run here in process-like context.
//!
//! [`handle_irq`]: ShortDetectState::handle_irq

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::Timer;
use panel_hal::{FaultInput, SystemPower};

use crate::config::{ShortDetectConfig, CHATTER_COUNT_START};
use crate::sequencer::DisplayState;

/// Outcome of one deferred fault-line poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CheckOutcome {
    /// Display is off; the fault is stale and the episode ends.
    Stale,
    /// Another check is already in flight; this invocation did nothing.
    Busy,
    /// Fault still asserted below threshold; poll again after the interval.
    Recheck,
    /// Fault deasserted; counter reset, IRQ re-armed, back to idle.
    Recovered,
    /// Fault confirmed at threshold; escalate to platform shutdown.
    ShortConfirmed,
}

/// Interrupt-safe shared half of the watchdog.
pub struct ShortDetectState {
    checking: AtomicBool,
    chatter: AtomicU32,
    trigger: Signal<CriticalSectionRawMutex, ()>,
}

impl ShortDetectState {
    /// Idle state, nothing scheduled.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            checking: AtomicBool::new(false),
            chatter: AtomicU32::new(0),
            trigger: Signal::new(),
        }
    }

    /// Interrupt handler for the fault line.
    ///
    /// The caller reads the line level in its own interrupt entry and passes
    /// it here. Deasserted reads are spurious edges and ignored. While a
    /// check is in flight the interrupt is a no-op — the counter is not reset
    /// and no additional check is scheduled. Otherwise the chatter counter is
    /// seeded and the worker is signalled.
    ///
    /// Returns `true` if a check episode was scheduled.
    pub fn handle_irq(&self, fault_asserted: bool) -> bool {
        if !fault_asserted {
            return false;
        }
        error!("display error flag interrupt");

        if self.checking.load(Ordering::SeqCst) {
            debug!("already being check work");
            return false;
        }

        self.chatter.store(CHATTER_COUNT_START, Ordering::SeqCst);
        self.trigger.signal(());
        true
    }

    /// Whether a check is currently in flight (terminal once a short is
    /// confirmed).
    #[must_use]
    pub fn is_checking(&self) -> bool {
        self.checking.load(Ordering::SeqCst)
    }

    /// Current chatter counter value.
    #[must_use]
    pub fn chatter_count(&self) -> u32 {
        self.chatter.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.checking.store(false, Ordering::SeqCst);
        self.chatter.store(0, Ordering::SeqCst);
        self.trigger.reset();
    }
}

impl Default for ShortDetectState {
    fn default() -> Self {
        Self::new()
    }
}

/// Worker half of the watchdog.
pub struct ShortDetect<'a, F, S>
where
    F: FaultInput,
    S: SystemPower,
{
    state: &'a ShortDetectState,
    display: &'a DisplayState,
    fault: F,
    system: S,
    config: ShortDetectConfig,
    irq_enabled: bool,
}

impl<'a, F, S> ShortDetect<'a, F, S>
where
    F: FaultInput,
    S: SystemPower,
{
    /// Build the worker around the shared state and display flag.
    pub fn new(
        state: &'a ShortDetectState,
        display: &'a DisplayState,
        fault: F,
        system: S,
        config: ShortDetectConfig,
    ) -> Self {
        Self {
            state,
            display,
            fault,
            system,
            config,
            irq_enabled: false,
        }
    }

    /// Initialize detection at probe time.
    ///
    /// Counters are zeroed and the IRQ starts masked; it is unmasked when the
    /// display is already enabled (boot display). If the fault line is
    /// already asserted — an error flagged before the driver loaded — a check
    /// episode starts immediately instead of waiting for an edge.
    pub fn arm(&mut self, display_enabled: bool) {
        self.state.reset();
        self.disarm();

        if display_enabled {
            self.enable(false);
        }

        match self.fault.is_asserted() {
            Ok(true) => {
                error!("error flag already asserted at init");
                self.state
                    .chatter
                    .store(CHATTER_COUNT_START, Ordering::SeqCst);
                self.state.trigger.signal(());
            }
            Ok(false) => {}
            Err(e) => {
                warn!("fault line read failed at init, detection left idle");
                let _ = e;
            }
        }
    }

    /// Unmask the fault interrupt. Refused while a check is in flight unless
    /// requested by the worker itself (`inwork`); idempotent when already
    /// unmasked.
    pub fn enable(&mut self, inwork: bool) {
        if self.state.is_checking() && !inwork {
            debug!("check worker is already being processed");
            return;
        }
        if self.irq_enabled {
            return;
        }
        self.irq_enabled = true;
        self.fault.enable_irq();
    }

    /// Mask the fault interrupt.
    pub fn disarm(&mut self) {
        self.fault.disable_irq();
        self.irq_enabled = false;
    }

    /// Run the watchdog. Waits for the interrupt-side trigger, then polls the
    /// line at the configured interval until the fault either clears or is
    /// confirmed. Never returns; on confirmation it enters the shutdown
    /// retry loop.
    pub async fn run(&mut self) -> ! {
        loop {
            self.state.trigger.wait().await;
            self.check_episode().await;
        }
    }

    /// One chatter episode: poll, and keep polling while the fault persists
    /// below threshold.
    async fn check_episode(&mut self) {
        loop {
            Timer::after_millis(self.config.check_interval_ms).await;
            match self.check_once() {
                CheckOutcome::Recheck => {}
                CheckOutcome::ShortConfirmed => self.shutdown_loop().await,
                CheckOutcome::Stale | CheckOutcome::Busy | CheckOutcome::Recovered => return,
            }
        }
    }

    /// One deferred poll of the fault line; the complete, non-blocking unit
    /// of work the episode loop schedules repeatedly.
    ///
    /// On the first poll of an episode the IRQ is masked so hardware pulses
    /// during the check window cannot re-enter the handler. A confirmed short
    /// leaves the checking flag set — the state machine never returns to
    /// idle from there.
    pub fn check_once(&mut self) -> CheckOutcome {
        if !self.display.is_on() {
            warn!("display is off, ignoring stale fault");
            return CheckOutcome::Stale;
        }

        if self.state.checking.swap(true, Ordering::SeqCst) {
            debug!("already status checked");
            return CheckOutcome::Busy;
        }

        if self.state.chatter_count() == CHATTER_COUNT_START {
            self.disarm();
        }

        let asserted = match self.fault.is_asserted() {
            Ok(level) => level,
            Err(e) => {
                warn!("fault line read failed, treating as clear");
                let _ = e;
                false
            }
        };

        if asserted {
            let count = self
                .state
                .chatter
                .fetch_add(1, Ordering::SeqCst)
                .wrapping_add(1);
            error!("short detection [{}]", count);

            if count >= self.config.chatter_threshold {
                error!("short confirmed, executing shutdown");
                return CheckOutcome::ShortConfirmed;
            }

            self.state.checking.store(false, Ordering::SeqCst);
            CheckOutcome::Recheck
        } else {
            self.enable(true);
            self.state.chatter.store(0, Ordering::SeqCst);
            self.state.checking.store(false, Ordering::SeqCst);
            debug!("short check worker done");
            CheckOutcome::Recovered
        }
    }

    /// The deliberate fail-safe terminal action: request platform power-off
    /// and, if the call returns, retry after a fixed sleep, forever. If the
    /// platform does not halt immediately we keep asking rather than return
    /// the panel to an unsafe state.
    async fn shutdown_loop(&mut self) -> ! {
        loop {
            self.system.power_off();
            Timer::after_millis(self.config.power_off_retry_ms).await;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use panel_hal::mocks::{EventLog, HwEvent, MockFaultInput, MockSystemPower};

    fn fast_config() -> ShortDetectConfig {
        ShortDetectConfig {
            check_interval_ms: 1,
            chatter_threshold: 3,
            power_off_retry_ms: 1,
        }
    }

    #[test]
    fn irq_on_deasserted_line_is_spurious() {
        let state = ShortDetectState::new();
        assert!(!state.handle_irq(false));
        assert_eq!(state.chatter_count(), 0);
    }

    #[test]
    fn irq_seeds_chatter_and_schedules() {
        let state = ShortDetectState::new();
        assert!(state.handle_irq(true));
        assert_eq!(state.chatter_count(), CHATTER_COUNT_START);
        assert!(state.trigger.signaled());
    }

    #[test]
    fn duplicate_irq_while_checking_is_dropped() {
        let state = ShortDetectState::new();
        state.checking.store(true, Ordering::SeqCst);
        state.chatter.store(2, Ordering::SeqCst);

        assert!(!state.handle_irq(true));
        // Counter untouched, nothing scheduled.
        assert_eq!(state.chatter_count(), 2);
        assert!(!state.trigger.signaled());
    }

    #[test]
    fn stale_fault_aborts_when_display_is_off() {
        let log = EventLog::new();
        let state = ShortDetectState::new();
        let display = DisplayState::new();
        let (fault, level) = MockFaultInput::new(&log);
        let (system, _) = MockSystemPower::new(&log);
        let mut det = ShortDetect::new(&state, &display, fault, system, fast_config());

        level.store(true, Ordering::SeqCst);
        state.handle_irq(true);

        assert_eq!(det.check_once(), CheckOutcome::Stale);
        assert!(!state.is_checking());
    }

    #[test]
    fn first_poll_masks_irq_and_recovery_unmasks() {
        let log = EventLog::new();
        let state = ShortDetectState::new();
        let display = DisplayState::new();
        display.set_on(true);
        let (fault, level) = MockFaultInput::new(&log);
        let (system, _) = MockSystemPower::new(&log);
        let mut det = ShortDetect::new(&state, &display, fault, system, fast_config());
        det.enable(false);
        log.clear();

        level.store(true, Ordering::SeqCst);
        state.handle_irq(true);
        assert_eq!(det.check_once(), CheckOutcome::Recheck);
        assert_eq!(log.events(), vec![HwEvent::IrqDisable]);

        log.clear();
        level.store(false, Ordering::SeqCst);
        assert_eq!(det.check_once(), CheckOutcome::Recovered);
        assert_eq!(log.events(), vec![HwEvent::IrqEnable]);
        assert_eq!(state.chatter_count(), 0);
        assert!(!state.is_checking());
    }

    #[test]
    fn threshold_polls_confirm_the_short() {
        let log = EventLog::new();
        let state = ShortDetectState::new();
        let display = DisplayState::new();
        display.set_on(true);
        let (fault, level) = MockFaultInput::new(&log);
        let (system, _) = MockSystemPower::new(&log);
        let mut det = ShortDetect::new(&state, &display, fault, system, fast_config());

        level.store(true, Ordering::SeqCst);
        state.handle_irq(true);

        // threshold = 3: counter goes 1 → 2 (recheck) → 3 (confirmed).
        assert_eq!(det.check_once(), CheckOutcome::Recheck);
        assert_eq!(det.check_once(), CheckOutcome::ShortConfirmed);
        // Terminal: checking never clears.
        assert!(state.is_checking());
    }

    #[test]
    fn read_errors_are_treated_as_clear() {
        let log = EventLog::new();
        let state = ShortDetectState::new();
        let display = DisplayState::new();
        display.set_on(true);
        let (mut fault, _level) = MockFaultInput::new(&log);
        fault.fail_read = true;
        let (system, _) = MockSystemPower::new(&log);
        let mut det = ShortDetect::new(&state, &display, fault, system, fast_config());

        state.handle_irq(true);
        assert_eq!(det.check_once(), CheckOutcome::Recovered);
    }

    #[test]
    fn arm_with_boot_fault_schedules_an_episode() {
        let log = EventLog::new();
        let state = ShortDetectState::new();
        let display = DisplayState::new();
        let (fault, level) = MockFaultInput::new(&log);
        level.store(true, Ordering::SeqCst);
        let (system, _) = MockSystemPower::new(&log);
        let mut det = ShortDetect::new(&state, &display, fault, system, fast_config());

        det.arm(true);

        assert_eq!(state.chatter_count(), CHATTER_COUNT_START);
        assert!(state.trigger.signaled());
        // Masked at init, then unmasked for the enabled boot display.
        assert_eq!(log.events(), vec![HwEvent::IrqDisable, HwEvent::IrqEnable]);
    }

    #[test]
    fn enable_refused_while_checking_unless_inwork() {
        let log = EventLog::new();
        let state = ShortDetectState::new();
        let display = DisplayState::new();
        let (fault, _level) = MockFaultInput::new(&log);
        let (system, _) = MockSystemPower::new(&log);
        let mut det = ShortDetect::new(&state, &display, fault, system, fast_config());

        state.checking.store(true, Ordering::SeqCst);
        det.enable(false);
        assert!(log.events().is_empty());

        det.enable(true);
        assert_eq!(log.events(), vec![HwEvent::IrqEnable]);
    }
}
