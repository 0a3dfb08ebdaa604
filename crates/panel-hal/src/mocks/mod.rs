//! Mock implementations for testing.
//!
//! Every mock records into one shared, ordered [`EventLog`] so tests can
//! assert cross-component ordering (rail bring-up order, notification
//! placement) rather than per-mock call counts alone.

#![cfg(any(test, feature = "std"))]
#![allow(clippy::missing_panics_doc)]

use crate::{BlankEvent, BlankNotifier, BlankPhase, FaultInput, PinControl, PinFunction};
use crate::{RegulatorRail, SystemPower};
use embedded_hal::digital::{ErrorKind, ErrorType, OutputPin, PinState};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::vec::Vec;

/// Error type shared by the fallible mocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockError;

/// One recorded hardware interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HwEvent {
    /// `set_load` on a rail.
    RailSetLoad {
        /// Rail name.
        rail: &'static str,
        /// Requested load in microamps.
        load_ua: u32,
    },
    /// `set_voltage` on a rail.
    RailSetVoltage {
        /// Rail name.
        rail: &'static str,
        /// Lower bound in microvolts.
        min_uv: u32,
        /// Upper bound in microvolts.
        max_uv: u32,
    },
    /// Rail enabled.
    RailEnable {
        /// Rail name.
        rail: &'static str,
    },
    /// Rail disabled.
    RailDisable {
        /// Rail name.
        rail: &'static str,
    },
    /// Pin-control state selected.
    PinSelect(PinFunction),
    /// A GPIO output line driven.
    GpioSet {
        /// Line name.
        pin: &'static str,
        /// `true` = logical high.
        high: bool,
    },
    /// Blank notification broadcast.
    Notify(BlankPhase, BlankEvent),
    /// Fault interrupt unmasked.
    IrqEnable,
    /// Fault interrupt masked.
    IrqDisable,
    /// Platform power-off requested.
    SystemPowerOff,
}

/// Shared, ordered log of hardware interactions.
#[derive(Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<HwEvent>>>,
}

impl EventLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one event.
    pub fn record(&self, event: HwEvent) {
        self.guard().push(event);
    }

    /// Snapshot of all events in arrival order.
    #[must_use]
    pub fn events(&self) -> Vec<HwEvent> {
        self.guard().clone()
    }

    /// Drop all recorded events.
    pub fn clear(&self) {
        self.guard().clear();
    }

    fn guard(&self) -> std::sync::MutexGuard<'_, Vec<HwEvent>> {
        self.events.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Mock power rail with per-operation failure injection.
pub struct MockRail {
    name: &'static str,
    log: EventLog,
    enabled: bool,
    /// When set, the next `enable()` fails.
    pub fail_enable: bool,
    /// Value returned by `voltage_count()`.
    pub voltage_count: usize,
}

impl MockRail {
    /// Create a disabled rail recording into `log`.
    #[must_use]
    pub fn new(name: &'static str, log: &EventLog) -> Self {
        Self {
            name,
            log: log.clone(),
            enabled: false,
            fail_enable: false,
            voltage_count: 1,
        }
    }

    /// Create a rail that is already enabled (for idempotent-enable tests).
    #[must_use]
    pub fn enabled(name: &'static str, log: &EventLog) -> Self {
        let mut rail = Self::new(name, log);
        rail.enabled = true;
        rail
    }
}

impl RegulatorRail for MockRail {
    type Error = MockError;

    fn set_load(&mut self, load_ua: u32) -> Result<(), Self::Error> {
        self.log.record(HwEvent::RailSetLoad { rail: self.name, load_ua });
        Ok(())
    }

    fn set_voltage(&mut self, min_uv: u32, max_uv: u32) -> Result<(), Self::Error> {
        self.log
            .record(HwEvent::RailSetVoltage { rail: self.name, min_uv, max_uv });
        Ok(())
    }

    fn enable(&mut self) -> Result<(), Self::Error> {
        if self.fail_enable {
            return Err(MockError);
        }
        self.enabled = true;
        self.log.record(HwEvent::RailEnable { rail: self.name });
        Ok(())
    }

    fn disable(&mut self) -> Result<(), Self::Error> {
        self.enabled = false;
        self.log.record(HwEvent::RailDisable { rail: self.name });
        Ok(())
    }

    fn is_enabled(&self) -> Result<bool, Self::Error> {
        Ok(self.enabled)
    }

    fn voltage_count(&self) -> usize {
        self.voltage_count
    }
}

/// Mock GPIO output line.
pub struct MockPin {
    name: &'static str,
    log: EventLog,
    /// When set, every write fails.
    pub fail: bool,
}

impl MockPin {
    /// Create a line recording into `log`.
    #[must_use]
    pub fn new(name: &'static str, log: &EventLog) -> Self {
        Self { name, log: log.clone(), fail: false }
    }
}

impl ErrorType for MockPin {
    type Error = ErrorKind;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.set_state(PinState::Low)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.set_state(PinState::High)
    }

    fn set_state(&mut self, state: PinState) -> Result<(), Self::Error> {
        if self.fail {
            return Err(ErrorKind::Other);
        }
        self.log.record(HwEvent::GpioSet {
            pin: self.name,
            high: state == PinState::High,
        });
        Ok(())
    }
}

/// Mock pin-control switch.
pub struct MockPinControl {
    log: EventLog,
    /// When set, every `select` fails.
    pub fail: bool,
}

impl MockPinControl {
    /// Create a switch recording into `log`.
    #[must_use]
    pub fn new(log: &EventLog) -> Self {
        Self { log: log.clone(), fail: false }
    }
}

impl PinControl for MockPinControl {
    type Error = MockError;

    fn select(&mut self, function: PinFunction) -> Result<(), Self::Error> {
        if self.fail {
            return Err(MockError);
        }
        self.log.record(HwEvent::PinSelect(function));
        Ok(())
    }
}

/// Mock blank-notifier chain.
pub struct MockNotifier {
    log: EventLog,
}

impl MockNotifier {
    /// Create a notifier recording into `log`.
    #[must_use]
    pub fn new(log: &EventLog) -> Self {
        Self { log: log.clone() }
    }
}

impl BlankNotifier for MockNotifier {
    fn notify(&mut self, phase: BlankPhase, event: BlankEvent) {
        self.log.record(HwEvent::Notify(phase, event));
    }
}

/// Mock fault line. The level is shared so a test can flip the line while the
/// watchdog owns the input.
pub struct MockFaultInput {
    level: Arc<AtomicBool>,
    log: EventLog,
    /// When set, reads fail.
    pub fail_read: bool,
}

impl MockFaultInput {
    /// Create a deasserted fault line recording into `log`. Returns the input
    /// and a handle to the shared line level.
    #[must_use]
    pub fn new(log: &EventLog) -> (Self, Arc<AtomicBool>) {
        let level = Arc::new(AtomicBool::new(false));
        (
            Self { level: Arc::clone(&level), log: log.clone(), fail_read: false },
            level,
        )
    }
}

impl FaultInput for MockFaultInput {
    type Error = MockError;

    fn is_asserted(&mut self) -> Result<bool, Self::Error> {
        if self.fail_read {
            return Err(MockError);
        }
        Ok(self.level.load(Ordering::SeqCst))
    }

    fn enable_irq(&mut self) {
        self.log.record(HwEvent::IrqEnable);
    }

    fn disable_irq(&mut self) {
        self.log.record(HwEvent::IrqDisable);
    }
}

/// Mock platform power-off with a shared attempt counter.
pub struct MockSystemPower {
    log: EventLog,
    count: Arc<AtomicUsize>,
}

impl MockSystemPower {
    /// Create a power-off sink recording into `log`. Returns the sink and a
    /// handle to the shared attempt counter.
    #[must_use]
    pub fn new(log: &EventLog) -> (Self, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        (Self { log: log.clone(), count: Arc::clone(&count) }, count)
    }
}

impl SystemPower for MockSystemPower {
    fn power_off(&mut self) {
        self.count.fetch_add(1, Ordering::SeqCst);
        self.log.record(HwEvent::SystemPowerOff);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn event_log_preserves_order_across_mocks() {
        let log = EventLog::new();
        let mut rail = MockRail::new("vddio", &log);
        let mut pin = MockPin::new("panel_reset", &log);
        let mut notifier = MockNotifier::new(&log);

        rail.enable().unwrap();
        pin.set_high().unwrap();
        notifier.notify(BlankPhase::AfterBlank, BlankEvent::PowerDown);

        assert_eq!(
            log.events(),
            vec![
                HwEvent::RailEnable { rail: "vddio" },
                HwEvent::GpioSet { pin: "panel_reset", high: true },
                HwEvent::Notify(BlankPhase::AfterBlank, BlankEvent::PowerDown),
            ]
        );
    }

    #[test]
    fn failed_rail_enable_records_nothing() {
        let log = EventLog::new();
        let mut rail = MockRail::new("vci", &log);
        rail.fail_enable = true;

        assert_eq!(rail.enable(), Err(MockError));
        assert!(log.events().is_empty());
        assert_eq!(rail.is_enabled(), Ok(false));
    }

    #[test]
    fn fault_line_level_is_shared() {
        let log = EventLog::new();
        let (mut fault, level) = MockFaultInput::new(&log);

        assert_eq!(fault.is_asserted(), Ok(false));
        level.store(true, Ordering::SeqCst);
        assert_eq!(fault.is_asserted(), Ok(true));
    }
}
