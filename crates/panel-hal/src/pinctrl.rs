//! Pin-multiplexing state selection.

/// Named pin-control states the sequencer switches between.
///
/// The panel states mux the DSI lanes; the touch states mux the touch
/// controller's interrupt and reset lines. Selecting a state is advisory to
/// electrical correctness, never essential to safety — failures are logged by
/// the driver and do not abort a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinFunction {
    /// Panel lanes active.
    PanelActive,
    /// Panel lanes parked for power-down.
    PanelSuspend,
    /// Touch controller lines active.
    TouchActive,
    /// Touch controller lines parked.
    TouchSuspend,
}

/// Pin-control state switch.
pub trait PinControl {
    /// Error type reported by the pin-control subsystem.
    type Error: core::fmt::Debug;

    /// Select a named pin state.
    fn select(&mut self, function: PinFunction) -> Result<(), Self::Error>;
}
