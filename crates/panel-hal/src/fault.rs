//! Display-error fault line.

/// The error-flag input pin with edge-interrupt masking.
///
/// The watchdog masks the interrupt for the duration of an active check so a
/// bouncing line cannot re-enter the handler, and unmasks it only once the
/// fault is confirmed resolved. `enable_irq`/`disable_irq` are infallible by
/// contract; masking a level in an interrupt controller does not fail.
pub trait FaultInput {
    /// Error type reported by the GPIO subsystem on reads.
    type Error: core::fmt::Debug;

    /// Read the current line level. `true` means the fault is asserted.
    fn is_asserted(&mut self) -> Result<bool, Self::Error>;

    /// Unmask the fault interrupt.
    fn enable_irq(&mut self);

    /// Mask the fault interrupt.
    fn disable_irq(&mut self);
}
