//! Blank-state notification chain.
//!
//! Downstream consumers (touch driver, compositor glue) observe panel power
//! transitions through a synchronous, ordered broadcast. The sequencer emits
//! `BeforeBlank(Unblank)` ahead of a power-on and `AfterBlank(PowerDown)`
//! after a power-off; the power-off notification fires even when the physical
//! sequence was skipped.

/// When the notification fires relative to the blank transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BlankPhase {
    /// Before the display blanks/unblanks.
    BeforeBlank,
    /// After the display blanked.
    AfterBlank,
}

/// Payload carried by a blank notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BlankEvent {
    /// Display is coming up.
    Unblank,
    /// Display is going down.
    PowerDown,
}

/// Synchronous observer chain. The call blocks until every registered
/// observer has run; observers cannot fail the chain.
pub trait BlankNotifier {
    /// Broadcast one blank event to all observers.
    fn notify(&mut self, phase: BlankPhase, event: BlankEvent);
}
