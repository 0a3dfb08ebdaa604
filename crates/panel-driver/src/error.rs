//! Driver error taxonomy.
//!
//! Subsystem error values are logged at the call site and collapsed into
//! these variants; the caller only needs to know which step of the sequence
//! failed, not the subsystem's private error type. Power-on propagates the
//! first failure after rollback; the power-off path logs and continues.

use crate::config::Rail;
use thiserror_no_std::Error;

/// Failure of a power-sequencing step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerError {
    /// A regulator rail could not be brought up.
    #[error("failed to enable {0} rail")]
    RailEnable(Rail),
    /// The touch controller reset sequence failed.
    #[error("touch controller reset failed")]
    TouchReset,
    /// The panel reset sequence failed.
    #[error("panel reset failed")]
    PanelReset,
    /// A pin-control state change failed where it is fatal (power-on path).
    #[error("pin control state change failed")]
    PinControl,
}
