//! Power rail abstraction.
//!
//! Each panel rail (vddio, vci, ts_io, ts_vddh) is handed to the driver as one
//! `RegulatorRail` implementation. The driver never talks to a regulator
//! framework directly; it only sequences these calls with the configured
//! settle delays around them.

/// A single named power rail.
pub trait RegulatorRail {
    /// Error type reported by the regulator subsystem.
    type Error: core::fmt::Debug;

    /// Set the expected load current in microamps.
    fn set_load(&mut self, load_ua: u32) -> Result<(), Self::Error>;

    /// Set the output voltage window in microvolts.
    fn set_voltage(&mut self, min_uv: u32, max_uv: u32) -> Result<(), Self::Error>;

    /// Enable the rail.
    fn enable(&mut self) -> Result<(), Self::Error>;

    /// Disable the rail.
    fn disable(&mut self) -> Result<(), Self::Error>;

    /// Query whether the rail is currently enabled.
    fn is_enabled(&self) -> Result<bool, Self::Error>;

    /// Number of selectable voltages. Rails reporting zero are fixed-voltage
    /// and never receive a `set_voltage` call.
    fn voltage_count(&self) -> usize {
        1
    }
}
