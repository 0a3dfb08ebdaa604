//! Panel configuration model.
//!
//! Everything here is parsed once at probe time by the platform glue (from
//! firmware tables, device tree, or board constants) and is immutable
//! afterwards. All delays are in milliseconds; a zero delay means the step has
//! no configured wait and is skipped.

use embedded_hal::digital::PinState;

/// Named power rails of the panel, in bring-up order.
///
/// The enable order on power-on is fixed: `Vddio` → `Vci` → `TsIo` →
/// `TsVddh`. It models the rail dependency ordering of the physical panel and
/// must not be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rail {
    /// Panel I/O rail.
    Vddio,
    /// Panel analog supply.
    Vci,
    /// Touch controller I/O rail.
    TsIo,
    /// Touch controller high-voltage rail.
    TsVddh,
}

impl Rail {
    /// Rail name as used in logs and configuration sources.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Vddio => "vddio",
            Self::Vci => "vci",
            Self::TsIo => "ts_io",
            Self::TsVddh => "ts_vddh",
        }
    }

    /// Bring-down order used by [`crate::PowerRails::force_all_off`] and the
    /// post-power-off phase: touch rails first, then vddio, then vci.
    pub const SHUTDOWN_ORDER: [Self; 4] = [Self::TsVddh, Self::TsIo, Self::Vddio, Self::Vci];
}

impl core::fmt::Display for Rail {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Electrical settings and settle delays for one rail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegulatorConfig {
    /// Lower voltage bound in microvolts.
    pub min_uv: u32,
    /// Upper voltage bound in microvolts.
    pub max_uv: u32,
    /// Load current while enabled, microamps.
    pub enable_load_ua: u32,
    /// Load current while disabled, microamps.
    pub disable_load_ua: u32,
    /// Delay before enabling, ms.
    pub pre_on_ms: u32,
    /// Delay after enabling, ms.
    pub post_on_ms: u32,
    /// Delay before disabling, ms.
    pub pre_off_ms: u32,
    /// Delay after disabling, ms.
    pub post_off_ms: u32,
}

/// One step of a reset sequence: drive the line to `level`, hold `hold_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetStep {
    /// Logical level to drive.
    pub level: PinState,
    /// Hold time after driving, ms.
    pub hold_ms: u32,
}

impl ResetStep {
    /// Drive high, hold `hold_ms`.
    #[must_use]
    pub const fn high(hold_ms: u32) -> Self {
        Self { level: PinState::High, hold_ms }
    }

    /// Drive low, hold `hold_ms`.
    #[must_use]
    pub const fn low(hold_ms: u32) -> Self {
        Self { level: PinState::Low, hold_ms }
    }
}

/// An ordered list of reset steps for one line.
pub type ResetSequence = heapless::Vec<ResetStep, 8>;

/// The panel's specific timing and reset configuration.
#[derive(Debug, Clone, Default)]
pub struct PanelConfig {
    /// Panel reset sequence for power-on.
    pub on_seq: ResetSequence,
    /// Panel reset sequence for power-off.
    pub off_seq: ResetSequence,
    /// Touch controller reset sequence.
    pub touch_seq: ResetSequence,
    /// LP11 settle delay after the rails come up, before pin mux, ms.
    pub lp11_on_ms: u32,
    /// LP11 settle delay before the panel-off reset sequence, ms.
    pub lp11_off_ms: u32,
    /// Delay between pin mux and the panel on-reset sequence, ms.
    pub panel_reset_on_ms: u32,
    /// Settle delay between disabling ts_vddh and ts_io, ms.
    pub touch_vddh_off_ms: u32,
    /// Power-down settle period after all rails are off, ms.
    pub down_period_ms: u32,
    /// Low-hold time of a touch reset pulse, ms.
    pub touch_reset_off_ms: u32,
}

/// Chatter counter value installed when a fault interrupt opens an episode.
/// The first deferred poll increments from here.
pub const CHATTER_COUNT_START: u32 = 1;

/// Short-circuit watchdog tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ShortDetectConfig {
    /// Spacing between consecutive fault-line polls, ms.
    pub check_interval_ms: u64,
    /// Chatter count at which the fault is trusted and shutdown begins.
    pub chatter_threshold: u32,
    /// Sleep between platform power-off retries during escalation, ms.
    pub power_off_retry_ms: u64,
}

impl Default for ShortDetectConfig {
    fn default() -> Self {
        Self {
            check_interval_ms: 500,
            chatter_threshold: 3,
            power_off_retry_ms: 100,
        }
    }
}
