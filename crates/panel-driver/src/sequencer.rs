//! The four-phase panel power sequencer.
//!
//! Bring-up runs `pre_power_on` then `power_on`; bring-down runs `power_off`
//! then `post_power_off`. Each pair resolves the in-cell decision once, in its
//! first phase, and the second phase reads the stored decision. Phases execute
//! their steps strictly in order; no step begins until the previous one has
//! resolved (success or logged failure).
//!
//! Failure policy: any power-on failure triggers an explicit rollback
//! (backlight deasserted, pin control reverted to suspend, all rails forced
//! off) and propagates to the caller. The power-off path never aborts —
//! hardware is being powered down regardless, so partial failures are logged
//! and the teardown continues to completion.
//!
//! Callers must not invoke the `power_*` entry points concurrently with each
//! other or with the mode-flag setters; the external interface serializes
//! them behind its display-level lock.

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embedded_hal::digital::OutputPin;
use panel_hal::{BlankEvent, BlankNotifier, BlankPhase, PinControl, PinFunction, RegulatorRail};

use crate::config::{PanelConfig, Rail, ResetSequence};
use crate::error::PowerError;
use crate::incell::{IncellControl, PowerDecision};
use crate::rails::PowerRails;
use crate::settle;

/// The shared in-cell singleton, guarded per the crate's concurrency model.
pub type IncellMutex = Mutex<CriticalSectionRawMutex, IncellControl>;

/// Shared display on/off flag.
///
/// Set by the sequencer when the display pipeline finishes enabling and
/// cleared when it starts disabling; read by the short-circuit watchdog to
/// discard stale faults. Distinct from the in-cell power bit: the panel can be
/// powered while the pipeline is still down.
#[derive(Debug, Default)]
pub struct DisplayState {
    on: AtomicBool,
}

impl DisplayState {
    /// Display initially off.
    #[must_use]
    pub const fn new() -> Self {
        Self { on: AtomicBool::new(false) }
    }

    /// Whether the display pipeline is up.
    #[must_use]
    pub fn is_on(&self) -> bool {
        self.on.load(Ordering::SeqCst)
    }

    /// Record the display pipeline state. Normally driven through
    /// [`PowerSequencer::set_display_enabled`]; exposed for platform glue
    /// that learns the boot-display state before the sequencer exists.
    pub fn set_on(&self, on: bool) {
        self.on.store(on, Ordering::SeqCst);
    }
}

/// Orchestrates rails, resets, pin control and blank notifications through
/// the four power phases.
pub struct PowerSequencer<'a, R, P, O, N>
where
    R: RegulatorRail,
    P: PinControl,
    O: OutputPin,
    N: BlankNotifier,
{
    rails: PowerRails<R>,
    pinctrl: P,
    panel_reset: O,
    touch_reset: O,
    backlight_en: Option<O>,
    notifier: N,
    config: PanelConfig,
    incell: &'a IncellMutex,
    display: &'a DisplayState,
    aod_mode: bool,
    opec_mode: bool,
    pre_sod_mode: bool,
}

impl<'a, R, P, O, N> PowerSequencer<'a, R, P, O, N>
where
    R: RegulatorRail,
    P: PinControl,
    O: OutputPin,
    N: BlankNotifier,
{
    /// Assemble the sequencer. `backlight_en` is optional; boards without a
    /// dedicated backlight-enable line pass `None` and rollback skips it.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        rails: PowerRails<R>,
        pinctrl: P,
        panel_reset: O,
        touch_reset: O,
        backlight_en: Option<O>,
        notifier: N,
        config: PanelConfig,
        incell: &'a IncellMutex,
        display: &'a DisplayState,
    ) -> Self {
        Self {
            rails,
            pinctrl,
            panel_reset,
            touch_reset,
            backlight_en,
            notifier,
            config,
            incell,
            display,
            aod_mode: false,
            opec_mode: false,
            pre_sod_mode: false,
        }
    }

    /// Phase 1 of bring-up: resolve the in-cell decision, notify observers
    /// that an unblank is coming, and bring the rails up in fixed order.
    ///
    /// Under `Skip` the notification still fires but no hardware is touched.
    /// The touch rails are enabled only if not already on (the touch side may
    /// have kept them up), then the LP11 settle delay elapses and the touch
    /// pin state goes active (non-fatal on failure).
    pub async fn pre_power_on(&mut self) -> Result<(), PowerError> {
        let decision = self.incell.lock().await.decide_power_on();
        if decision == PowerDecision::Skip {
            debug!("pre power on skip");
            self.notifier.notify(BlankPhase::BeforeBlank, BlankEvent::Unblank);
            return Ok(());
        }

        self.notifier.notify(BlankPhase::BeforeBlank, BlankEvent::Unblank);

        if let Err(e) = self.enable_power_rails().await {
            self.rollback_power_on().await;
            return Err(e);
        }

        settle(self.config.lp11_on_ms).await;

        if self.pinctrl.select(PinFunction::TouchActive).is_err() {
            warn!("can not set touch active pins");
        }

        Ok(())
    }

    /// Phase 2 of bring-up: touch reset, pin mux, panel reset.
    ///
    /// Reads the decision stored by [`Self::pre_power_on`]; a `Skip` returns
    /// success without hardware calls. Any failure rolls back to a fully
    /// unpowered state before propagating.
    pub async fn power_on(&mut self) -> Result<(), PowerError> {
        if self.incell.lock().await.decision() == PowerDecision::Skip {
            debug!("power on skip");
            return Ok(());
        }

        if run_sequence(&mut self.touch_reset, &self.config.touch_seq)
            .await
            .is_err()
        {
            error!("failed to reset touch panel");
            self.rollback_power_on().await;
            return Err(PowerError::TouchReset);
        }

        if self.pinctrl.select(PinFunction::PanelActive).is_err() {
            error!("failed to set pinctrl");
            self.rollback_power_on().await;
            return Err(PowerError::PinControl);
        }

        settle(self.config.panel_reset_on_ms).await;

        if run_sequence(&mut self.panel_reset, &self.config.on_seq)
            .await
            .is_err()
        {
            error!("failed to reset panel");
            self.rollback_power_on().await;
            return Err(PowerError::PanelReset);
        }

        debug!("panel power on");
        self.incell.lock().await.mark_power_on();
        Ok(())
    }

    /// Phase 1 of bring-down: resolve the decision, clear the software mode
    /// flags, run the panel-off reset sequence and deassert the touch reset.
    ///
    /// Nothing on this path aborts: reset failures are logged and the
    /// teardown continues. When the `pre_sod` override is set the touch reset
    /// line is left alone (touch stays alive into smart-on-display).
    pub async fn power_off(&mut self) -> Result<(), PowerError> {
        let decision = self.incell.lock().await.decide_power_off();
        if decision == PowerDecision::Skip {
            debug!("power off skip");
            return Ok(());
        }

        self.aod_mode = false;
        self.opec_mode = false;

        settle(self.config.lp11_off_ms).await;

        if run_sequence(&mut self.panel_reset, &self.config.off_seq)
            .await
            .is_err()
        {
            error!("panel reset failed");
        }

        if !self.pre_sod_mode && self.touch_reset.set_low().is_err() {
            error!("touch reset deassert failed");
        }

        Ok(())
    }

    /// Phase 2 of bring-down: drop the touch rails (unless `pre_sod`), then
    /// vddio and vci unconditionally, settle, park the pins, clear the power
    /// bit — and only then tell observers the panel is off.
    ///
    /// The AfterBlank notification fires even under `Skip`: downstream
    /// consumers must always learn of the blank, whether or not hardware
    /// actions were suppressed.
    pub async fn post_power_off(&mut self) -> Result<(), PowerError> {
        if self.incell.lock().await.decision() == PowerDecision::Skip {
            debug!("post power off skip");
            self.notifier.notify(BlankPhase::AfterBlank, BlankEvent::PowerDown);
            return Ok(());
        }

        if !self.pre_sod_mode {
            if self.pinctrl.select(PinFunction::TouchSuspend).is_err() {
                warn!("can not set touch suspend pins");
            }

            self.rails.disable(Rail::TsVddh).await;
            settle(self.config.touch_vddh_off_ms).await;
            self.rails.disable(Rail::TsIo).await;
        }

        self.rails.disable(Rail::Vddio).await;
        self.rails.disable(Rail::Vci).await;

        settle(self.config.down_period_ms).await;

        if self.pinctrl.select(PinFunction::PanelSuspend).is_err() {
            warn!("failed to set suspend pinctrl state");
        }

        debug!("panel power off");
        self.incell.lock().await.mark_power_off();
        self.notifier.notify(BlankPhase::AfterBlank, BlankEvent::PowerDown);
        Ok(())
    }

    /// Pulse the touch controller reset: low, hold the configured time, high.
    pub async fn touch_reset_pulse(&mut self) -> Result<(), PowerError> {
        self.touch_reset
            .set_low()
            .map_err(|_| PowerError::TouchReset)?;
        settle(self.config.touch_reset_off_ms).await;
        self.touch_reset
            .set_high()
            .map_err(|_| PowerError::TouchReset)
    }

    /// Record that the display pipeline finished enabling or started
    /// disabling. Gates the short-circuit watchdog's stale-fault filter.
    pub fn set_display_enabled(&mut self, enabled: bool) {
        self.display.set_on(enabled);
    }

    /// Always-on-display mode flag.
    #[must_use]
    pub fn aod_mode(&self) -> bool {
        self.aod_mode
    }

    /// Set the always-on-display mode flag.
    pub fn set_aod_mode(&mut self, on: bool) {
        self.aod_mode = on;
    }

    /// Power-saving compensation (OPEC) mode flag.
    #[must_use]
    pub fn opec_mode(&self) -> bool {
        self.opec_mode
    }

    /// Set the OPEC mode flag.
    pub fn set_opec_mode(&mut self, on: bool) {
        self.opec_mode = on;
    }

    /// Pre-smart-on-display override flag.
    #[must_use]
    pub fn pre_sod_mode(&self) -> bool {
        self.pre_sod_mode
    }

    /// Set the pre-smart-on-display override. While set, power-off leaves the
    /// touch reset line and touch rails untouched.
    pub fn set_pre_sod_mode(&mut self, on: bool) {
        self.pre_sod_mode = on;
    }

    /// Fixed-order rail bring-up: vddio → vci, then the touch rails only if
    /// they are not already on.
    async fn enable_power_rails(&mut self) -> Result<(), PowerError> {
        self.rails.enable(Rail::Vddio).await?;
        self.rails.enable(Rail::Vci).await?;

        if !self.rails.is_enabled(Rail::TsIo) {
            self.rails.enable(Rail::TsIo).await?;
        }
        if !self.rails.is_enabled(Rail::TsVddh) {
            self.rails.enable(Rail::TsVddh).await?;
        }
        Ok(())
    }

    /// Explicit cleanup after a failed power-on attempt: backlight off, pins
    /// parked, every rail forced off. Guarantees no half-powered state
    /// survives, whichever step failed. Never invoked on the power-off path.
    async fn rollback_power_on(&mut self) {
        if let Some(backlight) = self.backlight_en.as_mut() {
            if backlight.set_low().is_err() {
                warn!("backlight deassert failed during rollback");
            }
        }

        if self.pinctrl.select(PinFunction::PanelSuspend).is_err() {
            warn!("pinctrl revert failed during rollback");
        }

        self.rails.force_all_off().await;
        error!("failed to power on");
    }
}

/// Drive one reset line through an ordered (level, hold) sequence.
async fn run_sequence<O: OutputPin>(pin: &mut O, seq: &ResetSequence) -> Result<(), O::Error> {
    for step in seq {
        pin.set_state(step.level)?;
        settle(step.hold_ms).await;
    }
    Ok(())
}
