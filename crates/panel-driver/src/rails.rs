//! The panel's regulator set.
//!
//! Wraps the four named rails with their configured load, voltage window and
//! settle delays. Enable failures propagate; the disable path deliberately
//! ignores subsystem errors — hardware is coming down regardless, and a rail
//! left administratively "enabled" because a disable call failed must not
//! block the rest of the teardown.

use crate::config::{Rail, RegulatorConfig};
use crate::error::PowerError;
use crate::settle;
use panel_hal::RegulatorRail;

/// One configured rail.
pub struct RailSupply<R> {
    /// The regulator handle.
    pub rail: R,
    /// Electrical settings and settle delays.
    pub config: RegulatorConfig,
}

impl<R> RailSupply<R> {
    /// Pair a regulator handle with its configuration.
    pub const fn new(rail: R, config: RegulatorConfig) -> Self {
        Self { rail, config }
    }
}

/// The panel power info: all four rails, indexed by [`Rail`].
pub struct PowerRails<R: RegulatorRail> {
    vddio: RailSupply<R>,
    vci: RailSupply<R>,
    ts_io: RailSupply<R>,
    ts_vddh: RailSupply<R>,
}

impl<R: RegulatorRail> PowerRails<R> {
    /// Assemble the regulator set.
    pub const fn new(
        vddio: RailSupply<R>,
        vci: RailSupply<R>,
        ts_io: RailSupply<R>,
        ts_vddh: RailSupply<R>,
    ) -> Self {
        Self { vddio, vci, ts_io, ts_vddh }
    }

    fn supply_mut(&mut self, id: Rail) -> &mut RailSupply<R> {
        match id {
            Rail::Vddio => &mut self.vddio,
            Rail::Vci => &mut self.vci,
            Rail::TsIo => &mut self.ts_io,
            Rail::TsVddh => &mut self.ts_vddh,
        }
    }

    fn supply(&self, id: Rail) -> &RailSupply<R> {
        match id {
            Rail::Vddio => &self.vddio,
            Rail::Vci => &self.vci,
            Rail::TsIo => &self.ts_io,
            Rail::TsVddh => &self.ts_vddh,
        }
    }

    /// Bring one rail up: pre-on delay, load, voltage (fixed-voltage rails
    /// skip this), enable, post-on delay. The first subsystem failure aborts
    /// and is reported against the rail.
    pub async fn enable(&mut self, id: Rail) -> Result<(), PowerError> {
        let supply = self.supply_mut(id);
        let cfg = supply.config;
        debug!("rail on: {}", id.name());

        settle(cfg.pre_on_ms).await;

        if let Err(e) = supply.rail.set_load(cfg.enable_load_ua) {
            error!("setting load failed for {}", id.name());
            let _ = e;
            return Err(PowerError::RailEnable(id));
        }

        if supply.rail.voltage_count() > 0 {
            if let Err(e) = supply.rail.set_voltage(cfg.min_uv, cfg.max_uv) {
                error!("set voltage({}) failed", id.name());
                let _ = e;
                return Err(PowerError::RailEnable(id));
            }
        }

        if let Err(e) = supply.rail.enable() {
            error!("enable failed for {}", id.name());
            let _ = e;
            return Err(PowerError::RailEnable(id));
        }

        settle(cfg.post_on_ms).await;
        Ok(())
    }

    /// Bring one rail down: pre-off delay, disable load, disable, post-off
    /// delay. Subsystem failures are logged and ignored.
    pub async fn disable(&mut self, id: Rail) {
        let supply = self.supply_mut(id);
        let cfg = supply.config;
        debug!("rail off: {}", id.name());

        settle(cfg.pre_off_ms).await;

        if supply.rail.set_load(cfg.disable_load_ua).is_err() {
            warn!("setting disable load failed for {}", id.name());
        }
        if supply.rail.disable().is_err() {
            warn!("disable failed for {}", id.name());
        }

        settle(cfg.post_off_ms).await;
    }

    /// Whether a rail reports itself enabled. Subsystem read errors are
    /// logged and treated as "not enabled".
    pub fn is_enabled(&self, id: Rail) -> bool {
        match self.supply(id).rail.is_enabled() {
            Ok(enabled) => enabled,
            Err(e) => {
                warn!("is_enabled query failed for {}", id.name());
                let _ = e;
                false
            }
        }
    }

    /// Rollback helper: force every rail off in bring-down order, ignoring
    /// errors. Used only on a failed power-on attempt.
    pub async fn force_all_off(&mut self) {
        for id in Rail::SHUTDOWN_ORDER {
            self.disable(id).await;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use panel_hal::mocks::{EventLog, HwEvent, MockRail};

    fn rails(log: &EventLog) -> PowerRails<MockRail> {
        PowerRails::new(
            RailSupply::new(MockRail::new("vddio", log), RegulatorConfig::default()),
            RailSupply::new(MockRail::new("vci", log), RegulatorConfig::default()),
            RailSupply::new(MockRail::new("ts_io", log), RegulatorConfig::default()),
            RailSupply::new(MockRail::new("ts_vddh", log), RegulatorConfig::default()),
        )
    }

    #[tokio::test]
    async fn enable_sets_load_then_voltage_then_enables() {
        let log = EventLog::new();
        let mut rails = rails(&log);

        rails.enable(Rail::Vddio).await.unwrap();

        assert_eq!(
            log.events(),
            vec![
                HwEvent::RailSetLoad { rail: "vddio", load_ua: 0 },
                HwEvent::RailSetVoltage { rail: "vddio", min_uv: 0, max_uv: 0 },
                HwEvent::RailEnable { rail: "vddio" },
            ]
        );
        assert!(rails.is_enabled(Rail::Vddio));
    }

    #[tokio::test]
    async fn fixed_voltage_rail_skips_set_voltage() {
        let log = EventLog::new();
        let mut rail = MockRail::new("vci", &log);
        rail.voltage_count = 0;
        let mut rails = PowerRails::new(
            RailSupply::new(MockRail::new("vddio", &log), RegulatorConfig::default()),
            RailSupply::new(rail, RegulatorConfig::default()),
            RailSupply::new(MockRail::new("ts_io", &log), RegulatorConfig::default()),
            RailSupply::new(MockRail::new("ts_vddh", &log), RegulatorConfig::default()),
        );

        rails.enable(Rail::Vci).await.unwrap();

        assert!(!log
            .events()
            .iter()
            .any(|e| matches!(e, HwEvent::RailSetVoltage { .. })));
    }

    #[tokio::test]
    async fn enable_failure_is_reported_against_the_rail() {
        let log = EventLog::new();
        let mut rails = rails(&log);
        rails.supply_mut(Rail::TsIo).rail.fail_enable = true;

        assert_eq!(
            rails.enable(Rail::TsIo).await,
            Err(PowerError::RailEnable(Rail::TsIo))
        );
        assert!(!rails.is_enabled(Rail::TsIo));
    }

    #[tokio::test]
    async fn force_all_off_follows_shutdown_order() {
        let log = EventLog::new();
        let mut rails = rails(&log);
        for id in [Rail::Vddio, Rail::Vci, Rail::TsIo, Rail::TsVddh] {
            rails.enable(id).await.unwrap();
        }
        log.clear();

        rails.force_all_off().await;

        let disables: Vec<_> = log
            .events()
            .into_iter()
            .filter_map(|e| match e {
                HwEvent::RailDisable { rail } => Some(rail),
                _ => None,
            })
            .collect();
        assert_eq!(disables, ["ts_vddh", "ts_io", "vddio", "vci"]);
    }
}
