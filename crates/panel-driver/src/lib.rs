//! In-cell DSI panel power sequencing and short-circuit detection.
//!
//! This crate drives the ordered bring-up/bring-down of a MIPI DSI panel whose
//! touch sensor is integrated into the display stack ("in-cell"): the display
//! and touch controller share power rails and reset timing, so every power
//! transition must be coordinated with the shared in-cell state before any
//! hardware is touched.
//!
//! # Components
//!
//! - [`incell`] — the combined touch/display power, lock and system state, and
//!   the per-transition execute/skip decision derived from it
//! - [`rails`] — the named regulator set (vddio, vci, ts_io, ts_vddh) with
//!   configured load, voltage and settle delays
//! - [`sequencer`] — the four-phase power sequencer
//!   (`pre_power_on` → `power_on`, `power_off` → `post_power_off`) with
//!   rollback on partial power-on failure
//! - [`short`] — the interrupt-driven short-circuit watchdog: chatter-filters
//!   the display-error flag line and escalates to an unconditional platform
//!   shutdown once the fault is confirmed
//!
//! Hardware access goes exclusively through the [`panel_hal`] traits, so the
//! whole state machine runs unmodified under the mock implementations in
//! tests.
//!
//! # Concurrency model
//!
//! All hardware-touching work happens in async (process-like) context; settle
//! delays are `embassy_time::Timer` awaits. The only code intended for
//! interrupt context is [`short::ShortDetectState::handle_irq`], which does
//! nothing beyond atomic flag checks and signalling the worker. The shared
//! in-cell singleton lives behind an `embassy_sync` mutex; the original's
//! unsynchronized global mutation is deliberately not reproduced.

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(unused_must_use)]
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]

// This must go FIRST so that the logging macros are visible everywhere.
mod fmt;

pub mod config;
pub mod error;
pub mod incell;
pub mod rails;
pub mod sequencer;
pub mod short;

pub use config::{PanelConfig, Rail, RegulatorConfig, ResetSequence, ResetStep, ShortDetectConfig};
pub use error::PowerError;
pub use incell::{is_power_locked, is_power_on, IncellControl, IncellState, PowerDecision};
pub use rails::{PowerRails, RailSupply};
pub use sequencer::{DisplayState, IncellMutex, PowerSequencer};
pub use short::{CheckOutcome, ShortDetect, ShortDetectState};

/// Sleep for a configured settle delay. Zero means "no delay configured" and
/// is skipped without touching the timer queue.
pub(crate) async fn settle(ms: u32) {
    if ms != 0 {
        embassy_time::Timer::after_millis(u64::from(ms)).await;
    }
}
