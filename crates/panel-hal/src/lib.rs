//! Hardware abstraction layer for the in-cell DSI panel driver.
//!
//! This crate defines the collaborator contracts the panel power sequencer and
//! the short-circuit watchdog depend on, enabling development and testing
//! without physical hardware:
//!
//! - [`RegulatorRail`] — a named power rail (enable/disable, load, voltage)
//! - [`PinControl`] — named pin-multiplexing state selection
//! - [`BlankNotifier`] — synchronous blank/unblank broadcast to observers
//! - [`FaultInput`] — the display-error flag line with IRQ masking
//! - [`SystemPower`] — the platform power-off primitive
//!
//! Plain reset and backlight lines are expressed through
//! `embedded_hal::digital::OutputPin` rather than a crate-local trait.
//!
//! # Features
//!
//! - `std`: expose the [`mocks`] module to downstream test suites
//! - `defmt`: enable defmt::Format derives on all public types

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
#![allow(clippy::must_use_candidate)] // hardware accessors — callers decide
#![allow(clippy::module_name_repetitions)]

#[cfg(all(feature = "std", not(test)))]
extern crate std;

pub mod fault;
pub mod notifier;
pub mod pinctrl;
pub mod regulator;
pub mod system;

#[cfg(any(test, feature = "std"))]
pub mod mocks;

pub use fault::FaultInput;
pub use notifier::{BlankEvent, BlankNotifier, BlankPhase};
pub use pinctrl::{PinControl, PinFunction};
pub use regulator::RegulatorRail;
pub use system::SystemPower;
