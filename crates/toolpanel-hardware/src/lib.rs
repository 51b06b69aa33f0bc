//! Hardware abstraction layer for the tool-checkout station.
//!
//! This crate provides trait-based abstractions for the station peripherals
//! and the logic that sits directly on top of them:
//!
//! - [`sensor`]: samples the presence sensors and turns readings into
//!   take/return edges.
//! - [`mailbox`]: the single-slot, drop-on-full handoff from the sensing loop
//!   to the consumer loop.
//! - [`keypad`]: scans the 4x3 keypad matrix, at most one key per scan.
//! - [`buzzer`]: plays pulse patterns for audible feedback.
//!
//! # Design Philosophy
//!
//! - **Async-first**: device operations are asynchronous so the sensing and
//!   consumer loops can share one Tokio runtime.
//! - **Spawnable**: device traits return `Send` futures, so loops generic
//!   over them can be handed to `tokio::spawn`.
//! - **Error-aware**: all operations return [`Result<T>`][error::Result] with
//!   a [`HardwareError`] describing the failure.
//!
//! # Example
//!
//! ```no_run
//! use toolpanel_hardware::mailbox;
//! use toolpanel_hardware::mock::MockAnalog;
//! use toolpanel_hardware::sensor::{SensorMonitor, default_sensors};
//!
//! #[tokio::main]
//! async fn main() -> toolpanel_hardware::Result<()> {
//!     let (adc, _handle) = MockAnalog::new();
//!     let (tx, mut rx) = mailbox::channel();
//!
//!     tokio::spawn(SensorMonitor::new(adc, default_sensors(), tx).run());
//!
//!     while let Some(event) = rx.recv().await {
//!         println!("{event}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Mock Implementations
//!
//! The [`mock`] module provides simulated devices driven through handles, for
//! development and testing without physical hardware.

pub mod buzzer;
pub mod error;
pub mod keypad;
pub mod mailbox;
pub mod mock;
pub mod sensor;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use buzzer::PulsePattern;
pub use error::{HardwareError, Result};
pub use keypad::KeypadScanner;
pub use mailbox::{EventReceiver, EventSender, SendOutcome};
pub use sensor::{ChannelMode, SensorChannel, SensorMonitor, default_sensors};
pub use traits::{AnalogInput, Buzzer, Key, KeypadMatrix};
pub use types::{Attenuation, Presence, SensorConfig};
