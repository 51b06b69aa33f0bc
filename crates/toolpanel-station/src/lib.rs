//! Tool-checkout station orchestration.
//!
//! This crate wires the sensing loop, the keypad entry sessions and the
//! authorization client into a running station:
//!
//! - [`config`]: TOML configuration with defaults for every field.
//! - [`dispatcher`]: reports resolved sessions and plays timeout feedback.
//! - [`station`]: spawns the sensing and consumer tasks and shuts them down.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod station;

pub use config::StationConfig;
pub use dispatcher::{DispatchReport, RequestDispatcher};
pub use error::{Result, StationError};
pub use station::{
    REPORT_QUEUE_CAPACITY, ShutdownSummary, Station, StationHandle, StationStatus,
};
