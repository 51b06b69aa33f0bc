//! Shared domain types for the tool-checkout station.
//!
//! Everything that crosses a crate boundary lives here: tool positions,
//! take/return operation kinds, the [`SensorEvent`] snapshot handed from the
//! sensing loop to the consumer loop, and the timing constants both loops
//! agree on.

pub mod constants;
pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
