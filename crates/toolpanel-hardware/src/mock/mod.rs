//! Mock device implementations for testing and development.
//!
//! This module provides simulated devices that can be controlled
//! programmatically without requiring physical hardware. Each mock comes with
//! a cloneable handle used to drive it from tests or from the simulator.

pub mod analog;
pub mod buzzer;
pub mod matrix;

// Re-export commonly used types
pub use analog::{MockAnalog, MockAnalogHandle, PRESENT_READING};
pub use buzzer::{MockBuzzer, MockBuzzerHandle};
pub use matrix::{MockMatrix, MockMatrixHandle};
