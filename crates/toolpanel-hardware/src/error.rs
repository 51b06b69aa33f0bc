//! Error types for hardware operations.
//!
//! This module defines error types specific to the station peripherals:
//! analog sensor inputs, the keypad matrix pins, and the buzzer PWM channel.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur during hardware device operations.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Analog read failed on a sensor channel.
    #[error("ADC read failed on channel {channel}: {message}")]
    AdcRead { channel: u8, message: String },

    /// Driving or sampling a GPIO pin failed.
    #[error("Pin I/O error: {message}")]
    PinIo { message: String },

    /// Updating the PWM duty failed.
    #[error("PWM error: {message}")]
    Pwm { message: String },

    /// Invalid data received from or sent to a device.
    #[error("Invalid data: {message}")]
    InvalidData { message: String },
}

impl HardwareError {
    /// Create a new ADC read error.
    pub fn adc_read(channel: u8, message: impl Into<String>) -> Self {
        Self::AdcRead {
            channel,
            message: message.into(),
        }
    }

    /// Create a new pin I/O error.
    pub fn pin_io(message: impl Into<String>) -> Self {
        Self::PinIo {
            message: message.into(),
        }
    }

    /// Create a new PWM error.
    pub fn pwm(message: impl Into<String>) -> Self {
        Self::Pwm {
            message: message.into(),
        }
    }

    /// Create a new invalid data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }
}
