//! Hardware device trait definitions.
//!
//! This module defines the seams between the station logic and its
//! peripherals: the ADC the presence sensors are wired to, the GPIO pins of
//! the keypad matrix, and the PWM channel driving the buzzer. Peripheral
//! bring-up is left to the implementations; the station only samples, drives
//! and reads.
//!
//! The methods return `impl Future + Send` rather than being declared as
//! `async fn`, so that loops generic over these traits can be handed to
//! `tokio::spawn`. Implementations are still free to write `async fn`.

use std::future::Future;

use crate::error::{HardwareError, Result};
use crate::types::Attenuation;

/// A key on the station keypad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Numeric digit (0-9).
    Digit(u8),

    /// Star key (*), erases the last digit.
    Star,

    /// Hash key (#), submits the code.
    Hash,
}

impl Key {
    /// Map a keypad symbol to a key.
    ///
    /// # Errors
    ///
    /// Returns an error for symbols that are not on the keypad.
    ///
    /// # Examples
    ///
    /// ```
    /// use toolpanel_hardware::traits::Key;
    ///
    /// assert_eq!(Key::from_symbol('7').unwrap(), Key::Digit(7));
    /// assert_eq!(Key::from_symbol('#').unwrap(), Key::Hash);
    /// assert!(Key::from_symbol('A').is_err());
    /// ```
    pub fn from_symbol(symbol: char) -> Result<Self> {
        match symbol {
            '*' => Ok(Self::Star),
            '#' => Ok(Self::Hash),
            c => c
                .to_digit(10)
                .map(|d| Self::Digit(d as u8))
                .ok_or_else(|| HardwareError::invalid_data(format!("Not a keypad symbol: {c:?}"))),
        }
    }

    /// The symbol printed on this key.
    #[must_use]
    pub fn symbol(self) -> char {
        match self {
            Self::Digit(d) => char::from_digit(u32::from(d), 10).unwrap_or('?'),
            Self::Star => '*',
            Self::Hash => '#',
        }
    }
}

/// Analog input the presence sensors are wired to.
///
/// # Examples
///
/// ```no_run
/// use toolpanel_hardware::traits::AnalogInput;
/// use toolpanel_hardware::error::Result;
///
/// async fn sample<A: AnalogInput>(adc: &mut A) -> Result<u16> {
///     adc.read_raw(3).await
/// }
/// ```
pub trait AnalogInput: Send {
    /// Prepare a channel for sampling with the given attenuation.
    ///
    /// Called once per channel before the first read.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel does not exist or cannot be configured.
    fn configure_channel(
        &mut self,
        channel: u8,
        attenuation: Attenuation,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Take one raw sample from a channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the conversion fails. The sensing loop treats this
    /// as a transient misread.
    fn read_raw(&mut self, channel: u8) -> impl Future<Output = Result<u16>> + Send;
}

/// GPIO pins of a row/column keypad matrix.
///
/// Rows are outputs, columns are inputs. "Active" is the level that closes
/// the circuit through a pressed key; the polarity (active-low on the station
/// wiring) is the implementation's concern.
pub trait KeypadMatrix: Send {
    /// Drive a row to its active or inactive level.
    ///
    /// # Errors
    ///
    /// Returns an error if the pin cannot be driven.
    fn drive_row(&mut self, row: usize, active: bool) -> impl Future<Output = Result<()>> + Send;

    /// Sample a column, returning `true` if it is at the active level.
    ///
    /// # Errors
    ///
    /// Returns an error if the pin cannot be read.
    fn read_column(&mut self, column: usize) -> impl Future<Output = Result<bool>> + Send;
}

/// PWM-driven buzzer.
pub trait Buzzer: Send {
    /// Set the PWM duty. Zero silences the buzzer.
    ///
    /// # Errors
    ///
    /// Returns an error if the duty cannot be applied.
    fn set_duty(&mut self, duty: u32) -> impl Future<Output = Result<()>> + Send;
}
