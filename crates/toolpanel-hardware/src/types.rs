//! Common types shared across hardware device implementations.
//!
//! This module defines the static description of a sensor channel and the
//! binary presence classification the sensing loop works with.

use serde::{Deserialize, Serialize};
use std::fmt;
use toolpanel_core::PositionId;

/// Input attenuation of an ADC channel.
///
/// Higher attenuation widens the measurable voltage range at the cost of
/// resolution; it is the "sensitivity" knob of a presence sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Attenuation {
    /// No attenuation (~0-950 mV).
    Db0,

    /// 2.5 dB (~0-1250 mV).
    Db2_5,

    /// 6 dB (~0-1750 mV).
    Db6,

    /// 11 dB (~0-3100 mV).
    Db11,
}

impl Attenuation {
    /// Attenuation in decibels.
    #[must_use]
    pub fn as_db(self) -> f32 {
        match self {
            Self::Db0 => 0.0,
            Self::Db2_5 => 2.5,
            Self::Db6 => 6.0,
            Self::Db11 => 11.0,
        }
    }
}

impl fmt::Display for Attenuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} dB", self.as_db())
    }
}

/// Static configuration of one presence sensor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorConfig {
    /// Tool position watched by this sensor.
    pub position: PositionId,

    /// Physical ADC channel the sensor is wired to.
    pub channel: u8,

    /// Channel sensitivity.
    pub attenuation: Attenuation,
}

impl SensorConfig {
    /// Create a new sensor configuration.
    pub fn new(position: PositionId, channel: u8, attenuation: Attenuation) -> Self {
        Self {
            position,
            channel,
            attenuation,
        }
    }
}

/// Binary classification of a raw sensor reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Presence {
    /// Reading at or below the zero threshold: the tool is absent.
    Zero,

    /// Reading above the zero threshold: the tool is present.
    Nonzero,
}

impl Presence {
    /// Classify a raw reading against the zero threshold.
    ///
    /// # Examples
    ///
    /// ```
    /// use toolpanel_hardware::types::Presence;
    ///
    /// assert_eq!(Presence::classify(0, 0), Presence::Zero);
    /// assert_eq!(Presence::classify(1, 0), Presence::Nonzero);
    /// assert_eq!(Presence::classify(40, 50), Presence::Zero);
    /// ```
    #[must_use]
    pub fn classify(raw: u16, zero_threshold: u16) -> Self {
        if raw <= zero_threshold {
            Self::Zero
        } else {
            Self::Nonzero
        }
    }
}
