//! Mock analog input for testing and development.
//!
//! Readings are set per channel through a [`MockAnalogHandle`] and stay in
//! place until changed, like the level of a real presence sensor.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use crate::{HardwareError, Result, traits::AnalogInput, types::Attenuation};

/// Raw reading of a channel nobody has set: a tool sitting in place.
pub const PRESENT_READING: u16 = 4095;

#[derive(Debug)]
struct AnalogState {
    readings: HashMap<u8, u16>,
    fallback: u16,
    failing: HashSet<u8>,
    attenuation: HashMap<u8, Attenuation>,
}

impl AnalogState {
    fn new() -> Self {
        Self {
            readings: HashMap::new(),
            fallback: PRESENT_READING,
            failing: HashSet::new(),
            attenuation: HashMap::new(),
        }
    }
}

/// Mock ADC whose channel levels are set through a handle.
///
/// # Examples
///
/// ```
/// use toolpanel_hardware::mock::MockAnalog;
/// use toolpanel_hardware::traits::AnalogInput;
///
/// #[tokio::main]
/// async fn main() -> toolpanel_hardware::Result<()> {
///     let (mut adc, handle) = MockAnalog::new();
///
///     handle.set_reading(3, 0);
///     assert_eq!(adc.read_raw(3).await?, 0);
///     assert_eq!(adc.read_raw(0).await?, 4095);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockAnalog {
    state: Arc<Mutex<AnalogState>>,
}

impl MockAnalog {
    /// Create a new mock ADC with every channel reading "present".
    pub fn new() -> (Self, MockAnalogHandle) {
        let state = Arc::new(Mutex::new(AnalogState::new()));
        let handle = MockAnalogHandle {
            state: Arc::clone(&state),
        };
        (Self { state }, handle)
    }
}

impl AnalogInput for MockAnalog {
    async fn configure_channel(&mut self, channel: u8, attenuation: Attenuation) -> Result<()> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.attenuation.insert(channel, attenuation);
        Ok(())
    }

    async fn read_raw(&mut self, channel: u8) -> Result<u16> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.failing.contains(&channel) {
            return Err(HardwareError::adc_read(channel, "simulated conversion failure"));
        }
        Ok(state
            .readings
            .get(&channel)
            .copied()
            .unwrap_or(state.fallback))
    }
}

/// Handle for controlling a mock ADC.
///
/// It can be cloned and shared across tasks.
#[derive(Debug, Clone)]
pub struct MockAnalogHandle {
    state: Arc<Mutex<AnalogState>>,
}

impl MockAnalogHandle {
    fn with_state<T>(&self, f: impl FnOnce(&mut AnalogState) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    /// Set the raw level of one channel.
    pub fn set_reading(&self, channel: u8, raw: u16) {
        self.with_state(|s| {
            s.readings.insert(channel, raw);
        });
    }

    /// Set every channel to the same level, discarding per-channel levels.
    pub fn set_all(&self, raw: u16) {
        self.with_state(|s| {
            s.readings.clear();
            s.fallback = raw;
        });
    }

    /// Make reads on a channel fail until restored.
    pub fn fail_channel(&self, channel: u8) {
        self.with_state(|s| {
            s.failing.insert(channel);
        });
    }

    /// Make reads on a channel succeed again.
    pub fn restore_channel(&self, channel: u8) {
        self.with_state(|s| {
            s.failing.remove(&channel);
        });
    }

    /// Attenuation a channel was configured with, if any.
    pub fn attenuation(&self, channel: u8) -> Option<Attenuation> {
        self.with_state(|s| s.attenuation.get(&channel).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unset_channel_reads_present() {
        let (mut adc, _handle) = MockAnalog::new();
        assert_eq!(adc.read_raw(5).await.unwrap(), PRESENT_READING);
    }

    #[tokio::test]
    async fn test_set_reading_and_set_all() {
        let (mut adc, handle) = MockAnalog::new();

        handle.set_reading(0, 12);
        assert_eq!(adc.read_raw(0).await.unwrap(), 12);

        handle.set_all(7);
        assert_eq!(adc.read_raw(0).await.unwrap(), 7);
        assert_eq!(adc.read_raw(6).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_fail_and_restore_channel() {
        let (mut adc, handle) = MockAnalog::new();

        handle.fail_channel(3);
        assert!(matches!(
            adc.read_raw(3).await,
            Err(HardwareError::AdcRead { channel: 3, .. })
        ));
        assert!(adc.read_raw(0).await.is_ok());

        handle.restore_channel(3);
        assert!(adc.read_raw(3).await.is_ok());
    }

    #[tokio::test]
    async fn test_handle_clone_shares_state() {
        let (mut adc, handle) = MockAnalog::new();
        let clone = handle.clone();

        clone.set_reading(1, 99);
        assert_eq!(adc.read_raw(1).await.unwrap(), 99);
    }
}
