//! Mock buzzer for testing and development.
//!
//! Every applied duty change is recorded with the (tokio) instant it
//! happened, so tests running on paused time can check pulse lengths.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::time::Instant;

use crate::{HardwareError, Result, traits::Buzzer};

#[derive(Debug, Default)]
struct BuzzerState {
    changes: Vec<(Instant, u32)>,
    fail_after: Option<usize>,
    calls: usize,
}

/// Mock PWM buzzer.
///
/// # Examples
///
/// ```
/// use toolpanel_hardware::mock::MockBuzzer;
/// use toolpanel_hardware::traits::Buzzer;
///
/// #[tokio::main]
/// async fn main() -> toolpanel_hardware::Result<()> {
///     let (mut buzzer, handle) = MockBuzzer::new();
///
///     buzzer.set_duty(5000).await?;
///     buzzer.set_duty(0).await?;
///
///     assert_eq!(handle.pulse_count(), 1);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockBuzzer {
    duty: u32,
    state: Arc<Mutex<BuzzerState>>,
}

impl MockBuzzer {
    /// Create a new silent mock buzzer.
    pub fn new() -> (Self, MockBuzzerHandle) {
        let state = Arc::new(Mutex::new(BuzzerState::default()));
        let handle = MockBuzzerHandle {
            state: Arc::clone(&state),
        };
        (Self { duty: 0, state }, handle)
    }

    /// Duty currently applied.
    pub fn duty(&self) -> u32 {
        self.duty
    }
}

impl Buzzer for MockBuzzer {
    async fn set_duty(&mut self, duty: u32) -> Result<()> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.calls += 1;
        if state.fail_after.is_some_and(|limit| state.calls > limit) {
            return Err(HardwareError::pwm("simulated duty update failure"));
        }

        state.changes.push((Instant::now(), duty));
        self.duty = duty;
        Ok(())
    }
}

/// Handle for inspecting a mock buzzer.
///
/// It can be cloned and shared across tasks.
#[derive(Debug, Clone)]
pub struct MockBuzzerHandle {
    state: Arc<Mutex<BuzzerState>>,
}

impl MockBuzzerHandle {
    fn with_state<T>(&self, f: impl FnOnce(&mut BuzzerState) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    /// Every applied duty change, oldest first.
    pub fn changes(&self) -> Vec<(Instant, u32)> {
        self.with_state(|s| s.changes.clone())
    }

    /// Number of times the buzzer went from silent to sounding.
    pub fn pulse_count(&self) -> usize {
        self.with_state(|s| {
            let mut previous = 0;
            let mut count = 0;
            for &(_, duty) in &s.changes {
                if previous == 0 && duty > 0 {
                    count += 1;
                }
                previous = duty;
            }
            count
        })
    }

    /// Let `calls` more duty updates succeed, then fail every later one.
    pub fn fail_after(&self, calls: usize) {
        self.with_state(|s| s.fail_after = Some(s.calls + calls));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_changes() {
        let (mut buzzer, handle) = MockBuzzer::new();

        buzzer.set_duty(100).await.unwrap();
        buzzer.set_duty(0).await.unwrap();
        buzzer.set_duty(100).await.unwrap();

        let duties: Vec<u32> = handle.changes().into_iter().map(|(_, d)| d).collect();
        assert_eq!(duties, vec![100, 0, 100]);
        assert_eq!(handle.pulse_count(), 2);
        assert_eq!(buzzer.duty(), 100);
    }

    #[tokio::test]
    async fn test_fail_after() {
        let (mut buzzer, handle) = MockBuzzer::new();
        handle.fail_after(1);

        assert!(buzzer.set_duty(100).await.is_ok());
        assert!(buzzer.set_duty(0).await.is_err());
        assert_eq!(buzzer.duty(), 100);
        assert_eq!(handle.changes().len(), 1);
    }
}
