//! Audible feedback patterns.
//!
//! A pattern is a number of equal pulses at a fixed duty, separated by
//! silent gaps. The buzzer is always left silent when a pattern ends, also
//! when it ends early because the PWM channel failed.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Result;
use crate::traits::Buzzer;
use toolpanel_core::constants::{BUZZER_DUTY, BUZZER_GAP_MS, BUZZER_PULSE_MS, BUZZER_TIMEOUT_PULSES};

/// A sequence of identical buzzer pulses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PulsePattern {
    /// PWM duty while a pulse is active.
    pub duty: u32,

    /// Length of each pulse in milliseconds.
    pub pulse_ms: u64,

    /// Silence between pulses in milliseconds.
    pub gap_ms: u64,

    /// Number of pulses.
    pub pulses: u8,
}

impl Default for PulsePattern {
    /// The timeout alert: two 200 ms pulses with a 200 ms gap.
    fn default() -> Self {
        Self {
            duty: BUZZER_DUTY,
            pulse_ms: BUZZER_PULSE_MS,
            gap_ms: BUZZER_GAP_MS,
            pulses: BUZZER_TIMEOUT_PULSES,
        }
    }
}

impl PulsePattern {
    /// Total time the pattern takes to play.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use toolpanel_hardware::buzzer::PulsePattern;
    ///
    /// assert_eq!(PulsePattern::default().duration(), Duration::from_millis(600));
    /// ```
    #[must_use]
    pub fn duration(&self) -> Duration {
        let pulses = u64::from(self.pulses);
        let gaps = pulses.saturating_sub(1);
        Duration::from_millis(pulses * self.pulse_ms + gaps * self.gap_ms)
    }

    /// Play the pattern on a buzzer.
    ///
    /// # Errors
    ///
    /// Returns the first PWM failure. A best-effort attempt to silence the
    /// buzzer is still made.
    pub async fn play<B: Buzzer>(&self, buzzer: &mut B) -> Result<()> {
        let result = self.play_pulses(buzzer).await;
        if result.is_err() {
            let _ = buzzer.set_duty(0).await;
        }
        result
    }

    async fn play_pulses<B: Buzzer>(&self, buzzer: &mut B) -> Result<()> {
        let pulse = Duration::from_millis(self.pulse_ms);
        let gap = Duration::from_millis(self.gap_ms);

        for n in 0..self.pulses {
            if n > 0 {
                tokio::time::sleep(gap).await;
            }
            buzzer.set_duty(self.duty).await?;
            tokio::time::sleep(pulse).await;
            buzzer.set_duty(0).await?;
        }

        debug!(pulses = self.pulses, "feedback pattern played");
        Ok(())
    }
}
