//! Station configuration.
//!
//! Every field has a default, so an empty file is a valid configuration:
//!
//! ```toml
//! endpoint = "http://192.168.0.10:3000/api/painel"
//! request_timeout_ms = 10000
//! sensor_poll_interval_ms = 500
//! keypad_scan_interval_ms = 50
//! entry_timeout_ms = 30000
//! zero_threshold = 0
//!
//! [buzzer]
//! duty = 5000
//! pulse_ms = 200
//! gap_ms = 200
//! pulses = 2
//! ```
//!
//! The sensor table is not configurable; see
//! [`default_sensors`](toolpanel_hardware::default_sensors).

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Result, StationError};
use toolpanel_core::constants::{
    DEFAULT_AUTH_ENDPOINT, DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_ZERO_THRESHOLD, ENTRY_TIMEOUT_MS,
    KEYPAD_SCAN_INTERVAL_MS, SENSOR_POLL_INTERVAL_MS,
};
use toolpanel_hardware::PulsePattern;
use toolpanel_network::AuthClientConfig;

/// Runtime settings of a station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StationConfig {
    /// URL authorization requests are posted to.
    pub endpoint: String,

    /// Timeout for one authorization request.
    pub request_timeout_ms: u64,

    /// Interval between two sensor sweeps.
    pub sensor_poll_interval_ms: u64,

    /// Interval between two keypad scans during a session.
    pub keypad_scan_interval_ms: u64,

    /// Time the operator has to submit a code.
    pub entry_timeout_ms: u64,

    /// Highest raw reading classified as "zero".
    pub zero_threshold: u16,

    /// Pattern played when a session times out.
    pub buzzer: PulsePattern,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_AUTH_ENDPOINT.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            sensor_poll_interval_ms: SENSOR_POLL_INTERVAL_MS,
            keypad_scan_interval_ms: KEYPAD_SCAN_INTERVAL_MS,
            entry_timeout_ms: ENTRY_TIMEOUT_MS,
            zero_threshold: DEFAULT_ZERO_THRESHOLD,
            buzzer: PulsePattern::default(),
        }
    }
}

impl StationConfig {
    /// Parse and validate a TOML document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid TOML, has unknown keys,
    /// or fails [`validate`](Self::validate).
    ///
    /// # Examples
    ///
    /// ```
    /// use toolpanel_station::StationConfig;
    ///
    /// let config = StationConfig::from_toml_str("entry_timeout_ms = 15000").unwrap();
    /// assert_eq!(config.entry_timeout_ms, 15000);
    /// assert_eq!(config.keypad_scan_interval_ms, 50);
    /// ```
    pub fn from_toml_str(document: &str) -> Result<Self> {
        let config: Self = toml::from_str(document)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or its content is invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let document = std::fs::read_to_string(path).map_err(|source| StationError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_toml_str(&document)?;
        debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Check the values a station cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`StationError::Config`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let non_zero = [
            ("request_timeout_ms", self.request_timeout_ms),
            ("sensor_poll_interval_ms", self.sensor_poll_interval_ms),
            ("keypad_scan_interval_ms", self.keypad_scan_interval_ms),
            ("entry_timeout_ms", self.entry_timeout_ms),
        ];
        if let Some((field, _)) = non_zero.iter().find(|(_, value)| *value == 0) {
            return Err(StationError::config(format!("{field} must be greater than zero")));
        }

        if self.keypad_scan_interval_ms >= self.entry_timeout_ms {
            return Err(StationError::config(
                "keypad_scan_interval_ms must be shorter than entry_timeout_ms",
            ));
        }

        let has_scheme = ["http://", "https://"]
            .iter()
            .any(|scheme| self.endpoint.starts_with(scheme) && self.endpoint.len() > scheme.len());
        if !has_scheme {
            return Err(StationError::config(format!(
                "endpoint must be an http(s) URL, got '{}'",
                self.endpoint
            )));
        }

        if self.buzzer.pulses > 0 && self.buzzer.pulse_ms == 0 {
            return Err(StationError::config("buzzer.pulse_ms must be greater than zero"));
        }

        Ok(())
    }

    /// Interval between two sensor sweeps.
    pub fn sensor_poll_interval(&self) -> Duration {
        Duration::from_millis(self.sensor_poll_interval_ms)
    }

    /// Interval between two keypad scans.
    pub fn keypad_scan_interval(&self) -> Duration {
        Duration::from_millis(self.keypad_scan_interval_ms)
    }

    /// Entry session deadline.
    pub fn entry_timeout(&self) -> Duration {
        Duration::from_millis(self.entry_timeout_ms)
    }

    /// Settings for the HTTP authorization client.
    pub fn auth_client_config(&self) -> AuthClientConfig {
        AuthClientConfig {
            endpoint: self.endpoint.clone(),
            timeout: Duration::from_millis(self.request_timeout_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;

    #[test]
    fn test_default_values() {
        let config = StationConfig::default();
        assert_eq!(config.endpoint, DEFAULT_AUTH_ENDPOINT);
        assert_eq!(config.sensor_poll_interval(), Duration::from_millis(500));
        assert_eq!(config.keypad_scan_interval(), Duration::from_millis(50));
        assert_eq!(config.entry_timeout(), Duration::from_secs(30));
        assert_eq!(config.zero_threshold, 0);
        assert_eq!(config.buzzer, PulsePattern::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_document_is_default() {
        let config = StationConfig::from_toml_str("").unwrap();
        assert_eq!(config, StationConfig::default());
    }

    #[test]
    fn test_full_document() {
        let config = StationConfig::from_toml_str(
            r#"
            endpoint = "https://auth.example.com/api/painel"
            request_timeout_ms = 2500
            sensor_poll_interval_ms = 250
            keypad_scan_interval_ms = 20
            entry_timeout_ms = 10000
            zero_threshold = 12

            [buzzer]
            duty = 4000
            pulses = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.endpoint, "https://auth.example.com/api/painel");
        assert_eq!(config.zero_threshold, 12);
        assert_eq!(config.buzzer.duty, 4000);
        assert_eq!(config.buzzer.pulses, 3);
        // Unset pattern fields keep their defaults
        assert_eq!(config.buzzer.pulse_ms, 200);

        let client = config.auth_client_config();
        assert_eq!(client.timeout, Duration::from_millis(2500));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result = StationConfig::from_toml_str("entry_timeout = 5");
        assert!(matches!(result, Err(StationError::ConfigParse(_))));
    }

    #[rstest]
    #[case("keypad_scan_interval_ms = 0")]
    #[case("sensor_poll_interval_ms = 0")]
    #[case("entry_timeout_ms = 0")]
    #[case("request_timeout_ms = 0")]
    #[case("entry_timeout_ms = 40")]
    #[case(r#"endpoint = "ftp://host/painel""#)]
    #[case(r#"endpoint = "http://""#)]
    #[case("[buzzer]\npulse_ms = 0")]
    fn test_invalid_values_rejected(#[case] document: &str) {
        let result = StationConfig::from_toml_str(document);
        assert!(matches!(result, Err(StationError::Config(_))), "{document}");
    }

    #[test]
    fn test_silent_buzzer_allowed() {
        let config = StationConfig::from_toml_str("[buzzer]\npulses = 0\npulse_ms = 0").unwrap();
        assert_eq!(config.buzzer.pulses, 0);
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir()
            .join(format!("toolpanel-config-{}.toml", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "zero_threshold = 40").unwrap();
        drop(file);

        let config = StationConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.zero_threshold, 40);
    }

    #[test]
    fn test_load_missing_file() {
        let result = StationConfig::load("/nonexistent/toolpanel.toml");
        assert!(matches!(result, Err(StationError::ConfigRead { .. })));
    }
}
