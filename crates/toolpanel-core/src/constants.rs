//! Timing, sizing, and wire constants for the tool-checkout station.
//!
//! The station runs two loops at fixed cadences and talks to a single
//! authorization endpoint. The values here are the defaults both loops and the
//! dispatcher agree on; most of them can be overridden through the station
//! configuration, except the keypad geometry and the code capacity, which are
//! properties of the hardware and of the authorization service.
//!
//! # Usage
//!
//! ```
//! use toolpanel_core::constants::*;
//! use std::time::Duration;
//!
//! let poll = Duration::from_millis(SENSOR_POLL_INTERVAL_MS);
//! let scan = Duration::from_millis(KEYPAD_SCAN_INTERVAL_MS);
//! assert!(scan < poll);
//! assert_eq!(CODE_CAPACITY, 9);
//! ```

// ============================================================================
// Loop Cadence
// ============================================================================

/// Interval between two sensor sweeps (milliseconds).
///
/// Every configured channel is sampled once per sweep.
///
/// # Value: 500ms
pub const SENSOR_POLL_INTERVAL_MS: u64 = 500;

/// Interval between two keypad scans during an entry session (milliseconds).
///
/// Timeout expiry is observed once per scan, so this is also the worst-case
/// latency between the deadline and the session resolving to timed-out.
///
/// # Value: 50ms
pub const KEYPAD_SCAN_INTERVAL_MS: u64 = 50;

/// Time an operator has to enter and submit a code (milliseconds).
///
/// # Value: 30000ms (30 seconds)
///
/// # Examples
///
/// ```
/// use toolpanel_core::constants::ENTRY_TIMEOUT_MS;
/// use std::time::Duration;
///
/// assert_eq!(Duration::from_millis(ENTRY_TIMEOUT_MS).as_secs(), 30);
/// ```
pub const ENTRY_TIMEOUT_MS: u64 = 30_000;

// ============================================================================
// Keypad
// ============================================================================

/// Number of rows in the keypad matrix.
pub const KEYPAD_ROWS: usize = 4;

/// Number of columns in the keypad matrix.
pub const KEYPAD_COLUMNS: usize = 3;

/// Symbol table of the keypad, row-major.
///
/// ```text
/// 1 2 3
/// 4 5 6
/// 7 8 9
/// * 0 #
/// ```
pub const KEYPAD_LAYOUT: [[char; KEYPAD_COLUMNS]; KEYPAD_ROWS] = [
    ['1', '2', '3'],
    ['4', '5', '6'],
    ['7', '8', '9'],
    ['*', '0', '#'],
];

/// Maximum number of characters in an authorization code.
///
/// Digits typed once the buffer is full are ignored.
pub const CODE_CAPACITY: usize = 9;

/// Code reported to the authorization service when an entry session times out.
pub const TIMEOUT_CODE: &str = "0";

// ============================================================================
// Sensors
// ============================================================================

/// Highest raw reading still classified as "zero" (tool absent).
///
/// # Value: 0 (only an exact zero reading means absent)
pub const DEFAULT_ZERO_THRESHOLD: u16 = 0;

/// Longest accepted position identifier.
pub const MAX_POSITION_ID_LENGTH: usize = 16;

// ============================================================================
// Authorization Service
// ============================================================================

/// Default authorization endpoint.
pub const DEFAULT_AUTH_ENDPOINT: &str =
    "http://main--incomparable-cobbler-553924.netlify.app/api/painel";

/// Default timeout for one authorization request (milliseconds).
///
/// The request is sent once; when this expires the dispatch is reported as
/// a transport failure.
///
/// # Value: 10000ms (10 seconds)
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Operation label sent for a tool being taken.
pub const LABEL_TAKE: &str = "Retirada";

/// Operation label sent for a tool being returned.
pub const LABEL_RETURN: &str = "Devolução";

/// Status returned when the code was accepted.
pub const STATUS_AUTHENTICATED: u16 = 201;

/// Status returned when the tool position is unknown to the service.
pub const STATUS_TOOL_NOT_FOUND: u16 = 402;

/// Status returned when the operator code is unknown to the service.
pub const STATUS_USER_NOT_FOUND: u16 = 403;

// ============================================================================
// Audible Feedback
// ============================================================================

/// PWM duty written to the buzzer while a pulse is active.
///
/// The buzzer channel runs at 13-bit resolution, 4 kHz.
pub const BUZZER_DUTY: u32 = 5000;

/// Length of one buzzer pulse (milliseconds).
pub const BUZZER_PULSE_MS: u64 = 200;

/// Silence between two buzzer pulses (milliseconds).
pub const BUZZER_GAP_MS: u64 = 200;

/// Number of pulses played when an entry session times out.
pub const BUZZER_TIMEOUT_PULSES: u8 = 2;
