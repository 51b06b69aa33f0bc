//! Keypad entry state machine.
//!
//! The machine collects an authorization code one key at a time and resolves
//! exactly once, either because the operator pressed `#` or because the entry
//! deadline passed.
//!
//! # States
//!
//! - `Collecting`: accepting keys (initial)
//! - `Submitted`: `#` was pressed, the code is final (terminal)
//! - `TimedOut`: the deadline passed first (terminal)
//!
//! # Rules while collecting
//!
//! | Input                 | Effect                                   |
//! |-----------------------|------------------------------------------|
//! | deadline passed       | `TimedOut`, code `"0"`                   |
//! | `*`                   | erase the last digit, if any             |
//! | `#`                   | `Submitted` with the buffer, even empty  |
//! | digit, buffer < 9     | append                                   |
//! | digit, buffer full    | ignored                                  |
//! | no key                | nothing                                  |
//!
//! The deadline is checked before the key of the same step.
//!
//! # Examples
//!
//! ```
//! use toolpanel_hardware::traits::Key;
//! use toolpanel_session::entry::{EntryState, EntryStateMachine, Resolution};
//!
//! let mut machine = EntryStateMachine::new();
//! for key in [Key::Digit(4), Key::Digit(3), Key::Star, Key::Digit(2)] {
//!     machine.step(Some(key), false);
//! }
//! assert_eq!(machine.code(), "42");
//!
//! let resolution = machine.step(Some(Key::Hash), false).unwrap();
//! assert_eq!(resolution, Resolution::submitted("42"));
//! assert_eq!(machine.state(), EntryState::Submitted);
//! ```

use std::fmt;

use tracing::{debug, trace};

use toolpanel_core::constants::{CODE_CAPACITY, TIMEOUT_CODE};
use toolpanel_hardware::traits::Key;

/// Code buffer whose capacity is the code length limit.
pub type CodeBuffer = heapless::String<CODE_CAPACITY>;

/// State of an entry session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryState {
    /// Accepting keys.
    Collecting,

    /// The operator submitted a code.
    Submitted,

    /// The deadline passed before submission.
    TimedOut,
}

impl EntryState {
    /// Returns `true` for `Submitted` and `TimedOut`.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Collecting)
    }
}

impl fmt::Display for EntryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state_str = match self {
            Self::Collecting => "Collecting",
            Self::Submitted => "Submitted",
            Self::TimedOut => "TimedOut",
        };
        write!(f, "{}", state_str)
    }
}

/// How an entry session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The operator pressed `#`; the buffer at that moment.
    Submitted(CodeBuffer),

    /// The deadline passed first.
    TimedOut,
}

impl Resolution {
    /// Build a submitted resolution from a code, keeping at most
    /// `CODE_CAPACITY` characters.
    pub fn submitted(code: &str) -> Self {
        let mut buffer = CodeBuffer::new();
        for c in code.chars() {
            if buffer.push(c).is_err() {
                break;
            }
        }
        Self::Submitted(buffer)
    }

    /// The code to report: the submitted buffer, or `"0"` on timeout.
    pub fn code(&self) -> &str {
        match self {
            Self::Submitted(code) => code.as_str(),
            Self::TimedOut => TIMEOUT_CODE,
        }
    }

    /// Returns `true` if the session timed out.
    pub fn is_timed_out(&self) -> bool {
        matches!(self, Self::TimedOut)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Submitted(code) => write!(f, "submitted ({} digits)", code.len()),
            Self::TimedOut => write!(f, "timed out"),
        }
    }
}

/// Accumulates keypad input until submission or timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryStateMachine {
    buffer: CodeBuffer,
    state: EntryState,
}

impl EntryStateMachine {
    /// Create a machine collecting into an empty buffer.
    pub fn new() -> Self {
        Self {
            buffer: CodeBuffer::new(),
            state: EntryState::Collecting,
        }
    }

    /// Current state.
    pub fn state(&self) -> EntryState {
        self.state
    }

    /// Digits collected so far.
    pub fn code(&self) -> &str {
        self.buffer.as_str()
    }

    /// The resolution, once the machine is terminal.
    pub fn resolution(&self) -> Option<Resolution> {
        match self.state {
            EntryState::Collecting => None,
            EntryState::Submitted => Some(Resolution::Submitted(self.buffer.clone())),
            EntryState::TimedOut => Some(Resolution::TimedOut),
        }
    }

    /// Evaluate one scan: the key read (if any) and the deadline status.
    ///
    /// Returns the resolution on the step that makes the machine terminal and
    /// `None` otherwise. Steps taken after that are ignored.
    pub fn step(&mut self, key: Option<Key>, expired: bool) -> Option<Resolution> {
        if self.state.is_terminal() {
            return None;
        }

        if expired {
            self.transition(EntryState::TimedOut);
            return self.resolution();
        }

        match key? {
            Key::Star => {
                self.buffer.pop();
            }
            Key::Hash => {
                self.transition(EntryState::Submitted);
                return self.resolution();
            }
            Key::Digit(d) => match char::from_digit(u32::from(d), 10) {
                // A full buffer keeps its content; the extra digit is dropped
                Some(c) => {
                    if self.buffer.push(c).is_err() {
                        trace!(digit = d, "code buffer full, digit ignored");
                    }
                }
                None => debug!(value = d, "out-of-range digit key ignored"),
            },
        }

        trace!(length = self.buffer.len(), "code buffer updated");
        None
    }

    fn transition(&mut self, to: EntryState) {
        debug!(from = %self.state, %to, "entry state transition");
        self.state = to;
    }
}

impl Default for EntryStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
