//! Keypad entry sessions for the tool-checkout station.
//!
//! After a tool is taken or returned the operator has a limited time to type
//! an authorization code. This crate holds the pieces of that exchange:
//!
//! - [`timeout`]: the single-shot, cancellable deadline of a session.
//! - [`entry`]: the state machine turning key presses into a code.
//! - [`session`]: one session driving a keypad scanner until it resolves.

pub mod entry;
pub mod session;
pub mod timeout;

pub use entry::{CodeBuffer, EntryState, EntryStateMachine, Resolution};
pub use session::EntrySession;
pub use timeout::{
    ArmedTimer, ExpiryTrigger, TimeoutStatus, TimeoutSupervisor, TimerError, TimerService,
    TokioTimers,
};
