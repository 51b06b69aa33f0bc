//! One keypad entry session, from sensor event to resolution.
//!
//! An [`EntrySession`] owns everything a session needs: the event that
//! started it, the entry state machine and the timeout supervisor returned by
//! arming the deadline. It is created by the consumer loop and dropped once
//! the resolution has been dispatched, so no session state outlives it.

use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use crate::entry::{EntryState, EntryStateMachine, Resolution};
use crate::timeout::{TimeoutSupervisor, TimerService};
use toolpanel_core::SensorEvent;
use toolpanel_hardware::keypad::KeypadScanner;
use toolpanel_hardware::traits::{Key, KeypadMatrix};

/// An entry session guarded by a deadline.
#[derive(Debug)]
pub struct EntrySession {
    id: Uuid,
    event: SensorEvent,
    machine: EntryStateMachine,
    timeout: TimeoutSupervisor,
    started_at: Instant,
}

impl EntrySession {
    /// Start a session for `event`, arming a deadline `after` from now.
    ///
    /// If the deadline cannot be armed the session is already expired and
    /// resolves to timed-out on its first step.
    pub fn start<T: TimerService + ?Sized>(
        event: SensorEvent,
        timers: &T,
        after: Duration,
    ) -> Self {
        let id = Uuid::new_v4();
        let timeout = TimeoutSupervisor::start(timers, after);

        info!(
            session = %id,
            position = %event.position,
            kind = %event.kind,
            timeout_ms = after.as_millis() as u64,
            "entry session started"
        );

        Self {
            id,
            event,
            machine: EntryStateMachine::new(),
            timeout,
            started_at: Instant::now(),
        }
    }

    /// Session identifier, used to correlate log lines.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The sensor event that started this session.
    pub fn event(&self) -> &SensorEvent {
        &self.event
    }

    /// Current entry state.
    pub fn state(&self) -> EntryState {
        self.machine.state()
    }

    /// Digits collected so far.
    pub fn code(&self) -> &str {
        self.machine.code()
    }

    /// The deadline guarding this session.
    pub fn timeout(&self) -> &TimeoutSupervisor {
        &self.timeout
    }

    /// Time since the session started.
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Feed one scan result into the session.
    ///
    /// The deadline is checked first; a key read in the same step as expiry
    /// is discarded. Submitting cancels the deadline.
    pub fn step(&mut self, key: Option<Key>) -> Option<Resolution> {
        let expired = self.timeout.is_expired();
        let resolution = self.machine.step(key, expired)?;

        if !resolution.is_timed_out() {
            self.timeout.cancel();
        }

        info!(
            session = %self.id,
            outcome = %resolution,
            elapsed_ms = self.elapsed().as_millis() as u64,
            "entry session resolved"
        );
        Some(resolution)
    }

    /// Scan the keypad every `scan_interval` until the session resolves.
    ///
    /// A failed scan counts as "no key"; only the deadline can end a session
    /// whose keypad keeps failing.
    pub async fn run<M: KeypadMatrix>(
        &mut self,
        scanner: &mut KeypadScanner<M>,
        scan_interval: Duration,
    ) -> Resolution {
        let span = info_span!("entry_session", session = %self.id, position = %self.event.position);

        async {
            let mut ticker = tokio::time::interval(scan_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                let key = if self.timeout.is_expired() {
                    None
                } else {
                    match scanner.scan().await {
                        Ok(key) => key,
                        Err(e) => {
                            warn!(error = %e, "keypad scan failed");
                            None
                        }
                    }
                };

                if let Some(resolution) = self.step(key) {
                    return resolution;
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Split the session into its event and deadline, for dispatching.
    pub fn into_parts(self) -> (SensorEvent, TimeoutSupervisor) {
        (self.event, self.timeout)
    }
}
