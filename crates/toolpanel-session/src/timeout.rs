//! Single-shot, cancellable entry deadline.
//!
//! A [`TimeoutSupervisor`] is created per entry session. Arming hands a
//! trigger to a [`TimerService`], which fires it from its own context once the
//! deadline passes. Firing and cancelling race on one atomic state word, so
//! the outcome is whichever happened first:
//!
//! ```text
//!            fire()                cancel()
//! Expired ◄───────── Armed ─────────────────► Cancelled
//! ```
//!
//! Both terminal states are sticky: cancelling an expired or already
//! cancelled supervisor does nothing, and a cancelled supervisor never
//! reports expiry.
//!
//! If the timer cannot be armed, the supervisor starts out `Expired`, so the
//! session it guards resolves to timed-out on its next check instead of
//! waiting forever for a deadline that will never fire.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

const ARMED: u8 = 0;
const EXPIRED: u8 = 1;
const CANCELLED: u8 = 2;

/// Errors raised while arming a timer.
#[derive(Debug, Error)]
pub enum TimerError {
    /// No timer runtime is available in this context.
    #[error("Timer runtime unavailable: {0}")]
    Unavailable(String),

    /// The timer service has no free timers.
    #[error("Timer resources exhausted")]
    Exhausted,
}

/// Current state of a supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeoutStatus {
    /// Deadline pending.
    Armed,

    /// Deadline passed, or the timer could not be armed.
    Expired,

    /// Disarmed before the deadline.
    Cancelled,
}

impl fmt::Display for TimeoutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Armed => write!(f, "armed"),
            Self::Expired => write!(f, "expired"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Handed to a timer service; flips its supervisor to expired when fired.
#[derive(Debug, Clone)]
pub struct ExpiryTrigger {
    state: Arc<AtomicU8>,
}

impl ExpiryTrigger {
    /// Mark the supervisor as expired.
    ///
    /// Returns `false` if the supervisor had already been cancelled.
    pub fn fire(&self) -> bool {
        let fired = self
            .state
            .compare_exchange(ARMED, EXPIRED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if fired {
            info!("entry timeout expired");
        }
        fired
    }
}

/// A timer that has been armed and can still be disarmed.
pub trait ArmedTimer: Send + Sync {
    /// Stop the timer. Must be safe to call after it has fired.
    fn disarm(&mut self);
}

/// Something that can fire a trigger after a delay.
pub trait TimerService {
    /// Arm a single-shot timer.
    ///
    /// # Errors
    ///
    /// Returns an error if no timer can be allocated.
    fn arm(
        &self,
        after: Duration,
        trigger: ExpiryTrigger,
    ) -> Result<Box<dyn ArmedTimer>, TimerError>;
}

/// Timer service backed by the Tokio runtime of the calling context.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimers;

struct TokioTimer(JoinHandle<()>);

impl ArmedTimer for TokioTimer {
    fn disarm(&mut self) {
        self.0.abort();
    }
}

impl TimerService for TokioTimers {
    fn arm(
        &self,
        after: Duration,
        trigger: ExpiryTrigger,
    ) -> Result<Box<dyn ArmedTimer>, TimerError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| TimerError::Unavailable(e.to_string()))?;

        let task = runtime.spawn(async move {
            tokio::time::sleep(after).await;
            trigger.fire();
        });

        Ok(Box::new(TokioTimer(task)))
    }
}

/// Cancellable deadline guarding one entry session.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use toolpanel_session::timeout::{TimeoutStatus, TimeoutSupervisor, TokioTimers};
///
/// #[tokio::main]
/// async fn main() {
///     let mut supervisor = TimeoutSupervisor::start(&TokioTimers, Duration::from_secs(30));
///     assert_eq!(supervisor.status(), TimeoutStatus::Armed);
///
///     assert!(supervisor.cancel());
///     assert!(!supervisor.cancel());
///     assert!(!supervisor.is_expired());
/// }
/// ```
pub struct TimeoutSupervisor {
    state: Arc<AtomicU8>,
    timer: Option<Box<dyn ArmedTimer>>,
    after: Duration,
}

impl TimeoutSupervisor {
    /// Arm a new deadline `after` from now.
    ///
    /// If the timer service cannot arm a timer the failure is logged and the
    /// supervisor is returned already expired.
    pub fn start<T: TimerService + ?Sized>(timers: &T, after: Duration) -> Self {
        let state = Arc::new(AtomicU8::new(ARMED));
        let trigger = ExpiryTrigger {
            state: Arc::clone(&state),
        };

        let timer = match timers.arm(after, trigger) {
            Ok(timer) => {
                debug!(after_ms = after.as_millis() as u64, "entry timeout armed");
                Some(timer)
            }
            Err(e) => {
                error!(error = %e, "failed to arm entry timeout, expiring immediately");
                state.store(EXPIRED, Ordering::Release);
                None
            }
        };

        Self {
            state,
            timer,
            after,
        }
    }

    /// Disarm the deadline.
    ///
    /// Returns `true` if this call cancelled a pending deadline; `false` if
    /// the supervisor had already expired or been cancelled, in which case
    /// nothing changes.
    pub fn cancel(&mut self) -> bool {
        let cancelled = self
            .state
            .compare_exchange(ARMED, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();

        if cancelled {
            if let Some(mut timer) = self.timer.take() {
                timer.disarm();
            }
            debug!("entry timeout cancelled");
        }
        cancelled
    }

    /// Check whether the deadline has passed.
    pub fn is_expired(&self) -> bool {
        self.status() == TimeoutStatus::Expired
    }

    /// Current state of the supervisor.
    pub fn status(&self) -> TimeoutStatus {
        match self.state.load(Ordering::Acquire) {
            ARMED => TimeoutStatus::Armed,
            EXPIRED => TimeoutStatus::Expired,
            _ => TimeoutStatus::Cancelled,
        }
    }

    /// Duration the deadline was armed for.
    pub fn duration(&self) -> Duration {
        self.after
    }
}

impl fmt::Debug for TimeoutSupervisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeoutSupervisor")
            .field("status", &self.status())
            .field("after", &self.after)
            .finish()
    }
}

impl Drop for TimeoutSupervisor {
    fn drop(&mut self) {
        if let Some(mut timer) = self.timer.take() {
            timer.disarm();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEADLINE: Duration = Duration::from_secs(30);

    struct Exhausted;

    impl TimerService for Exhausted {
        fn arm(
            &self,
            _after: Duration,
            _trigger: ExpiryTrigger,
        ) -> Result<Box<dyn ArmedTimer>, TimerError> {
            Err(TimerError::Exhausted)
        }
    }

    /// Timer service that keeps the trigger so tests can fire it by hand.
    #[derive(Default)]
    struct Manual {
        trigger: std::sync::Mutex<Option<ExpiryTrigger>>,
    }

    struct ManualTimer;

    impl ArmedTimer for ManualTimer {
        fn disarm(&mut self) {}
    }

    impl TimerService for Manual {
        fn arm(
            &self,
            _after: Duration,
            trigger: ExpiryTrigger,
        ) -> Result<Box<dyn ArmedTimer>, TimerError> {
            *self.trigger.lock().unwrap() = Some(trigger);
            Ok(Box::new(ManualTimer))
        }
    }

    impl Manual {
        fn fire(&self) -> bool {
            self.trigger.lock().unwrap().as_ref().unwrap().fire()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_expires_after_deadline() {
        let supervisor = TimeoutSupervisor::start(&TokioTimers, DEADLINE);
        assert_eq!(supervisor.status(), TimeoutStatus::Armed);

        tokio::time::sleep(DEADLINE - Duration::from_millis(1)).await;
        assert!(!supervisor.is_expired());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(supervisor.is_expired());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_expiry() {
        let mut supervisor = TimeoutSupervisor::start(&TokioTimers, DEADLINE);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(supervisor.cancel());

        tokio::time::sleep(DEADLINE * 2).await;
        assert_eq!(supervisor.status(), TimeoutStatus::Cancelled);
        assert!(!supervisor.is_expired());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_is_idempotent() {
        let mut supervisor = TimeoutSupervisor::start(&TokioTimers, DEADLINE);

        assert!(supervisor.cancel());
        assert!(!supervisor.cancel());
        assert!(!supervisor.cancel());
        assert_eq!(supervisor.status(), TimeoutStatus::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_after_expiry_is_noop() {
        let mut supervisor = TimeoutSupervisor::start(&TokioTimers, DEADLINE);
        tokio::time::sleep(DEADLINE + Duration::from_millis(1)).await;

        assert!(supervisor.is_expired());
        assert!(!supervisor.cancel());
        assert!(supervisor.is_expired());
    }

    #[test]
    fn test_fire_after_cancel_does_not_expire() {
        let timers = Manual::default();
        let mut supervisor = TimeoutSupervisor::start(&timers, DEADLINE);

        assert!(supervisor.cancel());
        assert!(!timers.fire());
        assert_eq!(supervisor.status(), TimeoutStatus::Cancelled);
    }

    #[test]
    fn test_fire_twice_expires_once() {
        let timers = Manual::default();
        let supervisor = TimeoutSupervisor::start(&timers, DEADLINE);

        assert!(timers.fire());
        assert!(!timers.fire());
        assert!(supervisor.is_expired());
    }

    #[test]
    fn test_arm_failure_reports_expired() {
        let mut supervisor = TimeoutSupervisor::start(&Exhausted, DEADLINE);

        assert!(supervisor.is_expired());
        assert!(!supervisor.cancel());
        assert!(supervisor.is_expired());
    }

    #[test]
    fn test_no_runtime_reports_expired() {
        // Outside a Tokio runtime the timer cannot be spawned
        let supervisor = TimeoutSupervisor::start(&TokioTimers, DEADLINE);
        assert!(supervisor.is_expired());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(TimeoutStatus::Armed.to_string(), "armed");
        assert_eq!(TimeoutStatus::Expired.to_string(), "expired");
        assert_eq!(TimeoutStatus::Cancelled.to_string(), "cancelled");
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_disarms_timer() {
        let supervisor = TimeoutSupervisor::start(&TokioTimers, DEADLINE);
        let state = Arc::clone(&supervisor.state);
        drop(supervisor);

        tokio::time::sleep(DEADLINE * 2).await;
        assert_eq!(state.load(Ordering::Acquire), ARMED);
    }
}
