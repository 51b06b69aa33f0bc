//! Single-slot mailbox between the sensing loop and the consumer loop.
//!
//! The mailbox holds at most one [`SensorEvent`]. Sending never waits: if the
//! slot is still occupied the new event is dropped and the sender moves on.
//! The receiver waits for as long as it takes for an event to arrive.
//!
//! ```text
//! ┌───────────────┐  send (drop on full)  ┌──────┐  recv (waits)  ┌───────────────┐
//! │ SensorMonitor │──────────────────────►│ slot │───────────────►│ consumer loop │
//! └───────────────┘                       └──────┘                └───────────────┘
//! ```
//!
//! Dropping an event never desynchronizes anything: the channel mode inside
//! the monitor has already toggled and stays authoritative, the consumer just
//! never hears about that edge.

use tokio::sync::mpsc;
use tracing::debug;

use toolpanel_core::SensorEvent;

/// Result of offering an event to the mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The slot was free and now holds the event.
    Delivered,

    /// The slot was occupied; the event was discarded.
    Dropped,

    /// The receiver is gone; the event was discarded.
    Closed,
}

/// Create a mailbox, returning its two ends.
///
/// # Examples
///
/// ```
/// use toolpanel_core::{OperationKind, PositionId, SensorEvent};
/// use toolpanel_hardware::mailbox::{self, SendOutcome};
///
/// let (tx, mut rx) = mailbox::channel();
/// let event = SensorEvent::new(PositionId::new("1").unwrap(), OperationKind::Take);
///
/// assert_eq!(tx.send(event.clone()), SendOutcome::Delivered);
/// assert_eq!(tx.send(event.clone()), SendOutcome::Dropped);
/// assert_eq!(rx.try_recv(), Some(event));
/// assert_eq!(rx.try_recv(), None);
/// ```
pub fn channel() -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::channel(1);
    (EventSender { tx }, EventReceiver { rx })
}

/// Producer end of the mailbox.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::Sender<SensorEvent>,
}

impl EventSender {
    /// Offer an event without waiting.
    pub fn send(&self, event: SensorEvent) -> SendOutcome {
        match self.tx.try_send(event) {
            Ok(()) => SendOutcome::Delivered,
            Err(mpsc::error::TrySendError::Full(event)) => {
                debug!(%event, "mailbox full, event dropped");
                SendOutcome::Dropped
            }
            Err(mpsc::error::TrySendError::Closed(_)) => SendOutcome::Closed,
        }
    }

    /// Check whether the receiving end has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer end of the mailbox.
#[derive(Debug)]
pub struct EventReceiver {
    rx: mpsc::Receiver<SensorEvent>,
}

impl EventReceiver {
    /// Wait for the next event.
    ///
    /// Returns `None` once every sender has been dropped and the slot is
    /// empty.
    pub async fn recv(&mut self) -> Option<SensorEvent> {
        self.rx.recv().await
    }

    /// Take the pending event, if any, without waiting.
    pub fn try_recv(&mut self) -> Option<SensorEvent> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use toolpanel_core::{OperationKind, PositionId};

    fn event(position: &str, kind: OperationKind) -> SensorEvent {
        SensorEvent::new(PositionId::new(position).unwrap(), kind)
    }

    #[test]
    fn test_send_to_empty_slot() {
        let (tx, mut rx) = channel();
        assert!(rx.try_recv().is_none());
        let sent = event("1", OperationKind::Take);
        assert_eq!(tx.send(sent.clone()), SendOutcome::Delivered);
        assert_eq!(rx.try_recv(), Some(sent));
    }

    #[test]
    fn test_full_slot_keeps_first_event() {
        let (tx, mut rx) = channel();
        let first = event("1", OperationKind::Take);
        let second = event("2", OperationKind::Return);

        assert_eq!(tx.send(first.clone()), SendOutcome::Delivered);
        assert_eq!(tx.send(second), SendOutcome::Dropped);

        assert_eq!(rx.try_recv(), Some(first));
        assert_eq!(rx.try_recv(), None);
    }

    #[test]
    fn test_slot_frees_after_receive() {
        let (tx, mut rx) = channel();
        tx.send(event("1", OperationKind::Take));
        rx.try_recv().unwrap();

        let next = event("1", OperationKind::Return);
        assert_eq!(tx.send(next.clone()), SendOutcome::Delivered);
        assert_eq!(rx.try_recv(), Some(next));
    }

    #[test]
    fn test_send_after_receiver_dropped() {
        let (tx, rx) = channel();
        drop(rx);
        assert!(tx.is_closed());
        assert_eq!(tx.send(event("1", OperationKind::Take)), SendOutcome::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recv_waits_for_event() {
        let (tx, mut rx) = channel();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(60)).await;
            tx.send(event("3", OperationKind::Take));
        });

        let received = rx.recv().await.unwrap();
        assert_eq!(received.position.as_str(), "3");
    }

    #[tokio::test]
    async fn test_recv_ends_when_senders_dropped() {
        let (tx, mut rx) = channel();
        tx.send(event("1", OperationKind::Take));
        drop(tx);

        assert!(rx.recv().await.is_some());
        assert!(rx.recv().await.is_none());
    }
}
