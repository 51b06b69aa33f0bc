//! Presence sensing and take/return edge detection.
//!
//! Each tool position has an analog presence sensor. The [`SensorMonitor`]
//! samples every channel on a fixed interval, classifies each reading as
//! zero (tool absent) or nonzero (tool present), and tracks per channel which
//! edge it is waiting for:
//!
//! | Mode             | Reading | Result                                   |
//! |------------------|---------|------------------------------------------|
//! | `AwaitingTake`   | zero    | emit take, switch to `AwaitingReturn`    |
//! | `AwaitingReturn` | nonzero | emit return, switch to `AwaitingTake`    |
//! | anything else    |         | nothing                                  |
//!
//! A level that stays the same over many polls produces a single event at the
//! first poll that sees it.

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};

use crate::Result;
use crate::mailbox::{EventSender, SendOutcome};
use crate::traits::AnalogInput;
use crate::types::{Attenuation, Presence, SensorConfig};
use toolpanel_core::constants::{DEFAULT_ZERO_THRESHOLD, SENSOR_POLL_INTERVAL_MS};
use toolpanel_core::{OperationKind, PositionId, SensorEvent};

/// The sensor table of the station: three positions on ADC unit 1.
#[must_use]
pub fn default_sensors() -> Vec<SensorConfig> {
    [("1", 0), ("2", 3), ("3", 6)]
        .into_iter()
        .map(|(position, channel)| {
            SensorConfig::new(
                PositionId::new(position).expect("static position ids are valid"),
                channel,
                Attenuation::Db11,
            )
        })
        .collect()
}

/// Which edge a channel is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelMode {
    /// The tool is in place; a zero reading means it was taken.
    AwaitingTake,

    /// The tool is out; a nonzero reading means it was returned.
    AwaitingReturn,
}

/// Edge-detection state of one sensor channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorChannel {
    config: SensorConfig,
    mode: ChannelMode,
    last_outcome: bool,
}

impl SensorChannel {
    /// Create a channel waiting for its tool to be taken.
    pub fn new(config: SensorConfig) -> Self {
        Self {
            config,
            mode: ChannelMode::AwaitingTake,
            last_outcome: false,
        }
    }

    /// Static configuration of this channel.
    pub fn config(&self) -> &SensorConfig {
        &self.config
    }

    /// Position watched by this channel.
    pub fn position(&self) -> &PositionId {
        &self.config.position
    }

    /// Edge the channel is currently waiting for.
    pub fn mode(&self) -> ChannelMode {
        self.mode
    }

    /// Whether the most recent observation recognized an edge.
    pub fn last_outcome(&self) -> bool {
        self.last_outcome
    }

    /// Feed one classified reading, returning an event if it completes an edge.
    ///
    /// # Examples
    ///
    /// ```
    /// use toolpanel_core::{OperationKind, PositionId};
    /// use toolpanel_hardware::sensor::{ChannelMode, SensorChannel};
    /// use toolpanel_hardware::types::{Attenuation, Presence, SensorConfig};
    ///
    /// let config = SensorConfig::new(PositionId::new("1").unwrap(), 0, Attenuation::Db11);
    /// let mut channel = SensorChannel::new(config);
    ///
    /// let event = channel.observe(Presence::Zero).unwrap();
    /// assert_eq!(event.kind, OperationKind::Take);
    /// assert_eq!(channel.mode(), ChannelMode::AwaitingReturn);
    ///
    /// // Still absent: no second event
    /// assert!(channel.observe(Presence::Zero).is_none());
    /// ```
    pub fn observe(&mut self, presence: Presence) -> Option<SensorEvent> {
        let kind = match (self.mode, presence) {
            (ChannelMode::AwaitingTake, Presence::Zero) => {
                self.mode = ChannelMode::AwaitingReturn;
                OperationKind::Take
            }
            (ChannelMode::AwaitingReturn, Presence::Nonzero) => {
                self.mode = ChannelMode::AwaitingTake;
                OperationKind::Return
            }
            _ => {
                self.last_outcome = false;
                return None;
            }
        };

        self.last_outcome = true;
        Some(SensorEvent::new(self.config.position.clone(), kind))
    }
}

/// Periodic sampler that turns raw readings into take/return events.
///
/// The monitor is the only owner of the channel state; events leave it by
/// value through the mailbox.
#[derive(Debug)]
pub struct SensorMonitor<A> {
    input: A,
    channels: Vec<SensorChannel>,
    events: EventSender,
    zero_threshold: u16,
    poll_interval: Duration,
}

impl<A: AnalogInput> SensorMonitor<A> {
    /// Create a monitor over the given sensors with default threshold and cadence.
    pub fn new(input: A, sensors: Vec<SensorConfig>, events: EventSender) -> Self {
        Self {
            input,
            channels: sensors.into_iter().map(SensorChannel::new).collect(),
            events,
            zero_threshold: DEFAULT_ZERO_THRESHOLD,
            poll_interval: Duration::from_millis(SENSOR_POLL_INTERVAL_MS),
        }
    }

    /// Set the highest raw reading classified as zero.
    pub fn with_zero_threshold(mut self, zero_threshold: u16) -> Self {
        self.zero_threshold = zero_threshold;
        self
    }

    /// Set the interval between two sweeps.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Read-only view of the channel state.
    pub fn channels(&self) -> &[SensorChannel] {
        &self.channels
    }

    /// Configure every channel on the analog input.
    ///
    /// # Errors
    ///
    /// Returns the first configuration failure.
    pub async fn configure(&mut self) -> Result<()> {
        for channel in &self.channels {
            let config = channel.config();
            self.input
                .configure_channel(config.channel, config.attenuation)
                .await?;
            debug!(
                position = %config.position,
                channel = config.channel,
                attenuation = %config.attenuation,
                "sensor channel configured"
            );
        }
        Ok(())
    }

    /// Sample every channel once and offer any recognized edge to the mailbox.
    ///
    /// Returns the events recognized during this sweep, including the ones
    /// the mailbox dropped. A failed read only skips that channel for this
    /// sweep.
    pub async fn poll_once(&mut self) -> Vec<SensorEvent> {
        let mut recognized = Vec::new();

        for channel in &mut self.channels {
            let config = channel.config();
            let raw = match self.input.read_raw(config.channel).await {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(position = %config.position, error = %e, "sensor misread, skipping");
                    continue;
                }
            };
            trace!(position = %config.position, raw, "sensor reading");

            let presence = Presence::classify(raw, self.zero_threshold);
            if let Some(event) = channel.observe(presence) {
                info!(position = %event.position, kind = %event.kind, "edge recognized");
                if self.events.send(event.clone()) == SendOutcome::Closed {
                    debug!("mailbox closed, event discarded");
                }
                recognized.push(event);
            }
        }

        recognized
    }

    /// Configure the channels, then sweep forever at the poll interval.
    ///
    /// Returns once the consumer end of the mailbox is gone.
    ///
    /// # Errors
    ///
    /// Returns an error if channel configuration fails.
    pub async fn run(mut self) -> Result<()> {
        self.configure().await?;

        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while !self.events.is_closed() {
            ticker.tick().await;
            self.poll_once().await;
        }

        info!("mailbox closed, sensor monitor stopping");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mailbox;
    use crate::mock::MockAnalog;

    fn channel(position: &str) -> SensorChannel {
        SensorChannel::new(SensorConfig::new(
            PositionId::new(position).unwrap(),
            0,
            Attenuation::Db11,
        ))
    }

    #[test]
    fn test_default_sensor_table() {
        let sensors = default_sensors();
        let table: Vec<(&str, u8)> = sensors
            .iter()
            .map(|s| (s.position.as_str(), s.channel))
            .collect();
        assert_eq!(table, vec![("1", 0), ("2", 3), ("3", 6)]);
        assert!(sensors.iter().all(|s| s.attenuation == Attenuation::Db11));
    }

    #[test]
    fn test_channel_starts_awaiting_take() {
        let channel = channel("1");
        assert_eq!(channel.mode(), ChannelMode::AwaitingTake);
        assert!(!channel.last_outcome());
    }

    #[test]
    fn test_take_edge() {
        let mut channel = channel("1");
        let event = channel.observe(Presence::Zero).unwrap();

        assert_eq!(event.position.as_str(), "1");
        assert_eq!(event.kind, OperationKind::Take);
        assert!(event.success);
        assert_eq!(channel.mode(), ChannelMode::AwaitingReturn);
        assert!(channel.last_outcome());
    }

    #[test]
    fn test_present_tool_produces_nothing() {
        let mut channel = channel("1");
        for _ in 0..10 {
            assert!(channel.observe(Presence::Nonzero).is_none());
        }
        assert_eq!(channel.mode(), ChannelMode::AwaitingTake);
        assert!(!channel.last_outcome());
    }

    #[test]
    fn test_sustained_absence_fires_once() {
        let mut channel = channel("2");
        let events: Vec<_> = (0..20)
            .filter_map(|_| channel.observe(Presence::Zero))
            .collect();

        assert_eq!(events.len(), 1);
        assert!(!channel.last_outcome());
        assert_eq!(channel.mode(), ChannelMode::AwaitingReturn);
    }

    #[test]
    fn test_full_cycle() {
        let mut channel = channel("3");
        let readings = [
            Presence::Nonzero,
            Presence::Zero,
            Presence::Zero,
            Presence::Nonzero,
            Presence::Nonzero,
            Presence::Zero,
        ];

        let kinds: Vec<OperationKind> = readings
            .into_iter()
            .filter_map(|p| channel.observe(p))
            .map(|e| e.kind)
            .collect();

        assert_eq!(
            kinds,
            vec![
                OperationKind::Take,
                OperationKind::Return,
                OperationKind::Take
            ]
        );
    }

    #[tokio::test]
    async fn test_poll_once_enqueues_take() {
        let (analog, handle) = MockAnalog::new();
        let (tx, mut rx) = mailbox::channel();
        let mut monitor = SensorMonitor::new(analog, default_sensors(), tx);

        handle.set_all(2048);
        assert!(monitor.poll_once().await.is_empty());
        assert!(rx.try_recv().is_none());

        handle.set_reading(0, 0);
        let recognized = monitor.poll_once().await;
        assert_eq!(recognized.len(), 1);

        let event = rx.try_recv().unwrap();
        assert_eq!(event.position.as_str(), "1");
        assert_eq!(event.kind, OperationKind::Take);
        assert!(event.success);
    }

    #[tokio::test]
    async fn test_poll_once_drops_second_edge_when_full() {
        let (analog, handle) = MockAnalog::new();
        let (tx, mut rx) = mailbox::channel();
        let mut monitor = SensorMonitor::new(analog, default_sensors(), tx);

        handle.set_all(2048);
        handle.set_reading(0, 0);
        handle.set_reading(3, 0);

        let recognized = monitor.poll_once().await;
        assert_eq!(recognized.len(), 2);

        // Only the first edge fits in the slot, but both channels toggled
        assert_eq!(rx.try_recv().unwrap().position.as_str(), "1");
        assert!(rx.try_recv().is_none());
        assert!(
            monitor.channels()[..2]
                .iter()
                .all(|c| c.mode() == ChannelMode::AwaitingReturn)
        );
    }

    #[tokio::test]
    async fn test_poll_once_skips_misread() {
        let (analog, handle) = MockAnalog::new();
        let (tx, mut rx) = mailbox::channel();
        let mut monitor = SensorMonitor::new(analog, default_sensors(), tx);

        handle.set_all(0);
        handle.fail_channel(0);

        let recognized = monitor.poll_once().await;
        let positions: Vec<&str> = recognized.iter().map(|e| e.position.as_str()).collect();
        assert_eq!(positions, vec!["2", "3"]);
        assert_eq!(monitor.channels()[0].mode(), ChannelMode::AwaitingTake);
        assert_eq!(rx.try_recv().unwrap().position.as_str(), "2");
    }

    #[tokio::test]
    async fn test_zero_threshold() {
        let (analog, handle) = MockAnalog::new();
        let (tx, _rx) = mailbox::channel();
        let mut monitor =
            SensorMonitor::new(analog, default_sensors(), tx).with_zero_threshold(100);

        handle.set_all(2048);
        handle.set_reading(6, 80);

        let recognized = monitor.poll_once().await;
        assert_eq!(recognized.len(), 1);
        assert_eq!(recognized[0].position.as_str(), "3");
    }

    #[tokio::test]
    async fn test_configure_applies_attenuation() {
        let (analog, handle) = MockAnalog::new();
        let (tx, _rx) = mailbox::channel();
        let mut monitor = SensorMonitor::new(analog, default_sensors(), tx);

        monitor.configure().await.unwrap();
        assert_eq!(handle.attenuation(0), Some(Attenuation::Db11));
        assert_eq!(handle.attenuation(3), Some(Attenuation::Db11));
        assert_eq!(handle.attenuation(6), Some(Attenuation::Db11));
        assert_eq!(handle.attenuation(1), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_polls_at_interval() {
        let (analog, handle) = MockAnalog::new();
        let (tx, mut rx) = mailbox::channel();
        let monitor = SensorMonitor::new(analog, default_sensors(), tx);

        handle.set_all(2048);
        let task = tokio::spawn(monitor.run());

        tokio::time::sleep(Duration::from_millis(1200)).await;
        assert!(rx.try_recv().is_none());

        handle.set_reading(3, 0);
        let event = rx.recv().await.unwrap();
        assert_eq!(event.position.as_str(), "2");
        assert_eq!(event.kind, OperationKind::Take);

        // Sustained absence over many more polls produces nothing else
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_none());

        drop(rx);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(task.is_finished());
    }
}
