//! Station orchestration.
//!
//! A [`Station`] owns the peripherals and runs two tasks on the current Tokio
//! runtime:
//!
//! ```text
//! ┌────────────────┐   mailbox (1 slot,   ┌─────────────────┐
//! │ SensorMonitor  │   drop-on-full)      │  Consumer loop  │
//! │ every 500 ms   │─────────────────────►│                 │
//! └────────────────┘                      │  EntrySession   │──► KeypadScanner
//!                                         │  (50 ms scans)  │
//!                                         │        │        │
//!                                         │        ▼        │
//!                                         │ RequestDispatcher──► AuthTransport
//!                                         └─────────────────┘     Buzzer
//! ```
//!
//! The consumer runs at most one session at a time. An edge recognized while
//! a session is running waits in the mailbox; further edges are dropped until
//! the consumer returns to receive.
//!
//! # Examples
//!
//! ```no_run
//! use toolpanel_hardware::mock::{MockAnalog, MockBuzzer, MockMatrix};
//! use toolpanel_network::mock::MockTransport;
//! use toolpanel_station::{Station, StationConfig};
//!
//! #[tokio::main]
//! async fn main() -> toolpanel_station::Result<()> {
//!     let (analog, _sensors) = MockAnalog::new();
//!     let (matrix, _keys) = MockMatrix::new();
//!     let (buzzer, _) = MockBuzzer::new();
//!     let (transport, _) = MockTransport::new();
//!
//!     let station = Station::new(StationConfig::default(), analog, matrix, transport, buzzer)?;
//!     let mut handle = station.start();
//!
//!     while let Some(report) = handle.next_report().await {
//!         println!("{} -> {}", report.request.posicao, report.outcome);
//!     }
//!
//!     handle.shutdown().await;
//!     Ok(())
//! }
//! ```

use std::fmt;
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::config::StationConfig;
use crate::dispatcher::{DispatchReport, RequestDispatcher};
use crate::{Result, StationError};
use toolpanel_core::{OperationKind, PositionId, SensorEvent};
use toolpanel_hardware::default_sensors;
use toolpanel_hardware::keypad::KeypadScanner;
use toolpanel_hardware::mailbox::{self, EventReceiver};
use toolpanel_hardware::sensor::SensorMonitor;
use toolpanel_hardware::traits::{AnalogInput, Buzzer, KeypadMatrix};
use toolpanel_hardware::types::SensorConfig;
use toolpanel_network::AuthTransport;
use toolpanel_session::{EntrySession, TokioTimers};

/// Reports kept for the handle before new ones are dropped.
pub const REPORT_QUEUE_CAPACITY: usize = 32;

/// What the consumer loop is doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StationStatus {
    /// Waiting for a sensor event.
    Idle,

    /// Running an entry session.
    Collecting {
        /// Position whose sensor started the session.
        position: PositionId,

        /// Operation being authorized.
        kind: OperationKind,
    },

    /// Waiting for the authorization service or playing feedback.
    Dispatching {
        /// Position being reported.
        position: PositionId,
    },

    /// The consumer loop has exited.
    Stopped,
}

impl fmt::Display for StationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Collecting { position, kind } => {
                write!(f, "collecting code for {} at position {}", kind, position)
            }
            Self::Dispatching { position } => write!(f, "dispatching position {}", position),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

/// Counts of how the station tasks ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShutdownSummary {
    /// Tasks that returned `Ok`.
    pub completed: usize,

    /// Tasks that returned an error.
    pub failed: usize,

    /// Tasks aborted by the shutdown.
    pub cancelled: usize,

    /// Tasks that panicked.
    pub panicked: usize,
}

/// Task termination classification for shutdown handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskTermination {
    /// Task completed successfully.
    Success,
    /// Task returned an error.
    Error,
    /// Task was cancelled (expected during shutdown).
    Cancelled,
    /// Task panicked.
    Panic,
}

/// Handle to a running station.
///
/// The handle owns both tasks: dropping it aborts the station. Keep it alive
/// for as long as the station should run and end it with
/// [`shutdown`](Self::shutdown).
///
/// Up to [`REPORT_QUEUE_CAPACITY`] reports wait for
/// [`next_report`](Self::next_report); later ones are dropped until the queue
/// is drained.
#[must_use = "dropping the handle aborts the station"]
pub struct StationHandle {
    tasks: JoinSet<Result<()>>,
    reports: mpsc::Receiver<DispatchReport>,
    status: watch::Receiver<StationStatus>,
}

impl StationHandle {
    /// Wait for the next dispatched session.
    ///
    /// Returns `None` once the consumer loop has exited.
    pub async fn next_report(&mut self) -> Option<DispatchReport> {
        self.reports.recv().await
    }

    /// Current consumer state.
    pub fn status(&self) -> StationStatus {
        self.status.borrow().clone()
    }

    /// Abort both tasks and wait for them to end.
    ///
    /// An in-flight authorization request is dropped with its task.
    pub async fn shutdown(mut self) -> ShutdownSummary {
        self.tasks.abort_all();

        let mut summary = ShutdownSummary::default();
        while let Some(result) = self.tasks.join_next().await {
            match Self::classify_task_result(result) {
                TaskTermination::Success => summary.completed += 1,
                TaskTermination::Error => summary.failed += 1,
                TaskTermination::Cancelled => summary.cancelled += 1,
                TaskTermination::Panic => summary.panicked += 1,
            }
        }

        if summary.failed + summary.panicked > 0 {
            warn!(
                failed = summary.failed,
                panicked = summary.panicked,
                "station tasks ended abnormally"
            );
        }
        info!(?summary, "station stopped");
        summary
    }

    fn classify_task_result(
        result: std::result::Result<Result<()>, tokio::task::JoinError>,
    ) -> TaskTermination {
        match result {
            Ok(Ok(())) => TaskTermination::Success,
            Ok(Err(e)) => {
                error!(error = %e, "station task failed");
                TaskTermination::Error
            }
            Err(e) if e.is_cancelled() => TaskTermination::Cancelled,
            Err(e) => {
                error!(error = %e, "station task panicked");
                TaskTermination::Panic
            }
        }
    }
}

/// A configured station, ready to start.
pub struct Station<A, M, T, B> {
    config: StationConfig,
    sensors: Vec<SensorConfig>,
    analog: A,
    matrix: M,
    dispatcher: RequestDispatcher<T, B>,
}

impl<A, M, T, B> Station<A, M, T, B>
where
    A: AnalogInput + 'static,
    M: KeypadMatrix + 'static,
    T: AuthTransport + 'static,
    B: Buzzer + 'static,
{
    /// Assemble a station over the default sensor table.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration does not validate.
    pub fn new(
        config: StationConfig,
        analog: A,
        matrix: M,
        transport: T,
        buzzer: B,
    ) -> Result<Self> {
        config.validate()?;

        let dispatcher = RequestDispatcher::new(transport, buzzer).with_feedback(config.buzzer);
        Ok(Self {
            config,
            sensors: default_sensors(),
            analog,
            matrix,
            dispatcher,
        })
    }

    /// Replace the sensor table.
    ///
    /// # Errors
    ///
    /// Returns an error if the table is empty or maps two positions to one
    /// channel.
    pub fn with_sensors(mut self, sensors: Vec<SensorConfig>) -> Result<Self> {
        if sensors.is_empty() {
            return Err(StationError::config("sensor table is empty"));
        }
        for (i, sensor) in sensors.iter().enumerate() {
            if sensors[..i].iter().any(|s| s.channel == sensor.channel) {
                return Err(StationError::config(format!(
                    "channel {} is assigned twice",
                    sensor.channel
                )));
            }
        }
        self.sensors = sensors;
        Ok(self)
    }

    /// Sensor table in use.
    pub fn sensors(&self) -> &[SensorConfig] {
        &self.sensors
    }

    /// Spawn the sensing and consumer tasks.
    ///
    /// Must be called from within a Tokio runtime. The tasks run until the
    /// returned handle is shut down or dropped.
    #[must_use = "dropping the handle aborts the station"]
    pub fn start(self) -> StationHandle {
        let (events_tx, events_rx) = mailbox::channel();
        let (reports_tx, reports_rx) = mpsc::channel(REPORT_QUEUE_CAPACITY);
        let (status_tx, status_rx) = watch::channel(StationStatus::Idle);

        let monitor = SensorMonitor::new(self.analog, self.sensors, events_tx)
            .with_zero_threshold(self.config.zero_threshold)
            .with_poll_interval(self.config.sensor_poll_interval());

        let consumer = Consumer {
            events: events_rx,
            scanner: KeypadScanner::new(self.matrix),
            dispatcher: self.dispatcher,
            scan_interval: self.config.keypad_scan_interval(),
            entry_timeout: self.config.entry_timeout(),
            reports: reports_tx,
            status: status_tx,
        };

        let mut tasks = JoinSet::new();
        tasks.spawn(async move { monitor.run().await.map_err(StationError::from) });
        tasks.spawn(consumer.run());

        info!(
            endpoint = %self.config.endpoint,
            entry_timeout_ms = self.config.entry_timeout_ms,
            "station started"
        );

        StationHandle {
            tasks,
            reports: reports_rx,
            status: status_rx,
        }
    }
}

/// The consumer side: one session at a time, then dispatch.
struct Consumer<M, T, B> {
    events: EventReceiver,
    scanner: KeypadScanner<M>,
    dispatcher: RequestDispatcher<T, B>,
    scan_interval: Duration,
    entry_timeout: Duration,
    reports: mpsc::Sender<DispatchReport>,
    status: watch::Sender<StationStatus>,
}

impl<M, T, B> Consumer<M, T, B>
where
    M: KeypadMatrix,
    T: AuthTransport,
    B: Buzzer,
{
    async fn run(mut self) -> Result<()> {
        while let Some(event) = self.events.recv().await {
            if !event.success {
                debug!(position = %event.position, "unsuccessful sensor event ignored");
                continue;
            }

            let report = self.handle(event).await;
            match self.reports.try_send(report) {
                Ok(()) => {}
                Err(TrySendError::Full(report)) => {
                    debug!(
                        position = %report.request.posicao,
                        "report queue full, report dropped"
                    );
                }
                Err(TrySendError::Closed(_)) => debug!("report receiver gone, report discarded"),
            }
            self.status.send_replace(StationStatus::Idle);
        }

        info!("mailbox closed, consumer loop stopping");
        self.status.send_replace(StationStatus::Stopped);
        Ok(())
    }

    async fn handle(&mut self, event: SensorEvent) -> DispatchReport {
        self.status.send_replace(StationStatus::Collecting {
            position: event.position.clone(),
            kind: event.kind,
        });

        let mut session = EntrySession::start(event, &TokioTimers, self.entry_timeout);
        let resolution = session.run(&mut self.scanner, self.scan_interval).await;
        let (event, mut timeout) = session.into_parts();

        self.status.send_replace(StationStatus::Dispatching {
            position: event.position.clone(),
        });
        self.dispatcher.dispatch(&event, &resolution, &mut timeout).await
    }
}
