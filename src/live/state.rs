use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard},
};

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

use crate::{command::OutputCommand, mux::StatusSnapshot, util::DateTimeExt};

use super::process::error::LiveMuxProcessFatalError;

/// Lifecycle of the live multiplexer's diagnostics process.
#[derive(Debug, Clone)]
pub enum LiveMuxStatus {
    /// [`LiveMuxEngine::start`](crate::live::LiveMuxEngine::start) has not been called yet.
    NotStarted,
    /// The diagnostics process is running.
    Running,
    ShutdownInitiated,
    Shutdown,
    /// The diagnostics process terminated due to a fatal error.
    Terminated(Arc<LiveMuxProcessFatalError>),
}

impl LiveMuxStatus {
    /// Returns `true` once the diagnostics process is gone, shut down or terminated.
    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::Shutdown | Self::Terminated(_))
    }
}

impl fmt::Display for LiveMuxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "Not started"),
            Self::Running => write!(f, "Running"),
            Self::ShutdownInitiated => write!(f, "Shutdown initiated"),
            Self::Shutdown => write!(f, "Shutdown"),
            Self::Terminated(error) => write!(f, "Terminated: {error}"),
        }
    }
}

impl From<LiveMuxProcessFatalError> for LiveMuxStatus {
    fn from(value: LiveMuxProcessFatalError) -> Self {
        Self::Terminated(Arc::new(value))
    }
}

/// A command forwarded to the motion controller, along with the source that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct MuxOutput {
    pub source: String,
    pub command: OutputCommand,
}

/// Periodic health report of the multiplexer.
#[derive(Debug, Clone, PartialEq)]
pub struct MuxDiagnostics {
    /// Wall-clock time at which the report was built.
    pub time: DateTime<Utc>,
    pub snapshot: StatusSnapshot,
}

impl MuxDiagnostics {
    pub(crate) fn new(snapshot: StatusSnapshot) -> Self {
        Self {
            time: Utc::now(),
            snapshot,
        }
    }
}

impl fmt::Display for MuxDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "time: {}", self.time.format_local_millis())?;
        write!(f, "{}", self.snapshot)
    }
}

/// Update events emitted by the live multiplexer.
#[derive(Debug, Clone)]
pub enum LiveMuxUpdate {
    /// Status of the live multiplexer has changed.
    Status(LiveMuxStatus),
    /// A command won arbitration and was forwarded.
    Command(MuxOutput),
    /// A periodic diagnostics report.
    Diagnostics(Arc<MuxDiagnostics>),
}

impl From<LiveMuxStatus> for LiveMuxUpdate {
    fn from(value: LiveMuxStatus) -> Self {
        Self::Status(value)
    }
}

impl From<MuxOutput> for LiveMuxUpdate {
    fn from(value: MuxOutput) -> Self {
        Self::Command(value)
    }
}

pub(crate) type LiveMuxTransmitter = broadcast::Sender<LiveMuxUpdate>;

/// Receiver for subscribing to [`LiveMuxUpdate`]s.
pub type LiveMuxReceiver = broadcast::Receiver<LiveMuxUpdate>;

/// Trait for reading the live multiplexer status and subscribing to updates.
///
/// Provides a read-only interface, without the ability to feed commands or stop the process.
pub trait LiveMuxReader: Send + Sync + 'static {
    /// Creates a new [`LiveMuxReceiver`] for subscribing to updates.
    fn update_receiver(&self) -> LiveMuxReceiver;

    /// Returns the current [`LiveMuxStatus`] as a snapshot.
    fn status_snapshot(&self) -> LiveMuxStatus;
}

#[derive(Debug)]
pub(crate) struct LiveMuxStatusManager {
    status: Mutex<LiveMuxStatus>,
    update_tx: LiveMuxTransmitter,
}

impl LiveMuxStatusManager {
    pub fn new(update_tx: LiveMuxTransmitter) -> Arc<Self> {
        let status = Mutex::new(LiveMuxStatus::NotStarted);

        Arc::new(Self { status, update_tx })
    }

    fn lock_status(&self) -> MutexGuard<'_, LiveMuxStatus> {
        self.status
            .lock()
            .expect("`LiveMuxStatusManager` mutex can't be poisoned")
    }

    pub fn update(&self, new_status: LiveMuxStatus) {
        let mut status_guard = self.lock_status();
        *status_guard = new_status.clone();
        drop(status_guard);

        // Ignore no-receivers errors
        let _ = self.update_tx.send(new_status.into());
    }
}

impl LiveMuxReader for LiveMuxStatusManager {
    fn update_receiver(&self) -> LiveMuxReceiver {
        self.update_tx.subscribe()
    }

    fn status_snapshot(&self) -> LiveMuxStatus {
        self.lock_status().clone()
    }
}
