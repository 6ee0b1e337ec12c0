use std::{
    result,
    sync::{Arc, Mutex, MutexGuard},
};

use tokio::{
    sync::broadcast::{self, error::RecvError},
    time::{self, Instant},
};
use tracing::{error, info};

use crate::{
    command::{OutputCommand, VelocityCommand},
    config::MuxConfig,
    mux::Arbiter,
    util::AbortOnDropHandle,
};

use super::{
    config::{LiveMuxConfig, LiveMuxControllerConfig},
    error::{LiveMuxError, Result},
    process::{self, LiveMuxProcess, error::LiveMuxProcessFatalError},
    state::{
        LiveMuxReader, LiveMuxReceiver, LiveMuxStatus, LiveMuxStatusManager, LiveMuxTransmitter,
        LiveMuxUpdate, MuxDiagnostics, MuxOutput,
    },
};

/// Controller for feeding a running multiplexer and managing its diagnostics process.
///
/// `LiveMuxController` exposes the reception callbacks the transport layer invokes for every
/// incoming velocity command and lock signal. Each callback samples the monotonic clock once and
/// runs the whole arbitration step while holding the arbiter mutex, so concurrent callbacks are
/// serialized and every forwarded command is broadcast in arbitration order.
#[derive(Debug)]
pub struct LiveMuxController {
    config: LiveMuxControllerConfig,
    arbiter: Arc<Mutex<Arbiter>>,
    handle: Mutex<Option<AbortOnDropHandle<()>>>,
    shutdown_tx: broadcast::Sender<()>,
    status_manager: Arc<LiveMuxStatusManager>,
    update_tx: LiveMuxTransmitter,
}

impl LiveMuxController {
    fn new(
        config: &LiveMuxConfig,
        arbiter: Arc<Mutex<Arbiter>>,
        handle: AbortOnDropHandle<()>,
        shutdown_tx: broadcast::Sender<()>,
        status_manager: Arc<LiveMuxStatusManager>,
        update_tx: LiveMuxTransmitter,
    ) -> Arc<Self> {
        Arc::new(Self {
            config: config.into(),
            arbiter,
            handle: Mutex::new(Some(handle)),
            shutdown_tx,
            status_manager,
            update_tx,
        })
    }

    fn lock_arbiter(&self) -> MutexGuard<'_, Arbiter> {
        self.arbiter
            .lock()
            .expect("`Arbiter` mutex can't be poisoned")
    }

    /// Handles a velocity command received from the source registered as `name`.
    ///
    /// Returns the command to forward to the motion controller if `name` currently has priority.
    /// Forwarded commands are also broadcast as [`LiveMuxUpdate::Command`].
    pub fn on_velocity(
        &self,
        name: &str,
        command: impl Into<VelocityCommand>,
    ) -> Result<Option<OutputCommand>> {
        let mut arbiter = self.lock_arbiter();

        let output = arbiter.on_velocity_received(name, command.into(), Instant::now())?;

        if let Some(command) = &output {
            let _ = self.update_tx.send(
                MuxOutput {
                    source: name.to_string(),
                    command: command.clone(),
                }
                .into(),
            );
        }

        Ok(output)
    }

    /// Handles a lock signal received from the lock registered as `name`.
    pub fn on_lock(&self, name: &str, asserted: bool) -> Result<()> {
        self.lock_arbiter()
            .on_lock_received(name, asserted, Instant::now())?;

        Ok(())
    }

    /// Builds a diagnostics report on demand.
    pub fn diagnostics(&self) -> MuxDiagnostics {
        process::build_diagnostics(&self.arbiter)
    }

    /// Returns a [`LiveMuxReader`] interface for accessing status and updates.
    pub fn reader(&self) -> Arc<dyn LiveMuxReader> {
        self.status_manager.clone()
    }

    /// Creates a new [`LiveMuxReceiver`] for subscribing to status updates, forwarded commands and
    /// diagnostics reports.
    pub fn update_receiver(&self) -> LiveMuxReceiver {
        self.status_manager.update_receiver()
    }

    /// Returns the current [`LiveMuxStatus`] as a snapshot.
    pub fn status_snapshot(&self) -> LiveMuxStatus {
        self.status_manager.status_snapshot()
    }

    fn try_consume_handle(&self) -> Option<AbortOnDropHandle<()>> {
        self.handle
            .lock()
            .expect("`LiveMuxController` mutex can't be poisoned")
            .take()
    }

    /// Stops the diagnostics process and consumes the task handle.
    ///
    /// If the process does not stop within the shutdown timeout, it is aborted. Only the first
    /// call can succeed. The reception callbacks keep arbitrating after shutdown.
    pub async fn shutdown(&self) -> Result<()> {
        let Some(handle) = self.try_consume_handle() else {
            return Err(LiveMuxError::LiveMuxAlreadyShutdown);
        };

        if handle.is_finished() {
            let status = self.status_manager.status_snapshot();
            return Err(LiveMuxError::LiveMuxAlreadyTerminated(status));
        }

        self.status_manager.update(LiveMuxStatus::ShutdownInitiated);

        if let Err(e) = self.stop_process(handle).await {
            error!(error = %e, "live mux shutdown failed");

            let e = Arc::new(e);
            self.status_manager
                .update(LiveMuxStatus::Terminated(e.clone()));

            return Err(LiveMuxError::LiveMuxShutdownFailed(e));
        }

        info!("live mux shut down");

        self.status_manager.update(LiveMuxStatus::Shutdown);
        Ok(())
    }

    /// Signals the process and waits for it to exit. Dropping `handle` aborts the task, so any
    /// early return leaves no task behind.
    async fn stop_process(
        &self,
        handle: AbortOnDropHandle<()>,
    ) -> result::Result<(), LiveMuxProcessFatalError> {
        self.shutdown_tx
            .send(())
            .map_err(LiveMuxProcessFatalError::SendShutdownSignalFailed)?;

        match time::timeout(self.config.shutdown_timeout(), handle).await {
            Ok(join_res) => join_res.map_err(LiveMuxProcessFatalError::LiveMuxProcessTaskJoin),
            Err(_) => Err(LiveMuxProcessFatalError::ShutdownTimeout),
        }
    }

    /// Waits until the diagnostics process has stopped and returns the final status.
    pub async fn until_stopped(&self) -> LiveMuxStatus {
        let mut update_rx = self.update_receiver();

        loop {
            let status = self.status_snapshot();
            if status.is_stopped() {
                return status;
            }

            match update_rx.recv().await {
                Ok(LiveMuxUpdate::Status(status)) if status.is_stopped() => return status,
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => return self.status_snapshot(),
            }
        }
    }
}

/// Builder for configuring and starting a live multiplexer.
///
/// `LiveMuxEngine` registers every source and lock of a [`MuxConfig`] into an [`Arbiter`]. The
/// diagnostics process is spawned when [`start`](Self::start) is called, and a
/// [`LiveMuxController`] is returned for feeding commands and managing the process.
pub struct LiveMuxEngine {
    config: LiveMuxConfig,
    arbiter: Arbiter,
    status_manager: Arc<LiveMuxStatusManager>,
    update_tx: LiveMuxTransmitter,
}

impl LiveMuxEngine {
    /// Creates a new live multiplexer engine for the given sources and locks.
    pub fn new(config: impl Into<LiveMuxConfig>, mux_config: &MuxConfig) -> Result<Self> {
        let config = config.into();

        let arbiter = Arbiter::from_config(mux_config)?;

        let (update_tx, _) = broadcast::channel::<LiveMuxUpdate>(config.update_channel_capacity());

        let status_manager = LiveMuxStatusManager::new(update_tx.clone());

        Ok(Self {
            config,
            arbiter,
            status_manager,
            update_tx,
        })
    }

    /// Returns a reader interface for accessing status and updates.
    pub fn reader(&self) -> Arc<dyn LiveMuxReader> {
        self.status_manager.clone()
    }

    /// Creates a new receiver for subscribing to status updates, forwarded commands and
    /// diagnostics reports.
    pub fn update_receiver(&self) -> LiveMuxReceiver {
        self.status_manager.update_receiver()
    }

    /// Returns the current status as a snapshot.
    pub fn status_snapshot(&self) -> LiveMuxStatus {
        self.status_manager.status_snapshot()
    }

    /// Starts the diagnostics process and returns a [`LiveMuxController`] for managing it.
    ///
    /// This consumes the engine and spawns the diagnostics task in the background.
    pub fn start(self) -> Arc<LiveMuxController> {
        info!(
            velocity_sources = self.arbiter.velocity_handles().len(),
            locks = self.arbiter.lock_handles().len(),
            output = %self.arbiter.output_mode().kind(),
            "starting live mux"
        );

        let (shutdown_tx, _) = broadcast::channel::<()>(1);

        let arbiter = Arc::new(Mutex::new(self.arbiter));

        let handle = LiveMuxProcess::spawn(
            &self.config,
            arbiter.clone(),
            &shutdown_tx,
            self.status_manager.clone(),
            self.update_tx.clone(),
        );

        self.status_manager.update(LiveMuxStatus::Running);

        LiveMuxController::new(
            &self.config,
            arbiter,
            handle,
            shutdown_tx,
            self.status_manager,
            self.update_tx,
        )
    }
}
