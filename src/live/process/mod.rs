use std::sync::{Arc, Mutex};

use tokio::{
    sync::broadcast,
    time::{self, Instant, MissedTickBehavior},
};
use tracing::{debug, error};

use crate::{
    mux::Arbiter,
    util::{AbortOnDropHandle, Never},
};

use super::{
    config::{LiveMuxConfig, LiveMuxProcessConfig},
    state::{
        LiveMuxStatusManager, LiveMuxTransmitter, LiveMuxUpdate, MuxDiagnostics,
    },
};

pub(crate) mod error;

use error::LiveMuxProcessFatalError;

/// Builds a [`MuxDiagnostics`] report from a single clock sample.
pub(super) fn build_diagnostics(arbiter: &Mutex<Arbiter>) -> MuxDiagnostics {
    let snapshot = arbiter
        .lock()
        .expect("`Arbiter` mutex can't be poisoned")
        .snapshot(Instant::now());

    MuxDiagnostics::new(snapshot)
}

pub(super) struct LiveMuxProcess {
    config: LiveMuxProcessConfig,
    arbiter: Arc<Mutex<Arbiter>>,
    status_manager: Arc<LiveMuxStatusManager>,
    update_tx: LiveMuxTransmitter,
}

impl LiveMuxProcess {
    pub fn spawn(
        config: &LiveMuxConfig,
        arbiter: Arc<Mutex<Arbiter>>,
        shutdown_tx: &broadcast::Sender<()>,
        status_manager: Arc<LiveMuxStatusManager>,
        update_tx: LiveMuxTransmitter,
    ) -> AbortOnDropHandle<()> {
        let process = Self {
            config: config.into(),
            arbiter,
            status_manager,
            update_tx,
        };

        // Subscribed before spawning, so a shutdown request can't be missed
        let shutdown_rx = shutdown_tx.subscribe();

        tokio::spawn(process.shutdown_loop(shutdown_rx)).into()
    }

    async fn run(&self) -> Never {
        let mut interval = time::interval(self.config.diagnostics_period());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;

            let diagnostics = build_diagnostics(&self.arbiter);

            debug!(
                lock_priority = diagnostics.snapshot.lock_priority.as_u32(),
                active_source = diagnostics.snapshot.active_source.as_deref().unwrap_or("none"),
                "mux diagnostics"
            );

            let _ = self
                .update_tx
                .send(LiveMuxUpdate::Diagnostics(Arc::new(diagnostics)));
        }
    }

    async fn shutdown_loop(self, mut shutdown_rx: broadcast::Receiver<()>) {
        tokio::select! {
            never = self.run() => match never {},
            shutdown_res = shutdown_rx.recv() => {
                if let Err(e) = shutdown_res {
                    let e = LiveMuxProcessFatalError::ShutdownSignalRecv(e);
                    error!(error = %e, "live mux process terminated");
                    self.status_manager.update(e.into());
                }
                // Otherwise, the shutdown signal was received
            }
        }
    }
}
