use std::{result, sync::Arc};

use thiserror::Error;

use crate::mux::error::ArbiterError;

use super::{process::error::LiveMuxProcessFatalError, state::LiveMuxStatus};

#[derive(Error, Debug)]
pub enum LiveMuxError {
    #[error("[Arbiter] {0}")]
    Arbiter(#[from] ArbiterError),

    #[error("Live Mux process already shutdown error")]
    LiveMuxAlreadyShutdown,

    #[error("Live Mux process already terminated error, status: {0}")]
    LiveMuxAlreadyTerminated(LiveMuxStatus),

    #[error("Live Mux shutdown procedure failed: {0}")]
    LiveMuxShutdownFailed(Arc<LiveMuxProcessFatalError>),
}

pub(super) type Result<T> = result::Result<T, LiveMuxError>;
