use thiserror::Error;
use tokio::{
    sync::broadcast::error::{RecvError, SendError},
    task::JoinError,
};

#[derive(Error, Debug)]
pub enum LiveMuxProcessFatalError {
    #[error("TaskJoin error {0}")]
    LiveMuxProcessTaskJoin(JoinError),

    #[error("Shutdown `RecvError` error: {0}")]
    ShutdownSignalRecv(RecvError),

    #[error("Failed to send live mux process shutdown request error: {0}")]
    SendShutdownSignalFailed(SendError<()>),

    #[error("Live Mux shutdown timeout error")]
    ShutdownTimeout,
}
