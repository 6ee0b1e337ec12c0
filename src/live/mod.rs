mod config;
mod engine;
pub(crate) mod error;
pub(crate) mod process;
mod state;

pub use config::LiveMuxConfig;
pub use engine::{LiveMuxController, LiveMuxEngine};
pub use state::{
    LiveMuxReader, LiveMuxReceiver, LiveMuxStatus, LiveMuxUpdate, MuxDiagnostics, MuxOutput,
};

#[cfg(test)]
mod tests;
