#![doc = include_str!("../README.md")]

/// Exports [`Twist`], [`VelocityCommand`], and the other velocity command payloads.
///
/// [`Twist`]: crate::command::Twist
/// [`VelocityCommand`]: crate::command::VelocityCommand
pub mod command;
/// Exports [`MuxConfig`] and the per-source configuration types, along with JSON loading.
///
/// [`MuxConfig`]: crate::config::MuxConfig
pub mod config;
/// Exports [`LiveMuxEngine`], [`LiveMuxController`], and other types related to running the
/// multiplexer with periodic diagnostics.
///
/// [`LiveMuxEngine`]: crate::live::LiveMuxEngine
/// [`LiveMuxController`]: crate::live::LiveMuxController
pub mod live;
/// Exports the [`Arbiter`] and the source handles it arbitrates between.
///
/// [`Arbiter`]: crate::mux::Arbiter
pub mod mux;
mod shared;
mod util;

/// Error types returned by `twistmux`.
pub mod error {
    pub use super::config::error::ConfigError;
    pub use super::live::{error::LiveMuxError, process::error::LiveMuxProcessFatalError};
    pub use super::mux::error::ArbiterError;
    pub use super::shared::error::{PriorityValidationError, TimeoutValidationError};

    /// Convenience general-purpose Result type alias.
    pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
}

/// Exports shared validated configuration types.
pub mod models {
    pub use super::shared::{Priority, Timeout};
}
