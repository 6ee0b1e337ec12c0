use std::{io, path::PathBuf, result};

use thiserror::Error;

use crate::shared::error::{PriorityValidationError, TimeoutValidationError};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file `{}`: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Source and lock names must not be empty")]
    EmptyName,

    #[error("Topic of `{name}` must not be empty")]
    EmptyTopic { name: String },

    #[error("Duplicate velocity source name `{0}`")]
    DuplicateVelocitySource(String),

    #[error("Duplicate lock name `{0}`")]
    DuplicateLockSource(String),

    #[error("Invalid priority for `{name}`: {source}")]
    InvalidPriority {
        name: String,
        source: PriorityValidationError,
    },

    #[error("Invalid timeout for `{name}`: {source}")]
    InvalidTimeout {
        name: String,
        source: TimeoutValidationError,
    },
}

pub(crate) type ConfigResult<T> = result::Result<T, ConfigError>;
