use std::result;

use thiserror::Error;

use crate::command::CommandKind;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArbiterError {
    #[error("Unknown velocity source `{0}`")]
    UnknownVelocitySource(String),

    #[error("Unknown lock `{0}`")]
    UnknownLockSource(String),

    #[error("Velocity source `{0}` is already registered")]
    DuplicateVelocitySource(String),

    #[error("Lock `{0}` is already registered")]
    DuplicateLockSource(String),

    #[error("Velocity source `{source_name}` expects {expected} commands, received {found}")]
    RepresentationMismatch {
        source_name: String,
        expected: CommandKind,
        found: CommandKind,
    },
}

pub(crate) type Result<T> = result::Result<T, ArbiterError>;
