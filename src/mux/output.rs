use tokio::time::Instant;

use crate::command::{CommandKind, OutputCommand, TwistStamped, VelocityCommand};

/// Representation of the commands forwarded to the motion controller.
///
/// Resolved once at startup and fixed for the lifetime of the multiplexer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Forward bare [`Twist`](crate::command::Twist) payloads.
    #[default]
    Bare,
    /// Forward [`TwistStamped`] records. Bare inputs are framed with the reception instant and
    /// `frame_id`, which may be empty.
    Timestamped { frame_id: String },
}

impl OutputMode {
    pub fn from_stamped_flag(output_stamped: bool, frame_id: impl Into<String>) -> Self {
        if output_stamped {
            Self::Timestamped {
                frame_id: frame_id.into(),
            }
        } else {
            Self::Bare
        }
    }

    pub fn kind(&self) -> CommandKind {
        match self {
            Self::Bare => CommandKind::Bare,
            Self::Timestamped { .. } => CommandKind::Timestamped,
        }
    }
}

/// Translates the winning source's command into the configured output representation.
///
/// | Source      | Output      | Result                                      |
/// |-------------|-------------|---------------------------------------------|
/// | timestamped | timestamped | pass-through                                |
/// | timestamped | bare        | frame and stamp dropped, payload kept       |
/// | bare        | timestamped | payload framed with `now` and the frame id  |
/// | bare        | bare        | pass-through                                |
#[derive(Debug, Clone)]
pub struct OutputAdapter {
    mode: OutputMode,
}

impl OutputAdapter {
    pub fn new(mode: OutputMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> &OutputMode {
        &self.mode
    }

    pub fn adapt(&self, command: VelocityCommand, now: Instant) -> OutputCommand {
        match (&self.mode, command) {
            (OutputMode::Timestamped { .. }, stamped @ VelocityCommand::Timestamped(_)) => stamped,
            (OutputMode::Bare, VelocityCommand::Timestamped(stamped)) => {
                VelocityCommand::Bare(stamped.twist)
            }
            (OutputMode::Timestamped { frame_id }, VelocityCommand::Bare(twist)) => {
                VelocityCommand::Timestamped(TwistStamped::new(now, frame_id.clone(), twist))
            }
            (OutputMode::Bare, bare @ VelocityCommand::Bare(_)) => bare,
        }
    }
}
