use std::fmt;

use strum::Display;
use tokio::time::Instant;

/// Three-component vector, in the platform's body frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Bare velocity intent: linear and angular velocity components.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Twist {
    pub linear: Vector3,
    pub angular: Vector3,
}

impl Twist {
    pub const fn new(linear: Vector3, angular: Vector3) -> Self {
        Self { linear, angular }
    }

    /// Planar command for differential-drive platforms: forward speed and yaw rate.
    pub const fn planar(linear_x: f64, angular_z: f64) -> Self {
        Self::new(
            Vector3::new(linear_x, 0.0, 0.0),
            Vector3::new(0.0, 0.0, angular_z),
        )
    }
}

impl fmt::Display for Twist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "linear: ({:.3}, {:.3}, {:.3}), angular: ({:.3}, {:.3}, {:.3})",
            self.linear.x,
            self.linear.y,
            self.linear.z,
            self.angular.x,
            self.angular.y,
            self.angular.z
        )
    }
}

/// Velocity intent framed with its own time stamp and reference frame.
///
/// `stamp` lives in the same monotonic clock domain as the multiplexer. Converting wire time
/// stamps into that domain is up to the transport delivering the commands.
#[derive(Debug, Clone, PartialEq)]
pub struct TwistStamped {
    pub stamp: Instant,
    pub frame_id: String,
    pub twist: Twist,
}

impl TwistStamped {
    pub fn new(stamp: Instant, frame_id: impl Into<String>, twist: Twist) -> Self {
        Self {
            stamp,
            frame_id: frame_id.into(),
            twist,
        }
    }
}

/// Shape of a velocity command, fixed per source at registration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum CommandKind {
    Bare,
    Timestamped,
}

impl CommandKind {
    pub fn from_stamped_flag(stamped: bool) -> Self {
        if stamped {
            Self::Timestamped
        } else {
            Self::Bare
        }
    }
}

/// A velocity command, as received from a source or as forwarded to the motion controller.
#[derive(Debug, Clone, PartialEq)]
pub enum VelocityCommand {
    Bare(Twist),
    Timestamped(TwistStamped),
}

/// Command forwarded to the motion controller. Its shape always matches the configured
/// [`OutputMode`](crate::mux::OutputMode).
pub type OutputCommand = VelocityCommand;

impl VelocityCommand {
    pub fn kind(&self) -> CommandKind {
        match self {
            Self::Bare(_) => CommandKind::Bare,
            Self::Timestamped(_) => CommandKind::Timestamped,
        }
    }

    /// Returns the velocity payload, regardless of framing.
    pub fn twist(&self) -> &Twist {
        match self {
            Self::Bare(twist) => twist,
            Self::Timestamped(stamped) => &stamped.twist,
        }
    }

    /// Returns the intrinsic time stamp, if the command carries one.
    pub fn stamp(&self) -> Option<Instant> {
        match self {
            Self::Bare(_) => None,
            Self::Timestamped(stamped) => Some(stamped.stamp),
        }
    }
}

impl From<Twist> for VelocityCommand {
    fn from(value: Twist) -> Self {
        Self::Bare(value)
    }
}

impl From<TwistStamped> for VelocityCommand {
    fn from(value: TwistStamped) -> Self {
        Self::Timestamped(value)
    }
}

impl fmt::Display for VelocityCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bare(twist) => write!(f, "{twist}"),
            Self::Timestamped(stamped) if stamped.frame_id.is_empty() => {
                write!(f, "{}", stamped.twist)
            }
            Self::Timestamped(stamped) => {
                write!(f, "{} [frame: {}]", stamped.twist, stamped.frame_id)
            }
        }
    }
}
