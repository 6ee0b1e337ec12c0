mod arbiter;
pub(crate) mod error;
mod handle;
mod output;
mod stamped;
mod status;

pub use arbiter::Arbiter;
pub use handle::{LockHandle, VelocityHandle};
pub use output::{OutputAdapter, OutputMode};
pub use stamped::TimestampedValue;
pub use status::{LockHandleStatus, StatusSnapshot, VelocityHandleStatus};
