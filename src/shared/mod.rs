use std::{fmt, result::Result};

use tokio::time;

pub mod error;

use error::{PriorityValidationError, TimeoutValidationError};

/// Validated arbitration priority of a velocity source or lock.
///
/// Higher values win. `0` is both the lowest valid priority and the effective lock priority
/// reported while no lock is engaged, so a lock must have a priority strictly greater than a
/// source's priority to mask it.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Eq, Ord, Hash, Default)]
pub struct Priority(u32);

impl Priority {
    /// The lowest priority, also used as the "no lock engaged" value.
    pub const NONE: Self = Self(0);

    /// The highest representable priority.
    pub const MAX: Self = Self(u32::MAX);

    /// Returns the priority as a `u32`.
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl From<u8> for Priority {
    fn from(value: u8) -> Self {
        Self(value as u32)
    }
}

impl From<u16> for Priority {
    fn from(value: u16) -> Self {
        Self(value as u32)
    }
}

impl From<u32> for Priority {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl TryFrom<u64> for Priority {
    type Error = PriorityValidationError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        u32::try_from(value)
            .map(Self)
            .map_err(|_| PriorityValidationError::TooLarge(value as i128))
    }
}

impl TryFrom<i32> for Priority {
    type Error = PriorityValidationError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::try_from(value as i64)
    }
}

impl TryFrom<i64> for Priority {
    type Error = PriorityValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if value < 0 {
            return Err(PriorityValidationError::Negative(value));
        }

        u32::try_from(value)
            .map(Self)
            .map_err(|_| PriorityValidationError::TooLarge(value as i128))
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validated staleness timeout of a velocity source or lock.
///
/// A handle whose last update is at least `timeout` old is stale. A zero timeout is therefore
/// always stale and effectively disables the handle.
///
/// # Examples
///
/// ```
/// use twistmux::models::Timeout;
///
/// let timeout = Timeout::from_secs_f64(0.5).unwrap();
/// assert_eq!(timeout.as_duration().as_millis(), 500);
///
/// assert!(Timeout::from_secs_f64(-1.0).is_err());
/// assert!(Timeout::from_secs_f64(f64::NAN).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Eq, Ord, Hash, Default)]
pub struct Timeout(time::Duration);

impl Timeout {
    /// Zero timeout, always stale.
    pub const ZERO: Self = Self(time::Duration::ZERO);

    /// Creates a timeout from a number of seconds, as found in configuration files.
    pub fn from_secs_f64(secs: f64) -> Result<Self, TimeoutValidationError> {
        if secs.is_nan() || secs.is_infinite() {
            return Err(TimeoutValidationError::NotFinite);
        }

        if secs < 0.0 {
            return Err(TimeoutValidationError::Negative(secs));
        }

        time::Duration::try_from_secs_f64(secs)
            .map(Self)
            .map_err(|_| TimeoutValidationError::TooLarge(secs))
    }

    /// Creates a timeout from a whole number of milliseconds.
    pub const fn from_millis(millis: u64) -> Self {
        Self(time::Duration::from_millis(millis))
    }

    /// Returns the timeout as a [`Duration`](tokio::time::Duration).
    pub fn as_duration(&self) -> time::Duration {
        self.0
    }

    /// Returns `true` if an update of the given `age` is stale under this timeout.
    pub fn is_exceeded_by(&self, age: time::Duration) -> bool {
        age >= self.0
    }
}

impl From<time::Duration> for Timeout {
    fn from(value: time::Duration) -> Self {
        Self(value)
    }
}

impl fmt::Display for Timeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}s", self.0.as_secs_f64())
    }
}
