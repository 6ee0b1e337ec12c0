use tokio::time::{Duration, Instant};

use crate::shared::Timeout;

/// A value together with the instant it became current.
#[derive(Debug, Clone, PartialEq)]
pub struct TimestampedValue<T> {
    value: T,
    stamp: Instant,
}

impl<T> TimestampedValue<T> {
    pub fn new(value: T, stamp: Instant) -> Self {
        Self { value, stamp }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn stamp(&self) -> Instant {
        self.stamp
    }

    /// Time elapsed since `stamp`. Saturates to zero for stamps ahead of `now`.
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.stamp)
    }

    pub fn is_stale(&self, timeout: Timeout, now: Instant) -> bool {
        timeout.is_exceeded_by(self.age(now))
    }
}
