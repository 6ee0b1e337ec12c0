use tokio::time::{Duration, Instant};

use crate::{
    command::{CommandKind, VelocityCommand},
    config::{LockSourceConfig, VelocitySourceConfig},
    shared::{Priority, Timeout},
};

use super::{
    error::{ArbiterError, Result},
    stamped::TimestampedValue,
};

/// Arbitration state of one velocity command source.
#[derive(Debug, Clone)]
pub struct VelocityHandle {
    name: String,
    topic: String,
    timeout: Timeout,
    priority: Priority,
    kind: CommandKind,
    last: Option<TimestampedValue<VelocityCommand>>,
}

impl VelocityHandle {
    pub fn new(config: &VelocitySourceConfig) -> Self {
        Self {
            name: config.name().to_string(),
            topic: config.topic().to_string(),
            timeout: config.timeout(),
            priority: config.priority(),
            kind: config.kind(),
            last: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn timeout(&self) -> Timeout {
        self.timeout
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Shape the source was registered with.
    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    pub fn last_command(&self) -> Option<&VelocityCommand> {
        self.last.as_ref().map(TimestampedValue::value)
    }

    /// Age of the last command, or `None` if nothing was received yet.
    pub fn age(&self, now: Instant) -> Option<Duration> {
        self.last.as_ref().map(|last| last.age(now))
    }

    /// Records a command received at `now`.
    ///
    /// Bare commands are aged from `now`, time-stamped commands from their own stamp. Stamps ahead
    /// of `now` are clamped to `now`. A command whose shape differs from the registered one is
    /// rejected and leaves the handle untouched.
    pub fn update(&mut self, command: VelocityCommand, now: Instant) -> Result<()> {
        if command.kind() != self.kind {
            return Err(ArbiterError::RepresentationMismatch {
                source_name: self.name.clone(),
                expected: self.kind,
                found: command.kind(),
            });
        }

        let stamp = command.stamp().map_or(now, |stamp| stamp.min(now));
        self.last = Some(TimestampedValue::new(command, stamp));

        Ok(())
    }

    /// Returns `true` if nothing was received yet, or the last command is at least `timeout` old.
    pub fn has_expired(&self, now: Instant) -> bool {
        self.last
            .as_ref()
            .is_none_or(|last| last.is_stale(self.timeout, now))
    }

    /// Returns `true` if the handle is excluded from arbitration: expired, or overridden by an
    /// engaged lock of strictly greater priority.
    pub fn is_masked(&self, lock_priority: Priority, now: Instant) -> bool {
        self.has_expired(now) || self.priority < lock_priority
    }
}

/// Arbitration state of one lock signal.
#[derive(Debug, Clone)]
pub struct LockHandle {
    name: String,
    topic: String,
    timeout: Timeout,
    priority: Priority,
    last: Option<TimestampedValue<bool>>,
}

impl LockHandle {
    pub fn new(config: &LockSourceConfig) -> Self {
        Self {
            name: config.name().to_string(),
            topic: config.topic().to_string(),
            timeout: config.timeout(),
            priority: config.priority(),
            last: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn timeout(&self) -> Timeout {
        self.timeout
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Last received assertion value, or `None` if nothing was received yet.
    pub fn asserted(&self) -> Option<bool> {
        self.last.as_ref().map(|last| *last.value())
    }

    pub fn age(&self, now: Instant) -> Option<Duration> {
        self.last.as_ref().map(|last| last.age(now))
    }

    pub fn update(&mut self, asserted: bool, now: Instant) {
        self.last = Some(TimestampedValue::new(asserted, now));
    }

    /// Returns `true` if the last received value asserts the lock and is younger than `timeout`.
    pub fn is_locked(&self, now: Instant) -> bool {
        self.last
            .as_ref()
            .is_some_and(|last| *last.value() && !last.is_stale(self.timeout, now))
    }
}
