use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::{
    command::{OutputCommand, VelocityCommand},
    config::{LockSourceConfig, MuxConfig, VelocitySourceConfig},
    shared::Priority,
};

use super::{
    error::{ArbiterError, Result},
    handle::{LockHandle, VelocityHandle},
    output::{OutputAdapter, OutputMode},
    status::{LockHandleStatus, StatusSnapshot, VelocityHandleStatus},
};

/// Priority-based arbitration between velocity sources, with lock overrides.
///
/// The arbiter owns every handle. It never reads the clock: each operation receives the `now`
/// used for every handle it evaluates. It is synchronous and performs no I/O, so callers sharing
/// it across threads wrap it in a single mutex and hold the lock for the whole call.
#[derive(Debug, Clone)]
pub struct Arbiter {
    velocity_hs: Vec<VelocityHandle>,
    lock_hs: Vec<LockHandle>,
    output: OutputAdapter,
}

impl Arbiter {
    pub fn new(output_mode: OutputMode) -> Self {
        Self {
            velocity_hs: Vec::new(),
            lock_hs: Vec::new(),
            output: OutputAdapter::new(output_mode),
        }
    }

    /// Creates an arbiter and registers every configured source and lock, in declaration order.
    pub fn from_config(config: &MuxConfig) -> Result<Self> {
        let mut arbiter = Self::new(config.output_mode().clone());

        for source in config.velocity_sources() {
            arbiter.register_velocity_source(source)?;
        }

        for lock in config.lock_sources() {
            arbiter.register_lock_source(lock)?;
        }

        Ok(arbiter)
    }

    pub fn register_velocity_source(&mut self, config: &VelocitySourceConfig) -> Result<()> {
        if self.velocity_index(config.name()).is_some() {
            return Err(ArbiterError::DuplicateVelocitySource(
                config.name().to_string(),
            ));
        }

        debug!(
            source = config.name(),
            topic = config.topic(),
            priority = config.priority().as_u32(),
            timeout = %config.timeout(),
            kind = %config.kind(),
            "registered velocity source"
        );

        self.velocity_hs.push(VelocityHandle::new(config));
        Ok(())
    }

    pub fn register_lock_source(&mut self, config: &LockSourceConfig) -> Result<()> {
        if self.lock_index(config.name()).is_some() {
            return Err(ArbiterError::DuplicateLockSource(config.name().to_string()));
        }

        debug!(
            lock = config.name(),
            topic = config.topic(),
            priority = config.priority().as_u32(),
            timeout = %config.timeout(),
            "registered lock"
        );

        self.lock_hs.push(LockHandle::new(config));
        Ok(())
    }

    pub fn velocity_handles(&self) -> &[VelocityHandle] {
        &self.velocity_hs
    }

    pub fn lock_handles(&self) -> &[LockHandle] {
        &self.lock_hs
    }

    pub fn output_mode(&self) -> &OutputMode {
        self.output.mode()
    }

    fn velocity_index(&self, name: &str) -> Option<usize> {
        self.velocity_hs.iter().position(|h| h.name() == name)
    }

    fn lock_index(&self, name: &str) -> Option<usize> {
        self.lock_hs.iter().position(|h| h.name() == name)
    }

    /// Highest priority among engaged locks, or [`Priority::NONE`] if none is engaged.
    pub fn effective_lock_priority(&self, now: Instant) -> Priority {
        self.lock_hs
            .iter()
            .filter(|lock_h| lock_h.is_locked(now))
            .map(LockHandle::priority)
            .max()
            .unwrap_or(Priority::NONE)
    }

    fn winner_index(&self, now: Instant) -> Option<usize> {
        let lock_priority = self.effective_lock_priority(now);

        // Seeded with `Priority::NONE` under a strict comparison: priority 0 never wins, and the
        // first registered handle wins among equal priorities.
        let mut winner = None;
        let mut best = Priority::NONE;
        for (idx, velocity_h) in self.velocity_hs.iter().enumerate() {
            if velocity_h.is_masked(lock_priority, now) {
                continue;
            }

            if velocity_h.priority() > best {
                best = velocity_h.priority();
                winner = Some(idx);
            }
        }

        winner
    }

    /// The unmasked source with the highest non-zero priority, ties going to the earliest
    /// registered.
    pub fn winner(&self, now: Instant) -> Option<&VelocityHandle> {
        self.winner_index(now).map(|idx| &self.velocity_hs[idx])
    }

    /// Returns `true` if `name` is the source currently allowed to drive the output.
    pub fn has_priority(&self, name: &str, now: Instant) -> Result<bool> {
        let idx = self
            .velocity_index(name)
            .ok_or_else(|| ArbiterError::UnknownVelocitySource(name.to_string()))?;

        Ok(self.winner_index(now) == Some(idx))
    }

    /// Records a command from `name` and returns the command to forward, if `name` wins.
    ///
    /// Losing commands are dropped: they are neither queued nor retried. Errors leave every
    /// handle untouched.
    pub fn on_velocity_received(
        &mut self,
        name: &str,
        command: VelocityCommand,
        now: Instant,
    ) -> Result<Option<OutputCommand>> {
        let Some(idx) = self.velocity_index(name) else {
            warn!(source = name, "velocity command from unregistered source");
            return Err(ArbiterError::UnknownVelocitySource(name.to_string()));
        };

        if let Err(e) = self.velocity_hs[idx].update(command.clone(), now) {
            warn!(source = name, error = %e, "velocity command rejected");
            return Err(e);
        }

        if self.winner_index(now) != Some(idx) {
            trace!(source = name, "velocity command dropped, source does not have priority");
            return Ok(None);
        }

        Ok(Some(self.output.adapt(command, now)))
    }

    /// Records a lock assertion value. Never produces output by itself: the next command of the
    /// winning source does.
    pub fn on_lock_received(&mut self, name: &str, asserted: bool, now: Instant) -> Result<()> {
        let Some(idx) = self.lock_index(name) else {
            warn!(lock = name, "lock signal from unregistered lock");
            return Err(ArbiterError::UnknownLockSource(name.to_string()));
        };

        self.lock_hs[idx].update(asserted, now);
        Ok(())
    }

    pub fn snapshot(&self, now: Instant) -> StatusSnapshot {
        let lock_priority = self.effective_lock_priority(now);

        let velocity_sources = self
            .velocity_hs
            .iter()
            .map(|h| VelocityHandleStatus {
                name: h.name().to_string(),
                topic: h.topic().to_string(),
                priority: h.priority(),
                timeout: h.timeout(),
                masked: h.is_masked(lock_priority, now),
                last_command: h.last_command().cloned(),
                age: h.age(now),
            })
            .collect();

        let locks = self
            .lock_hs
            .iter()
            .map(|h| LockHandleStatus {
                name: h.name().to_string(),
                topic: h.topic().to_string(),
                priority: h.priority(),
                timeout: h.timeout(),
                locked: h.is_locked(now),
                asserted: h.asserted(),
                age: h.age(now),
            })
            .collect();

        StatusSnapshot {
            lock_priority,
            active_source: self.winner(now).map(|h| h.name().to_string()),
            velocity_sources,
            locks,
        }
    }
}
