use std::fmt;

use tokio::time::Duration;

use crate::{
    command::VelocityCommand,
    shared::{Priority, Timeout},
};

/// Point-in-time view of one velocity source.
#[derive(Debug, Clone, PartialEq)]
pub struct VelocityHandleStatus {
    pub name: String,
    pub topic: String,
    pub priority: Priority,
    pub timeout: Timeout,
    pub masked: bool,
    pub last_command: Option<VelocityCommand>,
    pub age: Option<Duration>,
}

/// Point-in-time view of one lock.
#[derive(Debug, Clone, PartialEq)]
pub struct LockHandleStatus {
    pub name: String,
    pub topic: String,
    pub priority: Priority,
    pub timeout: Timeout,
    pub locked: bool,
    pub asserted: Option<bool>,
    pub age: Option<Duration>,
}

/// Aggregated, read-only view of every handle, built for health reporting.
///
/// Sources and locks are listed in registration order.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSnapshot {
    pub lock_priority: Priority,
    pub active_source: Option<String>,
    pub velocity_sources: Vec<VelocityHandleStatus>,
    pub locks: Vec<LockHandleStatus>,
}

impl StatusSnapshot {
    pub fn velocity_source(&self, name: &str) -> Option<&VelocityHandleStatus> {
        self.velocity_sources.iter().find(|s| s.name == name)
    }

    pub fn lock(&self, name: &str) -> Option<&LockHandleStatus> {
        self.locks.iter().find(|l| l.name == name)
    }
}

fn fmt_age(age: Option<Duration>) -> String {
    match age {
        Some(age) => format!("{:.3}s", age.as_secs_f64()),
        None => "never".to_string(),
    }
}

impl fmt::Display for StatusSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "lock priority: {}", self.lock_priority)?;
        writeln!(
            f,
            "active source: {}",
            self.active_source.as_deref().unwrap_or("none")
        )?;

        writeln!(f, "velocity sources:")?;
        for source in &self.velocity_sources {
            writeln!(
                f,
                "  {} ({}): priority {}, timeout {}, {}, last update {}",
                source.name,
                source.topic,
                source.priority,
                source.timeout,
                if source.masked { "masked" } else { "unmasked" },
                fmt_age(source.age)
            )?;
        }

        write!(f, "locks:")?;
        for lock in &self.locks {
            write!(
                f,
                "\n  {} ({}): priority {}, timeout {}, {}, last update {}",
                lock.name,
                lock.topic,
                lock.priority,
                lock.timeout,
                if lock.locked { "locked" } else { "unlocked" },
                fmt_age(lock.age)
            )?;
        }

        Ok(())
    }
}
