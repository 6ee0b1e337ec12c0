use std::{fs, path::Path};

use serde::Deserialize;

use crate::{
    command::CommandKind,
    mux::OutputMode,
    shared::{Priority, Timeout},
};

pub(crate) mod error;

use error::{ConfigError, ConfigResult};

/// Static attributes of one velocity command source.
#[derive(Debug, Clone, PartialEq)]
pub struct VelocitySourceConfig {
    name: String,
    topic: String,
    timeout: Timeout,
    priority: Priority,
    stamped: bool,
}

impl VelocitySourceConfig {
    /// Creates a bare (not time-stamped) velocity source.
    ///
    /// `topic` identifies the channel the transport reads commands from. It is opaque to the
    /// multiplexer.
    pub fn new(
        name: impl Into<String>,
        topic: impl Into<String>,
        timeout: Timeout,
        priority: Priority,
    ) -> ConfigResult<Self> {
        let (name, topic) = validate_identity(name.into(), topic.into())?;

        Ok(Self {
            name,
            topic,
            timeout,
            priority,
            stamped: false,
        })
    }

    /// Sets whether the source's commands carry their own time stamp.
    ///
    /// Default: `false`
    pub fn with_stamped(mut self, stamped: bool) -> Self {
        self.stamped = stamped;
        self
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

    /// Returns `true` if the source's commands carry their own time stamp.
    pub fn stamped(&self) -> bool {
        self.stamped
    }

    pub fn kind(&self) -> CommandKind {
        CommandKind::from_stamped_flag(self.stamped)
    }
}

/// Static attributes of one lock signal.
#[derive(Debug, Clone, PartialEq)]
pub struct LockSourceConfig {
    name: String,
    topic: String,
    timeout: Timeout,
    priority: Priority,
}

impl LockSourceConfig {
    pub fn new(
        name: impl Into<String>,
        topic: impl Into<String>,
        timeout: Timeout,
        priority: Priority,
    ) -> ConfigResult<Self> {
        let (name, topic) = validate_identity(name.into(), topic.into())?;

        Ok(Self {
            name,
            topic,
            timeout,
            priority,
        })
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
}

fn validate_identity(name: String, topic: String) -> ConfigResult<(String, String)> {
    if name.is_empty() {
        return Err(ConfigError::EmptyName);
    }

    if topic.is_empty() {
        return Err(ConfigError::EmptyTopic { name });
    }

    Ok((name, topic))
}

/// Configuration of the multiplexer: the ordered list of velocity sources, the ordered list of
/// locks, and the output mode.
///
/// Declaration order matters. Among unmasked sources sharing the highest priority, the one
/// declared first wins.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MuxConfig {
    velocity_sources: Vec<VelocitySourceConfig>,
    lock_sources: Vec<LockSourceConfig>,
    output_mode: OutputMode,
}

impl MuxConfig {
    pub fn new(output_mode: OutputMode) -> Self {
        Self {
            output_mode,
            ..Default::default()
        }
    }

    pub fn velocity_sources(&self) -> &[VelocitySourceConfig] {
        &self.velocity_sources
    }

    pub fn lock_sources(&self) -> &[LockSourceConfig] {
        &self.lock_sources
    }

    pub fn output_mode(&self) -> &OutputMode {
        &self.output_mode
    }

    /// Appends a velocity source. Fails if a source with the same name was already added.
    pub fn with_velocity_source(mut self, source: VelocitySourceConfig) -> ConfigResult<Self> {
        if self
            .velocity_sources
            .iter()
            .any(|existing| existing.name == source.name)
        {
            return Err(ConfigError::DuplicateVelocitySource(source.name));
        }

        self.velocity_sources.push(source);
        Ok(self)
    }

    /// Appends a lock. Fails if a lock with the same name was already added.
    pub fn with_lock_source(mut self, lock: LockSourceConfig) -> ConfigResult<Self> {
        if self
            .lock_sources
            .iter()
            .any(|existing| existing.name == lock.name)
        {
            return Err(ConfigError::DuplicateLockSource(lock.name));
        }

        self.lock_sources.push(lock);
        Ok(self)
    }

    /// Sets the representation of forwarded commands.
    ///
    /// Default: [`OutputMode::Bare`]
    pub fn with_output_mode(mut self, output_mode: OutputMode) -> Self {
        self.output_mode = output_mode;
        self
    }

    /// Parses a JSON configuration document.
    ///
    /// ```json
    /// {
    ///   "output_stamped": true,
    ///   "frame_id": "base_link",
    ///   "topics": [
    ///     { "name": "navigation", "topic": "nav_vel", "timeout": 0.5, "priority": 10 },
    ///     { "name": "joystick", "topic": "joy_vel", "timeout": 0.5, "priority": 100, "stamped_topic": true }
    ///   ],
    ///   "locks": [
    ///     { "name": "pause", "topic": "pause_navigation", "timeout": 10.0, "priority": 100 }
    ///   ]
    /// }
    /// ```
    ///
    /// Unknown and duplicated fields are rejected.
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let raw: RawMuxConfig = serde_json::from_str(json)?;
        raw.try_into()
    }

    /// Reads and parses a JSON configuration file. See [`from_json_str`](Self::from_json_str).
    pub fn from_json_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_json_str(&json)
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSource {
    name: String,
    topic: String,
    timeout: f64,
    priority: i64,
    #[serde(default)]
    stamped_topic: bool,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawLock {
    name: String,
    topic: String,
    timeout: f64,
    priority: i64,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawMuxConfig {
    #[serde(default)]
    output_stamped: bool,
    #[serde(default)]
    frame_id: String,
    #[serde(default)]
    topics: Vec<RawSource>,
    #[serde(default)]
    locks: Vec<RawLock>,
}

fn parse_attributes(name: &str, timeout: f64, priority: i64) -> ConfigResult<(Timeout, Priority)> {
    let timeout = Timeout::from_secs_f64(timeout).map_err(|source| ConfigError::InvalidTimeout {
        name: name.to_string(),
        source,
    })?;
    let priority = Priority::try_from(priority).map_err(|source| ConfigError::InvalidPriority {
        name: name.to_string(),
        source,
    })?;

    Ok((timeout, priority))
}

impl TryFrom<RawMuxConfig> for MuxConfig {
    type Error = ConfigError;

    fn try_from(raw: RawMuxConfig) -> ConfigResult<Self> {
        let mut config = Self::new(OutputMode::from_stamped_flag(
            raw.output_stamped,
            raw.frame_id,
        ));

        for source in raw.topics {
            let (timeout, priority) =
                parse_attributes(&source.name, source.timeout, source.priority)?;
            let source = VelocitySourceConfig::new(source.name, source.topic, timeout, priority)?
                .with_stamped(source.stamped_topic);

            config = config.with_velocity_source(source)?;
        }

        for lock in raw.locks {
            let (timeout, priority) = parse_attributes(&lock.name, lock.timeout, lock.priority)?;
            let lock = LockSourceConfig::new(lock.name, lock.topic, timeout, priority)?;

            config = config.with_lock_source(lock)?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests;
