use tokio::time;

/// Configuration for the [`LiveMuxEngine`](crate::live::LiveMuxEngine).
#[derive(Clone, Debug)]
pub struct LiveMuxConfig {
    diagnostics_period: time::Duration,
    shutdown_timeout: time::Duration,
    update_channel_capacity: usize,
}

impl Default for LiveMuxConfig {
    fn default() -> Self {
        Self {
            diagnostics_period: time::Duration::from_secs(1),
            shutdown_timeout: time::Duration::from_secs(6),
            update_channel_capacity: 1_000,
        }
    }
}

impl LiveMuxConfig {
    /// Returns the interval between two diagnostics reports.
    pub fn diagnostics_period(&self) -> time::Duration {
        self.diagnostics_period
    }

    /// Returns the timeout duration for graceful shutdown operations.
    pub fn shutdown_timeout(&self) -> time::Duration {
        self.shutdown_timeout
    }

    /// Returns the capacity of the broadcast channel carrying [`LiveMuxUpdate`]s.
    ///
    /// [`LiveMuxUpdate`]: crate::live::LiveMuxUpdate
    pub fn update_channel_capacity(&self) -> usize {
        self.update_channel_capacity
    }

    /// Sets the interval between two diagnostics reports, in milliseconds. Values below `1` are
    /// raised to `1`.
    ///
    /// Default: `1000` milliseconds
    pub fn with_diagnostics_period(mut self, millis: u64) -> Self {
        self.diagnostics_period = time::Duration::from_millis(millis.max(1));
        self
    }

    /// Sets the timeout duration for graceful shutdown operations.
    ///
    /// Default: `6` seconds
    pub fn with_shutdown_timeout(mut self, secs: u64) -> Self {
        self.shutdown_timeout = time::Duration::from_secs(secs);
        self
    }

    /// Sets the capacity of the update channel. Receivers falling further behind than this
    /// observe a lag. Values below `1` are raised to `1`.
    ///
    /// Default: `1000`
    pub fn with_update_channel_capacity(mut self, capacity: usize) -> Self {
        self.update_channel_capacity = capacity.max(1);
        self
    }
}

#[derive(Debug)]
pub(super) struct LiveMuxControllerConfig {
    shutdown_timeout: time::Duration,
}

impl LiveMuxControllerConfig {
    pub fn shutdown_timeout(&self) -> time::Duration {
        self.shutdown_timeout
    }
}

impl From<&LiveMuxConfig> for LiveMuxControllerConfig {
    fn from(value: &LiveMuxConfig) -> Self {
        Self {
            shutdown_timeout: value.shutdown_timeout,
        }
    }
}

#[derive(Clone, Debug)]
pub(super) struct LiveMuxProcessConfig {
    diagnostics_period: time::Duration,
}

impl LiveMuxProcessConfig {
    pub fn diagnostics_period(&self) -> time::Duration {
        self.diagnostics_period
    }
}

impl From<&LiveMuxConfig> for LiveMuxProcessConfig {
    fn from(value: &LiveMuxConfig) -> Self {
        Self {
            diagnostics_period: value.diagnostics_period,
        }
    }
}
