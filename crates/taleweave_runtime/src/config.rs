//! Runtime tuning knobs.

use std::time::Duration;

/// Timing constants of the branch cache protocol.
///
/// Tests shrink these; production uses the defaults.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Age after which a cache entry is refreshable and a pending claim is
    /// considered abandoned
    pub stale: Duration,
    /// Ceiling on how long a readiness call waits for someone else's
    /// generation before giving up
    pub wait_timeout: Duration,
    /// Poll cadence while waiting on another writer
    pub poll_interval: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            stale: Duration::from_secs(120),
            wait_timeout: Duration::from_secs(240),
            poll_interval: Duration::from_millis(300),
        }
    }
}

impl RuntimeConfig {
    /// Staleness threshold in milliseconds.
    pub fn stale_millis(&self) -> i64 {
        self.stale.as_millis() as i64
    }
}
