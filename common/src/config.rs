use std::time::Duration;

/// Pause between two failed probes. Constant, never grows.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(200);

/// Upper bound for a single connect attempt, name resolution included.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

pub struct Config {
    /// Verbosity reduction. `0` prints headers and separators, anything
    /// above only prints log lines of warning level and up.
    pub quiet: u8,
}

/// How probe errors outside the "not listening yet" class are handled.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Fail the wait immediately.
    #[default]
    Strict,
    /// Log a warning and keep probing until the deadline.
    Lenient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitSettings {
    pub retry_interval: Duration,
    pub probe_timeout: Duration,
    pub policy: ErrorPolicy,
}

impl Default for WaitSettings {
    fn default() -> Self {
        Self {
            retry_interval: DEFAULT_RETRY_INTERVAL,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            policy: ErrorPolicy::Strict,
        }
    }
}
