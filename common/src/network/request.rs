use std::time::Duration;

use crate::error::RequestError;
use crate::network::target::Target;

/// A single, validated "wait until reachable" request.
///
/// A zero `timeout` means one probe and no retry budget.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WaitRequest {
    pub target: Target,
    pub timeout: Duration,
}

impl WaitRequest {
    pub fn new(target: Target, timeout: Duration) -> Self {
        Self { target, timeout }
    }

    pub fn validate(&self) -> Result<(), RequestError> {
        self.target.validate()
    }

    /// Parses the three string inputs of the action.
    ///
    /// The timeout is given in seconds and may be fractional (`"1.5"`).
    pub fn parse(host: &str, port: &str, timeout: &str) -> Result<Self, RequestError> {
        let target: Target = Target::parse(host, port)?;
        let timeout: Duration = parse_timeout(timeout)?;
        Ok(Self::new(target, timeout))
    }
}

fn parse_timeout(raw: &str) -> Result<Duration, RequestError> {
    let invalid = || RequestError::InvalidTimeout(raw.to_string());
    let seconds: f64 = raw.trim().parse().map_err(|_| invalid())?;

    if !seconds.is_finite() || seconds < 0.0 {
        return Err(invalid());
    }

    Duration::try_from_secs_f64(seconds).map_err(|_| invalid())
}
