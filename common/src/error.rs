//! Error types shared by the waiter and its callers.
//!
//! A probe failure is classified once, at the socket boundary, into a
//! [`ProbeError`]. The waiter only ever looks at that classification to decide
//! whether to retry. What the caller finally sees is a [`WaitError`], which
//! keeps "the target never came up" ([`WaitError::Timeout`]) apart from "the
//! target cannot be reached from here" ([`WaitError::Environment`]).

use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::network::target::Target;

/// Malformed wait inputs. Raised before any probe is sent.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("host must not be empty")]
    EmptyHost,
    #[error("invalid host: {0:?}")]
    InvalidHost(String),
    #[error("invalid port: {0:?} (expected an integer between 1 and 65535)")]
    InvalidPort(String),
    #[error("invalid timeout: {0:?} (expected a non-negative number of seconds)")]
    InvalidTimeout(String),
}

/// Outcome of a failed probe, classified by what a retry could achieve.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProbeError {
    #[error("connection refused")]
    Refused,
    #[error("connection reset")]
    Reset,
    #[error("host or network unreachable")]
    Unreachable,
    #[error("connect attempt timed out after {0:.2?}")]
    TimedOut(Duration),
    /// Timeout reported by the operating system, not by the attempt budget.
    #[error("connection timed out")]
    ConnectTimedOut,
    #[error("failed to resolve host: {0}")]
    Resolution(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    #[error("unexpected probe failure: {0}")]
    Unexpected(String),
}

impl ProbeError {
    /// `true` when the target is most likely still starting up.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Refused
                | Self::Reset
                | Self::Unreachable
                | Self::TimedOut(_)
                | Self::ConnectTimedOut
        )
    }

    /// Classifies an error returned by a connect call.
    pub fn from_io(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::ConnectionRefused => Self::Refused,
            io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionAborted => Self::Reset,
            io::ErrorKind::HostUnreachable | io::ErrorKind::NetworkUnreachable => {
                Self::Unreachable
            }
            io::ErrorKind::TimedOut => Self::ConnectTimedOut,
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(err.to_string()),
            io::ErrorKind::InvalidInput | io::ErrorKind::AddrNotAvailable => {
                Self::InvalidAddress(err.to_string())
            }
            _ => Self::Unexpected(err.to_string()),
        }
    }
}

/// Terminal failure of a wait.
#[derive(Debug, Error)]
pub enum WaitError {
    #[error("invalid request")]
    InvalidRequest(#[from] RequestError),

    #[error(
        "timed out waiting for {target} after {elapsed:.2?} ({attempts} attempts, last error: {last_error})"
    )]
    Timeout {
        target: Target,
        elapsed: Duration,
        attempts: u32,
        last_error: ProbeError,
    },

    #[error("environment error while waiting for {target} after {elapsed:.2?} ({attempts} attempts): {cause}")]
    Environment {
        target: Target,
        elapsed: Duration,
        attempts: u32,
        cause: ProbeError,
    },
}

impl WaitError {
    /// Short name of the condition, for alerting.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid request",
            Self::Timeout { .. } => "timeout",
            Self::Environment { .. } => "environment error",
        }
    }

    pub fn attempts(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 0,
            Self::Timeout { attempts, .. } | Self::Environment { attempts, .. } => *attempts,
        }
    }
}
