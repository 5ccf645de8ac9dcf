//! # Wait Target Model
//!
//! The endpoint a wait is aimed at: a host (name or IP literal) and a TCP port.
//!
//! Accepted host forms:
//! * A hostname (e.g., `db.internal`).
//! * An IPv4 literal (e.g., `127.0.0.1`).
//! * An IPv6 literal, bare or bracketed (e.g., `::1`, `[::1]`).

use std::fmt;
use std::net::IpAddr;

use crate::error::RequestError;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Target {
    pub host: String,
    pub port: u16,
}

impl Target {
    /// Builds a target from raw host and port inputs.
    ///
    /// Surrounding whitespace is ignored and brackets around an IPv6 literal
    /// are stripped. The host is not resolved here.
    pub fn parse(host: &str, port: &str) -> Result<Self, RequestError> {
        let host: String = parse_host(host)?;
        let port: u16 = parse_port(port)?;
        Ok(Self { host, port })
    }

    /// Checks a target that was built field by field rather than parsed.
    pub fn validate(&self) -> Result<(), RequestError> {
        if parse_host(&self.host)? != self.host {
            return Err(RequestError::InvalidHost(self.host.clone()));
        }
        if self.port == 0 {
            return Err(RequestError::InvalidPort(self.port.to_string()));
        }
        Ok(())
    }

    pub fn ip(&self) -> Option<IpAddr> {
        self.host.parse().ok()
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ip() {
            Some(IpAddr::V6(addr)) => write!(f, "[{}]:{}", addr, self.port),
            _ => write!(f, "{}:{}", self.host, self.port),
        }
    }
}

fn parse_host(raw: &str) -> Result<String, RequestError> {
    let trimmed: &str = raw.trim();
    let host: &str = trimmed
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .unwrap_or(trimmed);

    if host.is_empty() {
        return Err(RequestError::EmptyHost);
    }
    if host.chars().any(|c| c.is_whitespace() || c == '/') {
        return Err(RequestError::InvalidHost(raw.to_string()));
    }
    // A colon is only legal inside an IPv6 literal.
    if host.contains(':') && host.parse::<IpAddr>().is_err() {
        return Err(RequestError::InvalidHost(raw.to_string()));
    }

    Ok(host.to_string())
}

fn parse_port(raw: &str) -> Result<u16, RequestError> {
    match raw.trim().parse::<u16>() {
        Ok(0) | Err(_) => Err(RequestError::InvalidPort(raw.to_string())),
        Ok(port) => Ok(port),
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
