use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use netwait_common::error::ProbeError;
use netwait_common::network::target::Target;
use tokio::net::{TcpStream, lookup_host};
use tokio::time::{Instant, timeout};
use tracing::debug;

/// Result of a single probe, tagged by what the waiter should do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Reachable,
    Retryable(ProbeError),
    NonRetryable(ProbeError),
}

impl From<ProbeError> for ProbeOutcome {
    fn from(err: ProbeError) -> Self {
        if err.is_retryable() {
            ProbeOutcome::Retryable(err)
        } else {
            ProbeOutcome::NonRetryable(err)
        }
    }
}

/// One reachability check against a target, bounded by `budget`.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, target: &Target, budget: Duration) -> ProbeOutcome;
}

/// Resolves the target and opens (then immediately closes) a TCP connection.
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpProber;

#[async_trait]
impl Prober for TcpProber {
    async fn probe(&self, target: &Target, budget: Duration) -> ProbeOutcome {
        match timeout(budget, handshake_probe(target)).await {
            Ok(Ok(())) => ProbeOutcome::Reachable,
            Ok(Err(err)) => ProbeOutcome::from(err),
            Err(_elapsed) => ProbeOutcome::Retryable(ProbeError::TimedOut(budget)),
        }
    }
}

async fn handshake_probe(target: &Target) -> Result<(), ProbeError> {
    let addrs: Vec<SocketAddr> = resolve(target).await?;
    let mut last_error: ProbeError = ProbeError::Unexpected("no address attempted".into());

    for addr in addrs {
        let started: Instant = Instant::now();
        match TcpStream::connect(addr).await {
            Ok(stream) => {
                debug!("handshake with {addr} completed in {:.2?}", started.elapsed());
                drop(stream);
                return Ok(());
            }
            Err(err) => {
                debug!("connect to {addr} failed: {err}");
                last_error = ProbeError::from_io(&err);
            }
        }
    }

    Err(last_error)
}

async fn resolve(target: &Target) -> Result<Vec<SocketAddr>, ProbeError> {
    if let Some(ip) = target.ip() {
        return Ok(vec![SocketAddr::new(ip, target.port)]);
    }

    let addrs: Vec<SocketAddr> = lookup_host((target.host.as_str(), target.port))
        .await
        .map_err(|err| ProbeError::Resolution(format!("{}: {err}", target.host)))?
        .collect();

    if addrs.is_empty() {
        return Err(ProbeError::Resolution(format!(
            "{}: no addresses found",
            target.host
        )));
    }
    Ok(addrs)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
