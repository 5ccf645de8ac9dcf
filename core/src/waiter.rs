//! The connectivity waiter.
//!
//! Probes a [`Target`] strictly one attempt at a time until it accepts a TCP
//! connection, the deadline passes, or a probe fails in a way no retry can fix.
//!
//! ```text
//!            retryable error (sleep, then probe again)
//!              ┌─────┐
//!              ▼     │
//!           Probing ─┘──── reachable ─────────▶ Succeeded
//!              │  └─────── deadline passed ───▶ TimedOut
//!              └────────── non-retryable ─────▶ Errored
//! ```
//!
//! An attempt in flight when the deadline passes is allowed to finish and is
//! evaluated before the deadline is checked again.

use std::time::Duration;

use netwait_common::config::{ErrorPolicy, WaitSettings};
use netwait_common::error::{ProbeError, WaitError};
use netwait_common::network::request::WaitRequest;
use netwait_common::network::target::Target;
use netwait_common::{info, success, warn};
use tokio::time::{Instant, sleep};
use tracing::debug;

use crate::network::tcp::{ProbeOutcome, Prober, TcpProber};

/// Lower bound for the budget of an attempt once the deadline is close.
const MIN_PROBE_BUDGET: Duration = Duration::from_millis(100);

/// Deadline used when `start + timeout` does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(60 * 60 * 24 * 365 * 30);

type ProgressCallback = Box<dyn Fn(&Attempt<'_>) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitState {
    Probing,
    Succeeded,
    TimedOut,
    Errored,
}

impl WaitState {
    /// State reached from `Probing` after one evaluated probe.
    pub fn after(outcome: &ProbeOutcome, deadline_passed: bool) -> Self {
        match outcome {
            ProbeOutcome::Reachable => WaitState::Succeeded,
            ProbeOutcome::NonRetryable(_) => WaitState::Errored,
            ProbeOutcome::Retryable(_) if deadline_passed => WaitState::TimedOut,
            ProbeOutcome::Retryable(_) => WaitState::Probing,
        }
    }

    pub fn is_terminal(self) -> bool {
        self != WaitState::Probing
    }
}

/// A probe that has just been evaluated.
#[derive(Debug)]
pub struct Attempt<'a> {
    pub number: u32,
    pub outcome: &'a ProbeOutcome,
    pub remaining: Duration,
}

/// Successful wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elapsed {
    pub duration: Duration,
    pub attempts: u32,
}

pub struct ConnectivityWaiter<P = TcpProber> {
    prober: P,
    settings: WaitSettings,
    on_attempt: Option<ProgressCallback>,
}

impl ConnectivityWaiter<TcpProber> {
    pub fn new(settings: WaitSettings) -> Self {
        Self::with_prober(TcpProber, settings)
    }
}

impl<P: Prober> ConnectivityWaiter<P> {
    pub fn with_prober(prober: P, settings: WaitSettings) -> Self {
        Self {
            prober,
            settings,
            on_attempt: None,
        }
    }

    /// Registers a callback invoked after every evaluated probe.
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_attempt = Some(callback);
        self
    }

    /// Blocks until `request.target` accepts a TCP connection.
    pub async fn wait(&self, request: &WaitRequest) -> Result<Elapsed, WaitError> {
        request.validate()?;

        let target: &Target = &request.target;
        let start: Instant = Instant::now();
        let deadline: Instant = start
            .checked_add(request.timeout)
            .unwrap_or_else(|| start + FAR_FUTURE);
        let mut attempts: u32 = 0;

        info!("Wait for: {target}");

        loop {
            let remaining: Duration = deadline.saturating_duration_since(Instant::now());
            let budget: Duration = self.settings.probe_timeout.min(remaining.max(MIN_PROBE_BUDGET));

            attempts += 1;
            let outcome: ProbeOutcome = self.classify(self.prober.probe(target, budget).await);

            let remaining: Duration = deadline.saturating_duration_since(Instant::now());
            self.report(attempts, &outcome, remaining);

            let state: WaitState = WaitState::after(&outcome, remaining.is_zero());
            debug!("attempt {attempts} against {target}: {outcome:?} -> {state:?}");

            match (state, outcome) {
                (WaitState::Succeeded, _) => {
                    let duration: Duration = start.elapsed();
                    success!("Now available: {target} ({attempts} attempts, {duration:.2?})");
                    return Ok(Elapsed { duration, attempts });
                }
                (WaitState::Errored, ProbeOutcome::NonRetryable(cause)) => {
                    return Err(WaitError::Environment {
                        target: target.clone(),
                        elapsed: start.elapsed(),
                        attempts,
                        cause,
                    });
                }
                (WaitState::TimedOut, ProbeOutcome::Retryable(last_error)) => {
                    return Err(WaitError::Timeout {
                        target: target.clone(),
                        elapsed: start.elapsed(),
                        attempts,
                        last_error,
                    });
                }
                _ => sleep(self.settings.retry_interval.min(remaining)).await,
            }
        }
    }

    fn classify(&self, outcome: ProbeOutcome) -> ProbeOutcome {
        match (self.settings.policy, outcome) {
            (ErrorPolicy::Lenient, ProbeOutcome::NonRetryable(err)) => {
                warn!("Unexpected failure: {err}");
                ProbeOutcome::Retryable(err)
            }
            (_, outcome) => outcome,
        }
    }

    fn report(&self, number: u32, outcome: &ProbeOutcome, remaining: Duration) {
        if let Some(callback) = &self.on_attempt {
            callback(&Attempt {
                number,
                outcome,
                remaining,
            });
        }
    }
}

/// Waits with the default TCP prober.
pub async fn wait(request: &WaitRequest, settings: WaitSettings) -> Result<Elapsed, WaitError> {
    ConnectivityWaiter::new(settings).wait(request).await
}

/// Last error of a failed wait, if a probe ran at all.
pub fn last_probe_error(err: &WaitError) -> Option<&ProbeError> {
    match err {
        WaitError::Timeout { last_error, .. } => Some(last_error),
        WaitError::Environment { cause, .. } => Some(cause),
        WaitError::InvalidRequest(_) => None,
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
