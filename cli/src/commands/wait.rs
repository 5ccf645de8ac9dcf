use std::time::Duration;

use anyhow::bail;
use netwait_common::config::{Config, ErrorPolicy, WaitSettings};
use netwait_common::error::WaitError;
use netwait_common::network::request::WaitRequest;
use netwait_core::waiter::{Attempt, ConnectivityWaiter, Elapsed};
use tracing::{Instrument, info_span};

use crate::commands::WaitArgs;
use crate::terminal::{print, spinner};

pub async fn wait(args: WaitArgs, cfg: &Config) -> anyhow::Result<()> {
    let request: WaitRequest =
        WaitRequest::parse(&args.host, &args.port, &args.timeout).map_err(WaitError::from)?;

    let span = info_span!("wait", indicatif.pb_show = true);
    spinner::style_wait_span(&span);

    let waiter = ConnectivityWaiter::new(settings(&args)).with_progress(Box::new(
        |attempt: &Attempt<'_>| spinner::report_attempt(attempt),
    ));

    print::separator(cfg.quiet);
    let result: Result<Elapsed, WaitError> = tokio::select! {
        result = waiter.wait(&request).instrument(span) => result,
        _ = tokio::signal::ctrl_c() => bail!("interrupted while waiting for {}", request.target),
    };
    let elapsed: Elapsed = result?;
    print::separator(cfg.quiet);

    print::aligned_line("Attempts", elapsed.attempts.to_string(), cfg.quiet);
    print::aligned_line("Elapsed", format!("{:.2?}", elapsed.duration), cfg.quiet);
    Ok(())
}

fn settings(args: &WaitArgs) -> WaitSettings {
    WaitSettings {
        retry_interval: Duration::from_millis(args.interval_ms),
        probe_timeout: Duration::from_millis(args.probe_timeout_ms),
        policy: if args.lenient {
            ErrorPolicy::Lenient
        } else {
            ErrorPolicy::Strict
        },
    }
}
