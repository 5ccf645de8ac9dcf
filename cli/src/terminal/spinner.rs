use colored::*;
use indicatif::ProgressStyle;
use netwait_core::network::tcp::ProbeOutcome;
use netwait_core::waiter::Attempt;
use tracing::Span;
use tracing_indicatif::span_ext::IndicatifSpanExt;

const TICKS: &[&str] = &[
    "▁▁▁▁▁",
    "▁▂▂▂▁",
    "▁▄▂▄▁",
    "▂▄▆▄▂",
    "▄▆█▆▄",
    "▂▄▆▄▂",
    "▁▄▂▄▁",
    "▁▂▂▂▁",
];

pub fn style_wait_span(span: &Span) {
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        span.pb_set_style(&style.tick_strings(TICKS));
    }
}

pub fn report_attempt(attempt: &Attempt<'_>) {
    Span::current().pb_set_message(&attempt_message(attempt));
}

fn attempt_message(attempt: &Attempt<'_>) -> String {
    let status: String = match attempt.outcome {
        ProbeOutcome::Reachable => "reachable".to_string(),
        ProbeOutcome::Retryable(err) | ProbeOutcome::NonRetryable(err) => err.to_string(),
    };
    format!(
        "Attempt {} ({}), {:.1}s left",
        attempt.number.to_string().green().bold(),
        status,
        attempt.remaining.as_secs_f64()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use netwait_common::error::ProbeError;
    use std::time::Duration;

    #[test]
    fn message_names_attempt_and_last_error() {
        colored::control::set_override(false);
        let outcome = ProbeOutcome::Retryable(ProbeError::Refused);
        let attempt = Attempt {
            number: 4,
            outcome: &outcome,
            remaining: Duration::from_millis(1500),
        };
        assert_eq!(attempt_message(&attempt), "Attempt 4 (connection refused), 1.5s left");
    }
}
