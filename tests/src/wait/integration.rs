#![cfg(test)]
use std::time::{Duration, Instant};

use netwait_common::config::WaitSettings;
use netwait_common::error::{ProbeError, WaitError};
use netwait_common::network::request::WaitRequest;
use netwait_common::network::target::Target;
use netwait_core::waiter::{self, ConnectivityWaiter, Elapsed};

use crate::utils::{closed_port, delayed_listener};

fn loopback_request(port: u16, timeout: &str) -> WaitRequest {
    WaitRequest::parse("127.0.0.1", &port.to_string(), timeout).unwrap()
}

/// Closed port, one second budget: the wait ends in a timeout carrying the
/// refusal it kept seeing.
#[tokio::test]
async fn closed_port_times_out_with_refusal() {
    let settings: WaitSettings = WaitSettings::default();
    let request: WaitRequest = loopback_request(closed_port(), "1");
    let start: Instant = Instant::now();

    let result = waiter::wait(&request, settings).await;
    let elapsed: Duration = start.elapsed();

    match result {
        Err(WaitError::Timeout { last_error, attempts, .. }) => {
            assert_eq!(last_error, ProbeError::Refused);
            assert!(attempts > 1, "expected retries, got {attempts} attempts");
        }
        other => panic!("expected timeout, got {other:?}"),
    }
    assert!(elapsed >= Duration::from_secs(1), "gave up early: {elapsed:?}");
    assert!(
        elapsed < request.timeout + settings.retry_interval + settings.probe_timeout,
        "overran the budget: {elapsed:?}"
    );
}

#[tokio::test]
async fn listener_started_late_is_detected() {
    let port: u16 = closed_port();
    let delay: Duration = Duration::from_millis(300);
    let listener = delayed_listener(port, delay);

    let settings: WaitSettings = WaitSettings::default();
    let elapsed: Elapsed = waiter::wait(&loopback_request(port, "5"), settings)
        .await
        .unwrap();

    // Found within one retry interval of the listener coming up.
    let slack: Duration = Duration::from_millis(100);
    assert!(elapsed.duration >= delay, "succeeded too early: {elapsed:?}");
    assert!(
        elapsed.duration < delay + settings.retry_interval + slack,
        "detected too late: {elapsed:?}"
    );
    assert!(elapsed.attempts >= 2);
    listener.abort();
}

#[tokio::test]
async fn huge_timeout_still_waits_normally() {
    let port: u16 = closed_port();
    let listener = delayed_listener(port, Duration::from_millis(100));

    let elapsed: Elapsed = waiter::wait(&loopback_request(port, "1e19"), WaitSettings::default())
        .await
        .unwrap();

    assert!(elapsed.attempts >= 1);
    assert!(elapsed.duration < Duration::from_secs(2), "took {elapsed:?}");
    listener.abort();
}

#[tokio::test]
async fn hand_built_request_is_validated() {
    let target = Target { host: "127.0.0.1".into(), port: 0 };
    let request: WaitRequest = WaitRequest::new(target, Duration::from_secs(1));
    let start: Instant = Instant::now();

    let err: WaitError = waiter::wait(&request, WaitSettings::default()).await.unwrap_err();

    assert_eq!(err.kind(), "invalid request");
    assert_eq!(err.attempts(), 0);
    assert!(start.elapsed() < Duration::from_millis(100));
}

#[tokio::test]
async fn unresolvable_host_fails_fast() {
    let request: WaitRequest = WaitRequest::parse("nonexistent.invalid", "80", "30").unwrap();
    let start: Instant = Instant::now();

    let err: WaitError = waiter::wait(&request, WaitSettings::default()).await.unwrap_err();

    match err {
        WaitError::Environment { cause, attempts, .. } => {
            assert!(matches!(cause, ProbeError::Resolution(_)), "got {cause:?}");
            assert_eq!(attempts, 1);
        }
        other => panic!("expected environment error, got {other:?}"),
    }
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn zero_timeout_probes_once() {
    let request: WaitRequest = loopback_request(closed_port(), "0");
    let start: Instant = Instant::now();

    let err: WaitError = waiter::wait(&request, WaitSettings::default()).await.unwrap_err();

    assert_eq!(err.kind(), "timeout");
    assert_eq!(err.attempts(), 1);
    assert!(start.elapsed() < WaitSettings::default().retry_interval);
}

#[tokio::test]
async fn stable_targets_give_stable_outcomes() {
    let port: u16 = closed_port();
    let waiter = ConnectivityWaiter::new(WaitSettings::default());
    let request: WaitRequest = loopback_request(port, "0");

    for _ in 0..3 {
        let err: WaitError = waiter.wait(&request).await.unwrap_err();
        assert_eq!(err.kind(), "timeout");
    }

    let listener = delayed_listener(port, Duration::ZERO);
    let request: WaitRequest = loopback_request(port, "2");
    for _ in 0..3 {
        assert!(waiter.wait(&request).await.is_ok());
    }
    listener.abort();
}

#[tokio::test]
async fn invalid_inputs_are_rejected_before_probing() {
    assert!(WaitRequest::parse("127.0.0.1", "99999", "1").is_err());
    assert!(WaitRequest::parse("127.0.0.1", "80", "ten").is_err());
    assert!(WaitRequest::parse("", "80", "1").is_err());
}
