//! End-to-end supervision scenarios with mock servers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use server_supervisor::{ShutdownCause, Supervisor};

mod common;
use common::{as_servers, MockServer};

fn supervisor() -> Supervisor {
    Supervisor::new().with_shutdown_timeout(Some(Duration::from_secs(5)))
}

async fn run_with_timeout(
    supervisor: Supervisor,
    mocks: &[Arc<MockServer>],
) -> server_supervisor::ShutdownReport {
    tokio::time::timeout(Duration::from_secs(10), supervisor.run(as_servers(mocks)))
        .await
        .expect("supervisor should finish")
        .expect("supervisor run")
}

#[tokio::test]
async fn failing_server_stops_its_siblings() {
    let mocks = vec![
        Arc::new(MockServer::new("a")),
        Arc::new(MockServer::new("b").failing_after(Duration::from_millis(50))),
        Arc::new(MockServer::new("c")),
    ];

    let report = run_with_timeout(supervisor(), &mocks).await;

    match &report.cause {
        ShutdownCause::ServerFailed { server, error } => {
            assert_eq!(server, "b");
            assert!(error.contains("b crashed"));
        }
        other => panic!("unexpected cause: {other}"),
    }
    for mock in &mocks {
        assert_eq!(mock.starts(), 1);
        assert_eq!(mock.shutdowns(), 1);
    }
    assert!(report.failures.is_empty());
    assert_eq!(report.exit_code(), 1);
}

#[tokio::test]
async fn immediate_start_failure_stops_its_siblings() {
    let mocks = vec![
        Arc::new(MockServer::new("a")),
        Arc::new(MockServer::new("b").failing_after(Duration::ZERO)),
        Arc::new(MockServer::new("c")),
    ];

    let report = run_with_timeout(supervisor(), &mocks).await;

    assert!(matches!(
        report.cause,
        ShutdownCause::ServerFailed { ref server, .. } if server == "b"
    ));
    for mock in &mocks {
        assert_eq!(mock.shutdowns(), 1);
    }
    assert_eq!(report.exit_code(), 1);
}

#[tokio::test]
async fn no_shutdown_before_the_stop_broadcast() {
    let mocks: Vec<_> = (0..4)
        .map(|i| Arc::new(MockServer::new(&format!("server-{i}"))))
        .collect();

    let supervisor = supervisor();
    let stop = supervisor.stop_handle();
    let run = tokio::spawn(supervisor.run(as_servers(&mocks)));

    for mock in &mocks {
        mock.wait_started().await;
    }
    tokio::time::sleep(Duration::from_millis(50)).await;
    for mock in &mocks {
        assert_eq!(mock.shutdowns(), 0);
    }

    assert!(stop.trigger(ShutdownCause::Requested));
    let report = tokio::time::timeout(Duration::from_secs(10), run)
        .await
        .expect("supervisor should finish")
        .unwrap()
        .unwrap();

    assert!(report.is_clean());
    for mock in &mocks {
        assert_eq!(mock.shutdowns(), 1);
    }
}

#[tokio::test]
async fn every_server_is_shut_down_exactly_once() {
    let mocks: Vec<_> = (0..16)
        .map(|i| Arc::new(MockServer::new(&format!("server-{i}"))))
        .collect();

    let supervisor = supervisor();
    let stop = supervisor.stop_handle();
    let watched = Arc::clone(&mocks[15]);
    tokio::spawn(async move {
        watched.wait_started().await;
        stop.trigger(ShutdownCause::Requested);
    });

    let report = run_with_timeout(supervisor, &mocks).await;

    assert!(matches!(report.cause, ShutdownCause::Requested));
    assert!(report.is_clean());
    assert_eq!(report.exit_code(), 0);
    for mock in &mocks {
        assert_eq!(mock.starts(), 1);
        assert_eq!(mock.shutdowns(), 1);
    }
}

#[tokio::test]
async fn simultaneous_failures_broadcast_once() {
    let mocks: Vec<_> = (0..8)
        .map(|i| Arc::new(MockServer::new(&format!("s{i}")).failing_after(Duration::from_millis(10))))
        .collect();

    let report = run_with_timeout(supervisor(), &mocks).await;

    assert!(report.cause.is_failure());
    for mock in &mocks {
        assert_eq!(mock.shutdowns(), 1);
    }
}

#[tokio::test]
async fn graceful_exit_without_signals_still_terminates() {
    let mocks = vec![
        Arc::new(MockServer::new("a").exiting_after(Duration::from_millis(20))),
        Arc::new(MockServer::new("b").exiting_after(Duration::from_millis(20))),
    ];

    let report = run_with_timeout(Supervisor::new(), &mocks).await;

    assert!(matches!(report.cause, ShutdownCause::ServerStopped { .. }));
    assert!(report.is_clean());
    for mock in &mocks {
        assert_eq!(mock.shutdowns(), 1);
    }
}

#[tokio::test]
async fn zero_servers_wait_for_a_request() {
    let supervisor = supervisor();
    let stop = supervisor.stop_handle();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        stop.trigger(ShutdownCause::Requested);
    });

    let report = run_with_timeout(supervisor, &[]).await;
    assert!(matches!(report.cause, ShutdownCause::Requested));
    assert!(report.is_clean());
}

#[tokio::test]
async fn shutdown_errors_are_reported_not_escalated() {
    let mocks = vec![
        Arc::new(MockServer::new("flaky").with_shutdown_error()),
        Arc::new(MockServer::new("steady")),
    ];

    let supervisor = supervisor();
    supervisor.stop_handle().trigger(ShutdownCause::Requested);
    let report = run_with_timeout(supervisor, &mocks).await;

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].server, "flaky");
    assert_eq!(mocks[1].shutdowns(), 1);
    assert!(!report.is_clean());
    assert_eq!(report.exit_code(), 1);
}

#[tokio::test]
async fn stuck_shutdown_is_abandoned_at_the_deadline() {
    let mocks = vec![
        Arc::new(MockServer::new("stuck").hanging_on_shutdown()),
        Arc::new(MockServer::new("quick")),
    ];

    let supervisor = Supervisor::new().with_shutdown_timeout(Some(Duration::from_millis(100)));
    supervisor.stop_handle().trigger(ShutdownCause::Requested);

    let started = Instant::now();
    let report = run_with_timeout(supervisor, &mocks).await;

    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(report.timed_out, vec!["stuck".to_string()]);
    assert!(report.failures.is_empty());
    assert_eq!(mocks[1].shutdowns(), 1);
    assert_eq!(report.exit_code(), 1);
}
