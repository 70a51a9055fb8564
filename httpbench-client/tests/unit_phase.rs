use httpbench_client::config::BenchConfig;
use httpbench_client::phase::{Phase, PhaseController};
use httpbench_common::BenchError;
use std::time::{Duration, Instant};

fn config(server_url: &str, concurrency: usize, warmup_secs: u64, test_secs: u64) -> BenchConfig {
    BenchConfig {
        server_url: server_url.to_string(),
        concurrency,
        warmup_secs,
        test_secs,
        request_timeout_secs: 2,
        grace_period_secs: 3,
        ..Default::default()
    }
}

#[test]
fn test_new_rejects_invalid_config() {
    let result = PhaseController::new(config("http://127.0.0.1:1", 0, 0, 1));
    assert!(matches!(result, Err(BenchError::InvalidConfig(_))));
}

#[test]
fn test_new_rejects_settle_delay_that_cannot_be_scheduled() {
    let config = BenchConfig {
        settle_secs: u64::MAX / 2,
        ..config("http://127.0.0.1:1", 1024, 1, 1)
    };
    assert!(matches!(PhaseController::new(config), Err(BenchError::InvalidConfig(_))));
}

#[test]
fn test_phase_runs_share_concurrency() {
    let controller = PhaseController::new(config("http://127.0.0.1:1", 16, 3, 7)).unwrap();

    let warmup = controller.warmup_run();
    assert_eq!(warmup.phase, Phase::Warmup);
    assert_eq!(warmup.concurrency, 16);
    assert_eq!(warmup.duration, Duration::from_secs(3));

    let measurement = controller.measurement_run();
    assert_eq!(measurement.phase, Phase::Measurement);
    assert_eq!(measurement.concurrency, 16);
    assert_eq!(measurement.duration, Duration::from_secs(7));
    assert_eq!(measurement.phase.as_name(), "measurement");
}

#[tokio::test]
async fn test_run_brackets_measurement_with_collection_calls() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/")
        .with_status(200)
        .with_body(r#"{"msg":"ok"}"#)
        .expect_at_least(1)
        .create_async()
        .await;
    let start = server.mock("POST", "/control/start-collection").with_status(200).expect(1).create_async().await;
    let stop = server.mock("POST", "/control/stop-collection").with_status(200).expect(1).create_async().await;

    let controller = PhaseController::new(config(&server.url(), 2, 0, 1)).unwrap();
    let record = controller.run().await.expect("a run with successes yields a record");

    assert_eq!(record.library, "reqwest");
    assert_eq!(record.language, "rust");
    assert_eq!(record.concurrency, 2);
    assert_eq!(record.duration, 1);
    assert_eq!(record.failed_requests, 0);
    assert_eq!(record.error_rate, 0.0);
    assert_eq!(record.total_requests, record.successful_requests);
    assert_eq!(record.throughput, record.total_requests as f64);
    start.assert_async().await;
    stop.assert_async().await;
}

#[tokio::test]
async fn test_run_without_successes_yields_no_record() {
    let mut server = mockito::Server::new_async().await;
    server.mock("POST", "/").with_status(500).create_async().await;
    server.mock("POST", "/control/start-collection").with_status(200).create_async().await;
    server.mock("POST", "/control/stop-collection").with_status(200).create_async().await;

    let controller = PhaseController::new(config(&server.url(), 2, 0, 1)).unwrap();

    let measured = controller.run_phase(&controller.measurement_run()).await;
    assert!(measured.latencies_ms.is_empty());
    assert_eq!(measured.failures, measured.total());
    assert!(measured.failures >= 1);
    assert_eq!(measured.workers_reported, 2);

    assert!(controller.run().await.is_none());
}

#[tokio::test]
async fn test_run_survives_missing_control_endpoints() {
    let mut server = mockito::Server::new_async().await;
    // Only the echo route exists; control calls get mockito's 501.
    server
        .mock("POST", "/")
        .with_status(200)
        .with_body(r#"{"msg":"ok"}"#)
        .create_async()
        .await;

    let controller = PhaseController::new(config(&server.url(), 1, 0, 1)).unwrap();
    assert!(controller.run().await.is_some());
}

#[tokio::test]
async fn test_run_survives_unreachable_server() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let controller = PhaseController::new(config(&format!("http://{addr}"), 2, 0, 1)).unwrap();
    let started = Instant::now();
    assert!(controller.run().await.is_none());
    // One measured second plus at most one in-flight request; nothing waits on the grace period.
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
async fn test_phase_overrun_is_bounded_by_one_request() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/")
        .with_status(200)
        .with_body(r#"{"msg":"ok"}"#)
        .create_async()
        .await;

    let controller = PhaseController::new(config(&server.url(), 4, 0, 1)).unwrap();
    let started = Instant::now();
    let measured = controller.run_phase(&controller.measurement_run()).await;

    assert!(started.elapsed() >= Duration::from_secs(1));
    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(measured.workers_reported, 4);
}
