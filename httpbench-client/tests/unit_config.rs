use clap::Parser;
use httpbench_client::config::{
    BenchConfig, SettlePolicy, DEFAULT_CONCURRENCY, DEFAULT_SERVER_URL, MAX_DURATION_SECS,
};
use httpbench_common::BenchError;
use std::path::PathBuf;
use std::time::Duration;

#[test]
fn test_defaults() {
    let config = BenchConfig::default();
    assert_eq!(config.server_url, DEFAULT_SERVER_URL);
    assert_eq!(config.server_url, "http://server:8080");
    assert_eq!(config.concurrency, DEFAULT_CONCURRENCY);
    assert_eq!(config.warmup(), Duration::from_secs(120));
    assert_eq!(config.measurement(), Duration::from_secs(180));
    assert_eq!(config.request_timeout(), Duration::from_secs(10));
    assert!(config.grace_period() > config.request_timeout());
    assert_eq!(config.results_dir, PathBuf::from("/results"));
    assert!(config.validate().is_ok());
}

#[test]
fn test_parse_flags() {
    let config = BenchConfig::try_parse_from([
        "httpbench-client",
        "--server-url",
        "http://127.0.0.1:9000/",
        "--concurrency",
        "32",
        "--warmup-duration",
        "5",
        "--test-duration",
        "10",
        "--results-dir",
        "/tmp/out",
    ])
    .unwrap();

    assert_eq!(config.concurrency, 32);
    assert_eq!(config.warmup(), Duration::from_secs(5));
    assert_eq!(config.measurement(), Duration::from_secs(10));
    assert_eq!(config.base_url(), "http://127.0.0.1:9000");
    assert_eq!(config.results_dir, PathBuf::from("/tmp/out"));
}

#[test]
fn test_validate_rejects_zero_concurrency() {
    let config = BenchConfig { concurrency: 0, ..Default::default() };
    assert!(matches!(config.validate(), Err(BenchError::InvalidConfig(_))));
}

#[test]
fn test_validate_rejects_zero_test_duration() {
    let config = BenchConfig { test_secs: 0, ..Default::default() };
    assert!(matches!(config.validate(), Err(BenchError::InvalidConfig(_))));
}

#[test]
fn test_validate_rejects_zero_request_timeout() {
    let config = BenchConfig { request_timeout_secs: 0, ..Default::default() };
    assert!(matches!(config.validate(), Err(BenchError::InvalidConfig(_))));
}

#[test]
fn test_validate_rejects_url_without_scheme() {
    let config = BenchConfig { server_url: "server:8080".to_string(), ..Default::default() };
    assert!(matches!(config.validate(), Err(BenchError::InvalidConfig(_))));
}

#[test]
fn test_validate_allows_zero_warmup() {
    let config = BenchConfig { warmup_secs: 0, ..Default::default() };
    assert!(config.validate().is_ok());
}

#[test]
fn test_settle_policy_disabled_by_default() {
    let policy = BenchConfig::default().settle_policy();
    assert_eq!(policy.delay_for(8), Duration::ZERO);
    assert_eq!(policy.delay_for(4096), Duration::ZERO);
}

#[test]
fn test_settle_policy_scales_with_concurrency() {
    let policy = SettlePolicy {
        base: Duration::from_secs(2),
        scale_threshold: 256,
        max_multiplier: 4,
    };
    assert_eq!(policy.delay_for(8), Duration::from_secs(2));
    assert_eq!(policy.delay_for(255), Duration::from_secs(2));
    assert_eq!(policy.delay_for(256), Duration::from_secs(2));
    assert_eq!(policy.delay_for(512), Duration::from_secs(4));
    assert_eq!(policy.delay_for(1024), Duration::from_secs(8));
    // Capped at max_multiplier.
    assert_eq!(policy.delay_for(100_000), Duration::from_secs(8));
}

#[test]
fn test_settle_policy_is_monotonic() {
    let policy = SettlePolicy {
        base: Duration::from_millis(500),
        scale_threshold: 100,
        max_multiplier: 10,
    };
    let mut previous = Duration::ZERO;
    for concurrency in [1, 50, 99, 100, 150, 200, 450, 999, 5_000] {
        let delay = policy.delay_for(concurrency);
        assert!(delay >= previous, "delay shrank at concurrency {concurrency}");
        previous = delay;
    }
}

#[test]
fn test_settle_policy_saturates_instead_of_overflowing() {
    let policy = SettlePolicy {
        base: Duration::from_secs(u64::MAX / 2),
        scale_threshold: 256,
        max_multiplier: 4,
    };
    assert_eq!(policy.delay_for(1024), Duration::MAX);
}

#[test]
fn test_validate_rejects_durations_past_the_ceiling() {
    let too_long = MAX_DURATION_SECS + 1;
    for config in [
        BenchConfig { warmup_secs: too_long, ..Default::default() },
        BenchConfig { test_secs: too_long, ..Default::default() },
        BenchConfig { request_timeout_secs: too_long, ..Default::default() },
        BenchConfig { grace_period_secs: too_long, ..Default::default() },
        BenchConfig { settle_secs: too_long, ..Default::default() },
    ] {
        assert!(matches!(config.validate(), Err(BenchError::InvalidConfig(_))), "{config:?}");
    }
}

#[test]
fn test_validate_rejects_huge_settle_delay_before_any_phase_runs() {
    let config = BenchConfig::try_parse_from([
        "httpbench-client",
        "--settle-delay",
        "9223372036854775807",
        "--concurrency",
        "1024",
    ])
    .unwrap();
    assert!(matches!(config.validate(), Err(BenchError::InvalidConfig(_))));
    // Scaling alone must not panic either.
    let _ = config.settle_policy().delay_for(config.concurrency);
}

#[test]
fn test_validate_rejects_settle_delay_that_only_overflows_once_scaled() {
    let config = BenchConfig {
        settle_secs: MAX_DURATION_SECS,
        concurrency: 1024,
        ..Default::default()
    };
    assert!(matches!(config.validate(), Err(BenchError::InvalidConfig(_))));

    let below_threshold = BenchConfig { concurrency: 8, ..config };
    assert!(below_threshold.validate().is_ok());
}
