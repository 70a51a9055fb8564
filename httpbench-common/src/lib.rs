use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ECHO_PATH: &str = "/";
pub const START_COLLECTION_PATH: &str = "/control/start-collection";
pub const STOP_COLLECTION_PATH: &str = "/control/stop-collection";
pub const RESET_PATH: &str = "/control/reset";
pub const METRICS_PATH: &str = "/control/metrics";
pub const HEALTH_PATH: &str = "/health";

/// Body every load request carries.
pub const REQUEST_PAYLOAD: &str = r#"{"msg":"hello"}"#;

/// Error types for benchmark operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BenchError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("HTTP {0}: {1}")]
    HttpError(u16, String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Failed to write results to {path}: {message}")]
    Output { path: String, message: String },
}

/// Fixed body returned by `POST /`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EchoResponse {
    pub msg: String,
}

impl EchoResponse {
    pub fn ok() -> Self {
        Self { msg: "ok".to_string() }
    }
}

/// Body returned by `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self { status: "ok".to_string() }
    }
}

/// Point-in-time copy of the server's metrics store, as served by `GET /control/metrics`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub total_errors: u64,
    pub latencies_ms: Vec<f64>,
    pub start_time: DateTime<Utc>,
}

/// Final statistics of one measurement phase. One of these is written per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub library: String,
    pub language: String,
    pub concurrency: usize,
    /// Configured measurement duration in seconds.
    pub duration: u64,
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    /// Percentage in `0.0..=100.0`.
    pub error_rate: f64,
    /// Requests per second over the configured duration.
    pub throughput: f64,
    pub latency_avg_ms: f64,
    pub latency_p50_ms: f64,
    pub latency_p95_ms: f64,
    pub latency_p99_ms: f64,
    pub latency_min_ms: f64,
    pub latency_max_ms: f64,
}

/// JSON error envelope the server returns for every error response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Result type for benchmark operations
pub type Result<T> = std::result::Result<T, BenchError>;
