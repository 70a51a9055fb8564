use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use httpbench_common::{
    EchoResponse, ErrorResponse, HealthResponse, MetricsSnapshot, ECHO_PATH, HEALTH_PATH, METRICS_PATH, RESET_PATH,
    START_COLLECTION_PATH, STOP_COLLECTION_PATH,
};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::info;

pub mod config;
use config::LOCK_TIMEOUT;

/// Abstraction over wall-clock time for testability.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by `chrono::Utc`.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Mutex-guarded half of the store.
struct Samples {
    latencies_ms: Vec<f64>,
    start_time: DateTime<Utc>,
}

/// Gated request metrics shared by every handler.
///
/// The collecting flag and the counters are atomics so the echo path never
/// serializes on a read. Only the latency list sits behind the mutex, which
/// means `total_requests` may briefly run ahead of `latencies_ms.len()` while
/// writers are between the increment and the append.
pub struct MetricsStore {
    collecting: AtomicBool,
    total_requests: AtomicU64,
    total_errors: AtomicU64,
    samples: Mutex<Samples>,
    clock: Arc<dyn Clock>,
}

impl MetricsStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            collecting: AtomicBool::new(false),
            total_requests: AtomicU64::new(0),
            total_errors: AtomicU64::new(0),
            samples: Mutex::new(Samples { latencies_ms: Vec::new(), start_time: clock.now() }),
            clock,
        }
    }

    pub fn is_collecting(&self) -> bool {
        self.collecting.load(Ordering::Acquire)
    }

    /// Open the collection window and restart `start_time`.
    pub async fn start_collection(&self) {
        let mut samples = self.samples.lock().await;
        samples.start_time = self.clock.now();
        self.collecting.store(true, Ordering::Release);
    }

    pub fn stop_collection(&self) {
        self.collecting.store(false, Ordering::Release);
    }

    /// Count one served request and keep its latency.
    /// Returns `false` without touching anything when collection is off.
    pub async fn record(&self, latency_ms: f64) -> bool {
        if !self.is_collecting() {
            return false;
        }
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.samples.lock().await.latencies_ms.push(latency_ms);
        true
    }

    /// Zero both counters and drop every latency sample. The collecting flag is left as is.
    pub async fn reset(&self) {
        let mut samples = self.samples.lock().await;
        self.total_requests.store(0, Ordering::Relaxed);
        self.total_errors.store(0, Ordering::Relaxed);
        samples.latencies_ms = Vec::new();
        samples.start_time = self.clock.now();
    }

    pub async fn snapshot(&self) -> MetricsSnapshot {
        let samples = self.samples.lock().await;
        MetricsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            total_errors: self.total_errors.load(Ordering::Relaxed),
            latencies_ms: samples.latencies_ms.clone(),
            start_time: samples.start_time,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<MetricsStore>,
}

impl AppState {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { store: Arc::new(MetricsStore::new(clock)) }
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub address: SocketAddr,
}

/// Echo target server
pub struct Server {
    config: ServerConfig,
}

impl Server {
    /// Create a new server with the given configuration
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Get the server's configured address
    pub fn address(&self) -> SocketAddr {
        self.config.address
    }

    /// Create the application router with the given state
    pub fn create_router(state: AppState) -> Router {
        Router::new()
            .route(ECHO_PATH, post(handle_echo))
            .route(START_COLLECTION_PATH, post(handle_start_collection))
            .route(STOP_COLLECTION_PATH, post(handle_stop_collection))
            .route(RESET_PATH, post(handle_reset))
            .route(METRICS_PATH, get(handle_metrics))
            .route(HEALTH_PATH, get(handle_health))
            .with_state(state)
    }

    /// Run the server, signalling `ready_tx` with the bound address once accepting connections
    pub async fn run(self, ready_tx: tokio::sync::oneshot::Sender<SocketAddr>) -> Result<(), Box<dyn std::error::Error>> {
        let state = AppState::new(Arc::new(SystemClock));
        let app = Self::create_router(state);
        let listener = tokio::net::TcpListener::bind(self.config.address).await?;
        let local_addr = listener.local_addr()?;
        info!(%local_addr, "Server listening");
        ready_tx.send(local_addr).ok();
        axum::serve(listener, app).await?;
        Ok(())
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse { error: message.into() })).into_response()
}

fn lock_timeout_response() -> Response {
    error_response(StatusCode::SERVICE_UNAVAILABLE, "Server error: Lock acquisition timed out")
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_micros() as f64 / 1000.0
}

/// Handler for POST / — answers `{"msg":"ok"}` and, while collecting, records one latency sample.
/// The request body is read and discarded so the connection stays reusable.
pub async fn handle_echo(State(state): State<AppState>, _body: Bytes) -> Response {
    let start = Instant::now();
    let response = (StatusCode::OK, Json(EchoResponse::ok())).into_response();
    if state.store.is_collecting() {
        state.store.record(elapsed_ms(start)).await;
    }
    response
}

/// Handler for POST /control/start-collection
pub async fn handle_start_collection(State(state): State<AppState>) -> Response {
    if timeout(LOCK_TIMEOUT, state.store.start_collection()).await.is_err() {
        return lock_timeout_response();
    }
    info!("Started collecting metrics");
    StatusCode::OK.into_response()
}

/// Handler for POST /control/stop-collection
pub async fn handle_stop_collection(State(state): State<AppState>) -> Response {
    state.store.stop_collection();
    info!("Stopped collecting metrics");
    StatusCode::OK.into_response()
}

/// Handler for POST /control/reset
pub async fn handle_reset(State(state): State<AppState>) -> Response {
    if timeout(LOCK_TIMEOUT, state.store.reset()).await.is_err() {
        return lock_timeout_response();
    }
    info!("Metrics reset");
    StatusCode::OK.into_response()
}

/// Handler for GET /control/metrics
pub async fn handle_metrics(State(state): State<AppState>) -> Response {
    match timeout(LOCK_TIMEOUT, state.store.snapshot()).await {
        Ok(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        Err(_) => lock_timeout_response(),
    }
}

/// Handler for GET /health
pub async fn handle_health() -> Response {
    (StatusCode::OK, Json(HealthResponse::ok())).into_response()
}
