use httpbench_common::{
    BenchError, ErrorResponse, HealthResponse, MetricsSnapshot, Result, HEALTH_PATH, METRICS_PATH, RESET_PATH,
    START_COLLECTION_PATH, STOP_COLLECTION_PATH,
};
use std::time::Duration;

/// Timeout for every control-surface call; these never share the load pool's limits.
pub const CONTROL_TIMEOUT: Duration = Duration::from_secs(5);

/// Client for the echo server's `/control/*` and `/health` endpoints.
pub struct ControlClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl ControlClient {
    /// Create a control client for the server at `base_url` (e.g. `http://server:8080`).
    pub fn new(base_url: &str) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(CONTROL_TIMEOUT)
            .build()
            .map_err(|e| BenchError::InvalidConfig(format!("Failed to build control client: {e}")))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    /// Build the URL for an endpoint path against the configured server.
    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Ask the server to start counting requests.
    pub async fn start_collection(&self) -> Result<()> {
        self.post(START_COLLECTION_PATH).await
    }

    /// Ask the server to stop counting requests.
    pub async fn stop_collection(&self) -> Result<()> {
        self.post(STOP_COLLECTION_PATH).await
    }

    /// Zero the server's counters and latency list.
    pub async fn reset(&self) -> Result<()> {
        self.post(RESET_PATH).await
    }

    /// Fetch the server's current metrics snapshot.
    pub async fn metrics(&self) -> Result<MetricsSnapshot> {
        let response = self.get(METRICS_PATH).await?;
        response
            .json::<MetricsSnapshot>()
            .await
            .map_err(|e| BenchError::MalformedResponse(e.to_string()))
    }

    /// Probe `GET /health`.
    pub async fn health(&self) -> Result<HealthResponse> {
        let response = self.get(HEALTH_PATH).await?;
        response
            .json::<HealthResponse>()
            .await
            .map_err(|e| BenchError::MalformedResponse(e.to_string()))
    }

    async fn post(&self, path: &str) -> Result<()> {
        let response = self
            .http_client
            .post(self.build_url(path))
            .send()
            .await
            .map_err(|e| BenchError::NetworkError(e.to_string()))?;
        check_status(response).await.map(|_| ())
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response> {
        let response = self
            .http_client
            .get(self.build_url(path))
            .send()
            .await
            .map_err(|e| BenchError::NetworkError(e.to_string()))?;
        check_status(response).await
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorResponse>(&body) {
        Ok(envelope) => envelope.error,
        Err(_) if body.is_empty() => format!("Server returned status: {}", status),
        Err(_) => body,
    };
    Err(BenchError::HttpError(status.as_u16(), message))
}
