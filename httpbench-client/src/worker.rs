use httpbench_common::REQUEST_PAYLOAD;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RequestOutcome {
    /// 200 received and its body fully read.
    Success { latency_ms: f64 },
    /// Non-200 status, timeout, or connection error. No latency is kept.
    Failure,
}

/// Everything one worker observed over a phase, handed to the aggregator in one piece.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkerResult {
    /// Unordered.
    pub latencies_ms: Vec<f64>,
    pub failures: u64,
}

impl WorkerResult {
    pub fn record(&mut self, outcome: RequestOutcome) {
        match outcome {
            RequestOutcome::Success { latency_ms } => self.latencies_ms.push(latency_ms),
            RequestOutcome::Failure => self.failures += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.latencies_ms.len() as u64 + self.failures
    }
}

/// Send one load request and classify it.
///
/// The timer starts right before the send and stops only once the body has
/// been drained and the status checked, so every client pays for reading the
/// full response.
pub async fn send_request(client: &reqwest::Client, url: &str) -> RequestOutcome {
    let start = Instant::now();

    let response = match client
        .post(url)
        .header(CONTENT_TYPE, "application/json")
        .body(REQUEST_PAYLOAD)
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => {
            debug!(error = %e, "request failed");
            return RequestOutcome::Failure;
        }
    };

    let status = response.status();
    if let Err(e) = response.bytes().await {
        debug!(error = %e, "failed to read response body");
        return RequestOutcome::Failure;
    }
    if status != StatusCode::OK {
        debug!(%status, "unexpected status");
        return RequestOutcome::Failure;
    }

    let latency_ms = start.elapsed().as_micros() as f64 / 1000.0;
    RequestOutcome::Success { latency_ms }
}

/// Issue requests back to back until `deadline`, then return what was seen.
///
/// The deadline is only checked between requests: a request in flight when it
/// passes is allowed to finish, so a worker can overrun by one request.
pub async fn run_worker(client: reqwest::Client, url: Arc<str>, deadline: Instant) -> WorkerResult {
    let mut result = WorkerResult::default();
    while Instant::now() < deadline {
        result.record(send_request(&client, &url).await);
    }
    result
}

/// Start `count` workers against `url`. Each one sends its `WorkerResult` on the
/// returned channel exactly once, when it terminates.
pub fn spawn_workers(
    client: &reqwest::Client,
    url: &str,
    count: usize,
    deadline: Instant,
) -> (mpsc::Receiver<WorkerResult>, Vec<JoinHandle<()>>) {
    let (result_tx, result_rx) = mpsc::channel(count.max(1));
    let url: Arc<str> = Arc::from(url);

    let handles = (0..count)
        .map(|worker_id| {
            let client = client.clone();
            let url = url.clone();
            let result_tx = result_tx.clone();
            tokio::spawn(async move {
                let result = run_worker(client, url, deadline).await;
                debug!(worker_id, requests = result.total(), "worker finished");
                result_tx.send(result).await.ok();
            })
        })
        .collect();

    (result_rx, handles)
}
