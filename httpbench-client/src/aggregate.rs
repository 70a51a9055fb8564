use crate::phase::BenchmarkRun;
use crate::worker::WorkerResult;
use httpbench_common::MetricsRecord;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::warn;

/// All worker batches of one phase, concatenated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedOutcomes {
    pub latencies_ms: Vec<f64>,
    pub failures: u64,
    pub workers_reported: usize,
}

impl MergedOutcomes {
    pub fn merge(&mut self, result: WorkerResult) {
        self.latencies_ms.extend(result.latencies_ms);
        self.failures += result.failures;
        self.workers_reported += 1;
    }

    pub fn successes(&self) -> u64 {
        self.latencies_ms.len() as u64
    }

    pub fn total(&self) -> u64 {
        self.successes() + self.failures
    }
}

/// Receive up to `expected` worker results, giving up at `wait_until`.
///
/// Whatever arrived by then is returned; a worker that never reports is
/// simply missing from the merge.
pub async fn collect(
    mut results: mpsc::Receiver<WorkerResult>,
    expected: usize,
    wait_until: Instant,
) -> MergedOutcomes {
    let wait_until = tokio::time::Instant::from_std(wait_until);
    let mut merged = MergedOutcomes::default();

    while merged.workers_reported < expected {
        match tokio::time::timeout_at(wait_until, results.recv()).await {
            Ok(Some(result)) => merged.merge(result),
            // Every sender is gone: no further reports can arrive.
            Ok(None) => break,
            Err(_) => break,
        }
    }

    if merged.workers_reported < expected {
        warn!(
            reported = merged.workers_reported,
            expected,
            "Not every worker reported before the grace period ended; continuing with partial results"
        );
    }
    merged
}

/// Element of ascending `sorted` at index `floor(n * q)`, clamped to the last element.
/// Returns 0.0 for an empty slice.
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = (q * sorted.len() as f64).floor() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

/// Turn a phase's merged outcomes into its final record.
///
/// Returns `None` when no request succeeded. Error rate and throughput are
/// computed against the configured duration of `run`, not the elapsed time.
pub fn compute_record(library: &str, language: &str, run: &BenchmarkRun, merged: MergedOutcomes) -> Option<MetricsRecord> {
    if merged.latencies_ms.is_empty() {
        return None;
    }

    let successful_requests = merged.successes();
    let failed_requests = merged.failures;
    let total_requests = successful_requests + failed_requests;
    let duration_secs = run.duration.as_secs();

    let mut sorted = merged.latencies_ms;
    sorted.sort_unstable_by(f64::total_cmp);
    let sum: f64 = sorted.iter().sum();

    Some(MetricsRecord {
        library: library.to_string(),
        language: language.to_string(),
        concurrency: run.concurrency,
        duration: duration_secs,
        total_requests,
        successful_requests,
        failed_requests,
        error_rate: failed_requests as f64 / total_requests as f64 * 100.0,
        throughput: total_requests as f64 / duration_secs as f64,
        latency_avg_ms: sum / sorted.len() as f64,
        latency_p50_ms: percentile(&sorted, 0.50),
        latency_p95_ms: percentile(&sorted, 0.95),
        latency_p99_ms: percentile(&sorted, 0.99),
        latency_min_ms: sorted[0],
        latency_max_ms: sorted[sorted.len() - 1],
    })
}
