//! Shared connection pool for every worker of a run.
//!
//! `reqwest::Client` keeps its idle connections in an `Arc`-backed pool, so
//! cloning the client into each worker shares one pool. The phase controller
//! builds it once and hands clones to both phases, which is what carries the
//! warmed connections into the measurement phase.

use httpbench_common::{BenchError, Result};
use std::time::Duration;

/// Build the HTTP client workers send load through.
///
/// Idle connections per host are capped at `concurrency`: each worker has at
/// most one request in flight, so that is exactly the number worth keeping warm.
/// Idle connections never expire client-side, so a settle pause of any length
/// between the phases leaves the warmed connections in the pool.
/// `request_timeout` bounds the whole exchange, body included.
pub fn build_http_client(concurrency: usize, request_timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(request_timeout)
        .pool_max_idle_per_host(concurrency)
        .pool_idle_timeout(None::<Duration>)
        .tcp_nodelay(true)
        .build()
        .map_err(|e| BenchError::InvalidConfig(format!("Failed to build HTTP client: {e}")))
}
