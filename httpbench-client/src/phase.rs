use crate::aggregate::{collect, compute_record, MergedOutcomes};
use crate::config::BenchConfig;
use crate::control::ControlClient;
use crate::pool::build_http_client;
use crate::worker::spawn_workers;
use crate::{LANGUAGE, LIBRARY};
use httpbench_common::{MetricsRecord, Result, ECHO_PATH};
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Warmup,
    Measurement,
}

impl Phase {
    pub fn as_name(&self) -> &'static str {
        match self {
            Phase::Warmup => "warmup",
            Phase::Measurement => "measurement",
        }
    }
}

/// One phase invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenchmarkRun {
    pub concurrency: usize,
    pub duration: Duration,
    pub phase: Phase,
}

/// Sequences warmup then measurement over a single connection pool.
///
/// The pool is built once in [`PhaseController::new`] and both phases clone
/// it, so connections opened during warmup are the ones measurement uses.
/// Only the per-phase outcomes start from scratch.
pub struct PhaseController {
    config: BenchConfig,
    http_client: reqwest::Client,
    control: ControlClient,
    echo_url: String,
}

impl PhaseController {
    /// Validate `config` and build the shared pool.
    pub fn new(config: BenchConfig) -> Result<Self> {
        config.validate()?;
        let http_client = build_http_client(config.concurrency, config.request_timeout())?;
        let control = ControlClient::new(config.base_url())?;
        let echo_url = format!("{}{}", config.base_url(), ECHO_PATH);
        Ok(Self { config, http_client, control, echo_url })
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    pub fn control(&self) -> &ControlClient {
        &self.control
    }

    pub fn warmup_run(&self) -> BenchmarkRun {
        BenchmarkRun {
            concurrency: self.config.concurrency,
            duration: self.config.warmup(),
            phase: Phase::Warmup,
        }
    }

    pub fn measurement_run(&self) -> BenchmarkRun {
        BenchmarkRun {
            concurrency: self.config.concurrency,
            duration: self.config.measurement(),
            phase: Phase::Measurement,
        }
    }

    /// Drive `run.concurrency` workers until the phase deadline and merge what they report.
    pub async fn run_phase(&self, run: &BenchmarkRun) -> MergedOutcomes {
        let deadline = Instant::now() + run.duration;
        let (results, handles) = spawn_workers(&self.http_client, &self.echo_url, run.concurrency, deadline);

        let merged = collect(results, run.concurrency, deadline + self.config.grace_period()).await;

        // Only workers that blew through the grace period are still running here.
        for handle in handles {
            handle.abort();
        }
        merged
    }

    /// Run warmup and measurement back to back.
    ///
    /// Returns `None` when the measurement phase had no successful request.
    /// Control calls are best-effort: a server that rejects or never sees
    /// them does not stop the run.
    pub async fn run(&self) -> Option<MetricsRecord> {
        let warmup = self.warmup_run();
        info!(seconds = warmup.duration.as_secs(), "Phase 1: Warmup");
        let warmed = self.run_phase(&warmup).await;
        info!(requests = warmed.total(), "Warmup completed");
        drop(warmed);

        let settle = self.config.settle_policy().delay_for(self.config.concurrency);
        if !settle.is_zero() {
            info!(?settle, "Settling before measurement");
            tokio::time::sleep(settle).await;
        }

        if let Err(e) = self.control.start_collection().await {
            warn!(error = %e, "Could not signal start-collection; continuing");
        }

        let measurement = self.measurement_run();
        info!(seconds = measurement.duration.as_secs(), "Phase 2: Measurement");
        let measured = self.run_phase(&measurement).await;

        if let Err(e) = self.control.stop_collection().await {
            warn!(error = %e, "Could not signal stop-collection; continuing");
        }

        info!(
            requests = measured.total(),
            successful = measured.successes(),
            failed = measured.failures,
            "Measurement completed"
        );

        compute_record(LIBRARY, LANGUAGE, &measurement, measured)
    }
}
