use clap::Parser;
use httpbench_client::config::BenchConfig;
use httpbench_client::output::write_record;
use httpbench_client::phase::PhaseController;
use httpbench_client::LIBRARY;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let config = BenchConfig::parse();
    info!(library = LIBRARY, "Starting benchmark");
    info!(
        server = %config.server_url,
        concurrency = config.concurrency,
        warmup_secs = config.warmup_secs,
        test_secs = config.test_secs,
        "Configuration"
    );

    let controller = PhaseController::new(config).map_err(|e| {
        error!(error = %e, "Refusing to start");
        e
    })?;

    let Some(record) = controller.run().await else {
        warn!(
            concurrency = controller.config().concurrency,
            "No successful requests; no results written"
        );
        return Ok(());
    };

    println!("{}", "=".repeat(60));
    println!("RESULTS");
    println!("{}", "=".repeat(60));
    println!("{}", serde_json::to_string_pretty(&record)?);

    let path = write_record(&controller.config().results_dir, &record)?;
    info!(path = %path.display(), "Results saved");
    Ok(())
}
