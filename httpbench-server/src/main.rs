use clap::Parser;
use httpbench_server::config::DEFAULT_PORT;
use httpbench_server::{Server, ServerConfig};
use std::net::{Ipv4Addr, SocketAddr};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "httpbench-server", about = "Echo target for HTTP client benchmarks")]
struct Args {
    /// Port to listen on (all interfaces).
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let args = Args::parse();
    let address = SocketAddr::from((Ipv4Addr::UNSPECIFIED, args.port));
    info!(port = args.port, "Server starting");

    let (ready_tx, _ready_rx) = tokio::sync::oneshot::channel();
    Server::new(ServerConfig { address }).run(ready_tx).await?;
    Ok(())
}
