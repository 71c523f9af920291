use clap::Parser;
use relayprobe_relay::config::DEFAULT_ADDRESS;
use relayprobe_relay::{Relay, RelayConfig};
use std::net::SocketAddr;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "relayprobe-relay", about = "Stub relay answering every subscription with EOSE")]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value_t = DEFAULT_ADDRESS)]
    address: SocketAddr,

    /// Delay before answering each subscription (ms).
    #[arg(long, default_value_t = 0)]
    response_delay_ms: u64,

    /// Never answer subscriptions (exercises client receive timeouts).
    #[arg(long)]
    silent: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let config = RelayConfig {
        address: args.address,
        response_delay: Duration::from_millis(args.response_delay_ms),
        silent: args.silent,
    };

    let (ready_tx, ready_rx) = tokio::sync::oneshot::channel();

    // Log the bound address once the relay signals it is listening.
    tokio::spawn(async move {
        if let Ok(addr) = ready_rx.await {
            info!(%addr, "listening");
        }
    });

    Relay::new(config).run(ready_tx).await?;
    Ok(())
}
