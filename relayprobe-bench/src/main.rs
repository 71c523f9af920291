use anyhow::{Context, Result};
use clap::Parser;
use relayprobe_bench::config::{check_batch_size, parse_relay_url, TestMode, DEFAULT_RELAY_URL};
use relayprobe_bench::driver;
use relayprobe_bench::metrics::ResultSet;
use relayprobe_bench::report;
use relayprobe_client::{ProbeConfig, WsProbe};
use std::process;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "relayprobe", about = "WebSocket connection performance tester for message relays")]
struct Args {
    /// WebSocket URL of the relay
    #[arg(default_value = DEFAULT_RELAY_URL)]
    relay_url: String,

    /// Number of connections to test per mode
    #[arg(short = 'n', long, default_value_t = 100)]
    count: usize,

    /// Which drivers to run
    #[arg(short, long, value_enum, default_value_t = TestMode::Both)]
    mode: TestMode,

    /// Delay between sequential connections (ms)
    #[arg(short, long, default_value_t = 50)]
    delay: u64,

    /// Number of concurrent connections per parallel batch
    #[arg(short, long, default_value_t = 10)]
    batch_size: usize,

    /// Log every connection instead of periodic progress
    #[arg(short, long)]
    verbose: bool,

    /// Save results to `<OUTPUT>_<mode>.json`
    #[arg(short, long)]
    output: Option<String>,

    /// Connect deadline (seconds)
    #[arg(long, default_value_t = 10)]
    connect_timeout_secs: u64,

    /// First-message deadline (seconds)
    #[arg(long, default_value_t = 5)]
    receive_timeout_secs: u64,

    /// Deadline for the relay's Close reply (seconds)
    #[arg(long, default_value_t = 10)]
    close_timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    if let Err(e) = parse_relay_url(&args.relay_url).and_then(|_| check_batch_size(args.batch_size)) {
        eprintln!("{e}");
        process::exit(3);
    }

    println!("Relay Connection Performance Tester");
    println!("Target:     {}", args.relay_url);
    println!("Test count: {}", args.count);
    println!("Mode:       {}", args.mode.as_name());

    let probe = WsProbe::new(ProbeConfig {
        url: args.relay_url.clone(),
        connect_timeout: Duration::from_secs(args.connect_timeout_secs),
        receive_timeout: Duration::from_secs(args.receive_timeout_secs),
        close_timeout: Duration::from_secs(args.close_timeout_secs),
    });

    // A failed save in one mode must not skip the other; the first error decides the exit code.
    let mut first_error = None;

    if args.mode.includes_sequential() {
        let delay = Duration::from_millis(args.delay);
        let results = driver::run_sequential(&probe, args.count, delay, args.verbose).await;
        if let Err(e) = finish_run(&args, &results, TestMode::Sequential) {
            first_error.get_or_insert(e);
        }
    }

    if args.mode.includes_parallel() {
        let results = driver::run_parallel(&probe, args.count, args.batch_size, args.verbose).await?;
        if let Err(e) = finish_run(&args, &results, TestMode::Parallel) {
            first_error.get_or_insert(e);
        }
    }

    println!();
    println!("Test completed!");
    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn finish_run(args: &Args, results: &ResultSet, mode: TestMode) -> Result<()> {
    report::render(results, &args.relay_url, &mut std::io::stdout().lock())
        .context("write report to stdout")?;

    if let Some(prefix) = args.output.as_deref() {
        let path = report::output_path(prefix, mode.as_name());
        report::save(results, &args.relay_url, &path)?;
        info!(path = %path.display(), "results saved");
    }
    Ok(())
}
