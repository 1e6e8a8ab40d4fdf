//! Publish a batch of funding-rate snapshots through the primary provider.
//!
//! ```text
//! funding-publish <snapshots.json> [--concurrency N]
//! ```
//!
//! The input is a JSON array of snapshots. Configuration comes from the
//! TOML file named by `BRIDGE_CONFIG` (default `bridge.toml`) and the
//! environment, including a `.env` file when present. Results are printed
//! as JSON keyed by symbol; the exit code is non-zero if any publish failed.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use bridge_core::telemetry::{init_tracing, LogFormat};
use bridge_core::{BridgeConfig, FundingRateSnapshot, PublisherFactory};

const DEFAULT_CONFIG_PATH: &str = "bridge.toml";

struct Args {
    input: PathBuf,
    concurrency: Option<usize>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args> {
    let mut input = None;
    let mut concurrency = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--concurrency" => {
                let value = args.next().context("--concurrency needs a value")?;
                concurrency = Some(value.parse().context("--concurrency must be a number")?);
            }
            _ if input.is_none() => input = Some(PathBuf::from(arg)),
            other => bail!("unexpected argument {other}"),
        }
    }
    let input = input.context("usage: funding-publish <snapshots.json> [--concurrency N]")?;
    Ok(Args { input, concurrency })
}

fn read_snapshots(path: &Path) -> Result<BTreeMap<String, FundingRateSnapshot>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let snapshots: Vec<FundingRateSnapshot> =
        serde_json::from_str(&content).context("snapshots must be a JSON array")?;

    let mut by_symbol = BTreeMap::new();
    for snapshot in snapshots {
        if let Some(previous) = by_symbol.insert(snapshot.symbol.clone(), snapshot) {
            warn!(symbol = %previous.symbol, "duplicate snapshot, keeping the last one");
        }
    }
    Ok(by_symbol)
}

async fn run(args: Args) -> Result<bool> {
    let config_path = std::env::var("BRIDGE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
    let config = BridgeConfig::load(Some(Path::new(&config_path)))?;
    let factory = PublisherFactory::from_config(Arc::new(config))?;
    let publisher = factory.get_primary_publisher()?;

    let snapshots = read_snapshots(&args.input)?;
    info!(
        provider = %publisher.provider(),
        symbols = snapshots.len(),
        "publishing funding rates"
    );

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling in-flight publishes");
            on_signal.cancel();
        }
    });

    let results = publisher
        .publish_batch(&snapshots, args.concurrency, &cancel)
        .await;
    let failed = results.values().filter(|r| !r.success).count();

    println!("{}", serde_json::to_string_pretty(&results)?);
    info!(published = results.len() - failed, failed, "batch finished");
    Ok(failed == 0)
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    // A subscriber may already be installed by an embedding process.
    let _ = init_tracing(LogFormat::from_env(), "info");

    let outcome = match parse_args(std::env::args().skip(1)) {
        Ok(args) => run(args).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(e) => {
            error!(error = %e, "funding-publish failed");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
