//! Main entry point for the photo-export CLI

use clap::Parser;
use photo_export::cli::Cli;
use photo_export::metrics;
use photo_export::shutdown::ShutdownCoordinator;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Exit code for a run stopped by Ctrl+C
const EXIT_INTERRUPTED: i32 = 130;

/// Initialize tracing subscriber with optional JSON formatting
fn init_tracing() {
    let json_format = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("photo_export=info"));

    if json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn run(cli: Cli) -> anyhow::Result<i32> {
    if let Some(addr) = cli.metrics_addr {
        metrics::init_metrics(addr).await?;
    }

    let shutdown = ShutdownCoordinator::shared();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Ctrl+C received - finishing in-flight bookkeeping...");
                shutdown.request_shutdown();
            }
        }
    });

    let summary = match cli.execute(shutdown).await {
        Ok(summary) => summary,
        Err(e) if e.is_interrupted() => {
            warn!(error = %e, "Export interrupted before downloads started; run again to resume");
            return Ok(EXIT_INTERRUPTED);
        }
        Err(e) => return Err(e.into()),
    };
    println!("{summary}");

    if !summary.is_complete() {
        warn!(cancelled = summary.cancelled, "Export interrupted; run again to resume");
        return Ok(EXIT_INTERRUPTED);
    }
    if summary.failed > 0 {
        warn!(failed = summary.failed, "Some photos failed; run again to retry them");
    } else {
        info!("Export complete");
    }
    Ok(0)
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("Export failed: {:#}", e);
            std::process::exit(1);
        }
    }
}
