//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::RawEvent;
use dispatcher::TelemetryDispatcher;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use super::router::{build_dispatcher, print_report};
use crate::cli::RunArgs;

/// Counts from one input stream
#[derive(Debug, Default)]
struct InputStats {
    lines: u64,
    routed: u64,
    malformed: u64,
}

/// Execute the `run` command
pub async fn run_router(args: &RunArgs) -> Result<()> {
    let dispatcher = build_dispatcher(&args.router).await?;
    let shutdown_signal = setup_shutdown_signal();

    info!(
        input = %args.input.as_ref().map_or("stdin".to_string(), |p| p.display().to_string()),
        "Routing events..."
    );

    let routed = async {
        match &args.input {
            Some(path) => {
                let file = tokio::fs::File::open(path)
                    .await
                    .with_context(|| format!("Failed to open input {}", path.display()))?;
                route_lines(&dispatcher, BufReader::new(file)).await
            }
            None => route_lines(&dispatcher, BufReader::new(tokio::io::stdin())).await,
        }
    };

    tokio::select! {
        result = routed => {
            let stats = result.context("Reading events failed")?;
            info!(
                lines = stats.lines,
                routed = stats.routed,
                malformed = stats.malformed,
                "Input exhausted"
            );
        }
        _ = shutdown_signal => {
            warn!("Received shutdown signal, flushing pending records...");
        }
    }

    if let Err(e) = dispatcher.drain().await {
        warn!(error = %e, "Final drain failed");
    }
    let report = dispatcher.shutdown().await;
    print_report(&report, args.json)?;

    info!("Telemetry Router finished");
    Ok(())
}

/// Route one `RawEvent` per non-empty line
async fn route_lines<R>(dispatcher: &TelemetryDispatcher, reader: R) -> Result<InputStats>
where
    R: AsyncBufRead + Unpin,
{
    let mut stats = InputStats::default();
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        stats.lines += 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<RawEvent>(line) {
            Ok(raw) => {
                dispatcher.track_raw(raw);
                stats.routed += 1;
            }
            Err(e) => {
                stats.malformed += 1;
                warn!(line = stats.lines, error = %e, "Skipping malformed event");
            }
        }
    }

    Ok(stats)
}

/// Setup Ctrl+C and SIGTERM signal handlers
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
