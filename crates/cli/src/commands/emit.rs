//! `emit` command implementation.

use anyhow::{Context, Result};
use contracts::RawEvent;
use serde_json::Value;
use tracing::info;

use super::router::{build_dispatcher, print_report};
use crate::cli::EmitArgs;

/// Execute the `emit` command
pub async fn run_emit(args: &EmitArgs) -> Result<()> {
    let context = args
        .context
        .as_deref()
        .map(serde_json::from_str::<Value>)
        .transpose()
        .context("--context must be valid JSON")?;

    let dispatcher = build_dispatcher(&args.router).await?;
    let decision = dispatcher.route(args.severity.parse().unwrap_or_default());
    info!(
        category = %args.category,
        severity = %args.severity,
        persist = decision.persist,
        alert = decision.alert,
        notify = decision.notify,
        sample_rate = dispatcher.sample_rate(),
        "Emitting event"
    );

    dispatcher.track_raw(RawEvent {
        category: args.category.clone(),
        action: args.action.clone(),
        message: args.message.clone(),
        severity: args.severity.clone(),
        context,
    });

    let report = dispatcher.shutdown().await;
    print_report(&report, false)
}
