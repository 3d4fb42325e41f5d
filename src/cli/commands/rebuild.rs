//! Rebuild CLI command.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::time::Duration;

use crate::cli::context::AppContext;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::RebuildReport;

#[derive(Args, Debug)]
pub struct RebuildArgs {
    /// Abort after this many seconds (overrides rebuild.timeout_secs)
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Documents per embedding batch (overrides rebuild.batch_size)
    #[arg(long)]
    pub batch_size: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct RebuildOutput {
    #[serde(flatten)]
    pub report: RebuildReport,
    pub elapsed_ms: u64,
}

impl CommandOutput for RebuildOutput {
    fn to_human(&self) -> String {
        let mut summary = format!(
            "Rebuilt index: {} of {} document(s) indexed, {} failed ({} ms)",
            self.report.processed, self.report.total, self.report.failed, self.elapsed_ms
        );
        if !self.report.persisted {
            summary.push_str("\nWarning: the rebuilt index could not be saved to disk");
        }
        summary
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Run a rebuild; Ctrl-C cancels it and keeps the previous index.
pub async fn execute(args: RebuildArgs, ctx: &AppContext, json: bool) -> Result<()> {
    let mut options = ctx.retrieval.rebuild_options();
    if let Some(secs) = args.timeout_secs {
        options = options.with_timeout(Some(Duration::from_secs(secs)));
    }
    if let Some(batch_size) = args.batch_size {
        options.batch_size = batch_size.max(1);
    }

    let cancel = options.cancel.clone();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling rebuild");
            cancel.cancel();
        }
    });

    let started = std::time::Instant::now();
    let result = ctx.retrieval.rebuild(&options).await;
    ctrl_c.abort();

    let report = result.context("Index rebuild did not complete")?;
    output(
        &RebuildOutput {
            report,
            elapsed_ms: started.elapsed().as_millis() as u64,
        },
        json,
    );
    Ok(())
}
