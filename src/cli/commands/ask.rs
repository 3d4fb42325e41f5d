//! Ask CLI command.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::cli::commands::search::key_filter;
use crate::cli::context::AppContext;
use crate::cli::output::{output, preview, CommandOutput};
use crate::services::Answer;

#[derive(Args, Debug)]
pub struct AskArgs {
    /// Question to answer
    pub question: String,

    /// Number of documents used as context (defaults to search.default_k)
    #[arg(short)]
    pub k: Option<usize>,

    /// Restrict context to these document keys (repeatable)
    #[arg(long = "key")]
    pub keys: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct AskOutput {
    #[serde(flatten)]
    pub answer: Answer,
}

impl CommandOutput for AskOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![self.answer.answer.clone()];
        if !self.answer.sources.is_empty() {
            lines.push(String::new());
            lines.push("Sources:".to_string());
            for (i, hit) in self.answer.sources.iter().enumerate() {
                lines.push(format!("  [{}] {} ({:.2}) {}", i + 1, hit.key, hit.score, preview(&hit.text, 50)));
            }
        }
        if let Some(reason) = &self.answer.diagnostic {
            lines.push(format!("(retrieval degraded: {reason})"));
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: AskArgs, ctx: &AppContext, json: bool) -> Result<()> {
    let filter = key_filter(&args.keys)?;
    let rag = ctx.rag()?;
    let answer = rag
        .answer(&args.question, args.k, filter.as_ref())
        .await
        .context("Failed to answer question")?;
    output(&AskOutput { answer }, json);
    Ok(())
}
