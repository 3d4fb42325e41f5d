//! Ingest CLI command.

use anyhow::{bail, Context, Result};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::context::AppContext;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Metadata;

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Document text (omit to use --file or stdin)
    pub text: Option<String>,

    /// Read the document body from a file
    #[arg(short, long, conflicts_with = "text")]
    pub file: Option<PathBuf>,

    /// Metadata entries (format: "key=value", value parsed as JSON when possible)
    #[arg(short, long)]
    pub meta: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct IngestOutput {
    pub key: String,
    pub chars: usize,
}

impl CommandOutput for IngestOutput {
    fn to_human(&self) -> String {
        format!("Ingested document {} ({} chars)", self.key, self.chars)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({ "key": self.key, "chars": self.chars })
    }
}

pub async fn execute(args: IngestArgs, ctx: &AppContext, json: bool) -> Result<()> {
    let mut metadata = parse_metadata(&args.meta)?;
    let text = match (args.text, args.file) {
        (Some(text), _) => text,
        (None, Some(path)) => {
            let text = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            metadata
                .entry("source")
                .or_insert_with(|| serde_json::Value::String(path.display().to_string()));
            text
        }
        (None, None) => {
            use tokio::io::AsyncReadExt;
            let mut text = String::new();
            tokio::io::stdin()
                .read_to_string(&mut text)
                .await
                .context("Failed to read document from stdin")?;
            text
        }
    };

    let key = ctx.retrieval.ingest(&text, metadata).await.context("Failed to ingest document")?;
    output(
        &IngestOutput {
            key: key.into_inner(),
            chars: text.chars().count(),
        },
        json,
    );
    Ok(())
}

/// Parse `key=value` pairs; values that are valid JSON keep their type.
pub fn parse_metadata(entries: &[String]) -> Result<Metadata> {
    let mut metadata = Metadata::new();
    for entry in entries {
        let Some((key, value)) = entry.split_once('=') else {
            bail!("Invalid metadata entry '{entry}', expected key=value");
        };
        let key = key.trim();
        if key.is_empty() {
            bail!("Invalid metadata entry '{entry}', key is empty");
        }
        let value = serde_json::from_str(value).unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
        metadata.insert(key.to_string(), value);
    }
    Ok(metadata)
}
