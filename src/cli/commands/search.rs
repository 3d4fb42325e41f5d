//! Search CLI command.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::cli::context::AppContext;
use crate::cli::output::{output, preview, table_with_header, CommandOutput};
use crate::domain::models::{DocumentKey, KeyFilter, SearchResponse};

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Query text
    pub query: String,

    /// Number of results (defaults to search.default_k)
    #[arg(short)]
    pub k: Option<usize>,

    /// Restrict results to these document keys (repeatable)
    #[arg(long = "key")]
    pub keys: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchOutput {
    pub query: String,
    #[serde(flatten)]
    pub response: SearchResponse,
}

impl CommandOutput for SearchOutput {
    fn to_human(&self) -> String {
        if self.response.results.is_empty() {
            return match &self.response.diagnostic {
                Some(reason) => format!("No results ({reason})."),
                None => "No results.".to_string(),
            };
        }

        let mut table = table_with_header(&["#", "Key", "Distance", "Text"]);
        for (i, hit) in self.response.results.iter().enumerate() {
            table.add_row(vec![
                (i + 1).to_string(),
                hit.key.to_string(),
                format!("{:.4}", hit.score),
                preview(&hit.text, 60),
            ]);
        }
        format!("{table}\n{} result(s) for \"{}\"", self.response.results.len(), self.query)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Build a key filter from CLI arguments; `None` when no keys were given.
pub fn key_filter(keys: &[String]) -> Result<Option<KeyFilter>> {
    if keys.is_empty() {
        return Ok(None);
    }
    let filter = keys
        .iter()
        .map(|k| DocumentKey::parse(k))
        .collect::<Result<KeyFilter, _>>()?;
    Ok(Some(filter))
}

pub async fn execute(args: SearchArgs, ctx: &AppContext, json: bool) -> Result<()> {
    let filter = key_filter(&args.keys)?;
    let response = ctx.retrieval.search(&args.query, args.k, filter.as_ref()).await;
    output(&SearchOutput { query: args.query, response }, json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Metadata, SearchHit};

    #[test]
    fn test_key_filter() {
        assert!(key_filter(&[]).unwrap().is_none());
        let filter = key_filter(&["a".to_string(), "b".to_string(), "a".to_string()]).unwrap().unwrap();
        assert_eq!(filter.len(), 2);
        assert!(key_filter(&["bad key".to_string()]).is_err());
    }

    #[test]
    fn test_human_output() {
        let out = SearchOutput {
            query: "fox".to_string(),
            response: SearchResponse::ok(vec![SearchHit {
                key: DocumentKey::parse("doc-1").unwrap(),
                text: "The quick brown fox".to_string(),
                metadata: Metadata::new(),
                score: 0.25,
            }]),
        };
        let human = out.to_human();
        assert!(human.contains("doc-1"));
        assert!(human.contains("0.2500"));

        let json = out.to_json();
        assert_eq!(json["results"][0]["key"], "doc-1");
        assert!(json.get("diagnostic").is_none());
    }

    #[test]
    fn test_degraded_output_shows_reason() {
        let out = SearchOutput {
            query: "fox".to_string(),
            response: SearchResponse::degraded("Embedding failed: timeout"),
        };
        assert_eq!(out.to_human(), "No results (Embedding failed: timeout).");
    }
}
