//! Stats CLI command.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::cli::context::AppContext;
use crate::cli::output::{output, table_with_header, CommandOutput};
use crate::domain::models::IndexStats;

#[derive(Debug, Serialize)]
pub struct StatsOutput {
    #[serde(flatten)]
    pub stats: IndexStats,
    pub consistent: bool,
}

impl From<IndexStats> for StatsOutput {
    fn from(stats: IndexStats) -> Self {
        Self {
            consistent: stats.is_consistent(),
            stats,
        }
    }
}

impl CommandOutput for StatsOutput {
    fn to_human(&self) -> String {
        let mut table = table_with_header(&["Metric", "Value"]);
        table.add_row(vec!["Vectors".to_string(), self.stats.vector_count.to_string()]);
        table.add_row(vec!["Mapping entries".to_string(), self.stats.mapping_entries.to_string()]);
        table.add_row(vec!["Documents".to_string(), self.stats.document_count.to_string()]);
        table.add_row(vec!["Dimension".to_string(), self.stats.dimension.to_string()]);
        table.add_row(vec![
            "Consistent".to_string(),
            if self.consistent { "yes" } else { "no (run `semdex rebuild`)" }.to_string(),
        ]);
        table.to_string()
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(ctx: &AppContext, json: bool) -> Result<()> {
    let stats = ctx.retrieval.stats().await.context("Failed to read index statistics")?;
    output(&StatsOutput::from(stats), json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_output() {
        let out = StatsOutput::from(IndexStats {
            vector_count: 2,
            mapping_entries: 2,
            document_count: 3,
            dimension: 1536,
        });
        assert!(!out.consistent);

        let json = out.to_json();
        assert_eq!(json["vector_count"], 2);
        assert_eq!(json["document_count"], 3);
        assert_eq!(json["consistent"], false);
        assert!(out.to_human().contains("run `semdex rebuild`"));
    }
}
