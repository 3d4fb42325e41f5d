//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::cli::commands::{
    ask::AskArgs, ingest::IngestArgs, rebuild::RebuildArgs, search::SearchArgs,
};

#[derive(Parser, Debug)]
#[command(name = "semdex")]
#[command(about = "semdex - semantic document retrieval over a self-healing vector index", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Config file (defaults to .semdex/config.yaml + .semdex/local.yaml)
    #[arg(short, long, global = true, env = "SEMDEX_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Store a document and index it
    Ingest(IngestArgs),

    /// Find the documents nearest to a query
    Search(SearchArgs),

    /// Answer a question from the nearest documents
    Ask(AskArgs),

    /// Re-embed every stored document into a fresh index
    Rebuild(RebuildArgs),

    /// Show index and store counts
    Stats,
}
