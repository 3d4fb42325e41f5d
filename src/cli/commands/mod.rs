//! CLI command implementations.

pub mod ask;
pub mod ingest;
pub mod rebuild;
pub mod search;
pub mod stats;
