//! Infrastructure layer module
//!
//! Configuration loading, logging setup, retry policy and the in-memory
//! vector index with its on-disk snapshot.

pub mod config;
pub mod logging;
pub mod retry;
pub mod vector;
