//! Response generation port.
//!
//! Turns a question plus retrieved context into an answer. Treated as a pure
//! function of its inputs; retries are applied by the caller.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;

#[async_trait]
pub trait ResponseGenerator: Send + Sync {
    /// Generator name for diagnostics.
    fn name(&self) -> &'static str;

    /// Produce an answer for `query` given a pre-rendered context block.
    async fn generate(&self, query: &str, context: &str) -> DomainResult<String>;
}
