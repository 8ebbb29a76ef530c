//! Context lookup — the retrieval capability consumed by the orchestrator.
//!
//! How documents are indexed and searched is someone else's problem; the
//! orchestrator only needs "give me text relevant to this utterance".
//! Lookup failures are treated as "no context available" by the caller.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A retrieved document: the text plus whatever metadata the store carries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextDocument {
    pub text: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// Context lookup failure.
#[derive(Debug, Error)]
#[error("context lookup failed: {reason}")]
pub struct ContextError {
    pub reason: String,
}

/// A queryable context source.
#[async_trait]
pub trait ContextStore: Send + Sync {
    /// Return documents relevant to the given text, best first.
    async fn query(&self, text: &str) -> Result<Vec<ContextDocument>, ContextError>;
}
