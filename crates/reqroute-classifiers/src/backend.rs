//! Injected backend contracts for the embedding and LLM tiers
//!
//! Both tiers consume narrow, one-method interfaces rather than bare
//! function types so the contracts stay explicit and fakeable in tests.
//! Retries, timeouts, and network concerns belong to the implementation
//! behind the trait, never to the classifiers.

use async_trait::async_trait;
use reqroute_core::{LlmVerdict, Result};

/// Produces a fixed-length embedding vector for a piece of text.
///
/// Implementations must be deterministic enough across identical inputs for
/// threshold calibration to be reproducible.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Embed the given text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Classifies a requirement statement with a large language model.
///
/// The returned category string is matched case-insensitively against the
/// category tag set; unrecognized strings map to `full_stack`.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Classify the given text
    async fn classify(&self, text: &str) -> Result<LlmVerdict>;
}
