//! The pre-classification cascade (Tier 1 -> 2 -> 3)
//!
//! Composes the keyword, embedding, and LLM tiers into one fallback chain:
//! each tier runs only if every cheaper tier returned `Ambiguous`. Every
//! tier decision is recorded into one shared metrics collector, so the
//! metrics total can exceed the number of `classify` calls.

use crate::classifier::Classifier;
use crate::config::ThresholdConfig;
use crate::embedding::EmbeddingClassifier;
use crate::keyword::KeywordClassifier;
use crate::llm::LlmClassifier;
use crate::routing::RoutingTable;
use reqroute_core::{ClassificationResult, RequirementCategory, Result};
use reqroute_telemetry::ClassificationMetrics;
use std::sync::Arc;
use tracing::{debug, warn};

/// Cascaded pre-classification router.
pub struct PreClassifier {
    thresholds: ThresholdConfig,
    keyword: KeywordClassifier,
    embedding: Option<EmbeddingClassifier>,
    llm: LlmClassifier,
    metrics: ClassificationMetrics,
    routing: RoutingTable,
}

impl PreClassifier {
    /// Create a cascade with the keyword tier and a no-op LLM tier.
    /// Thresholds are validated here; invalid configuration is surfaced to
    /// the caller, never swallowed.
    pub fn new(thresholds: ThresholdConfig) -> Result<Self> {
        thresholds.validate()?;
        Ok(Self {
            keyword: KeywordClassifier::new(thresholds.clone())?,
            embedding: None,
            llm: LlmClassifier::without_backend(thresholds.clone()),
            metrics: ClassificationMetrics::new(),
            routing: RoutingTable::default(),
            thresholds,
        })
    }

    /// Attach an embedding tier
    pub fn with_embedding(mut self, embedding: EmbeddingClassifier) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// Attach an LLM backend to the terminal tier
    pub fn with_llm_backend(mut self, backend: Arc<dyn crate::backend::LlmBackend>) -> Self {
        self.llm = LlmClassifier::new(backend, self.thresholds.clone());
        self
    }

    /// Replace the downstream routing table
    pub fn with_routing(mut self, routing: RoutingTable) -> Self {
        self.routing = routing;
        self
    }

    /// Run the cascade for one requirement statement.
    pub async fn classify(&self, text: &str) -> Result<ClassificationResult> {
        // Tier 1 always runs and is always recorded.
        let keyword_result = self.keyword.classify(text).await?;
        self.metrics.record(&keyword_result);
        if !keyword_result.is_ambiguous() {
            debug!(category = %keyword_result.category, "keyword tier short-circuit");
            return Ok(keyword_result);
        }

        // Tier 2 runs only when configured with reference data. Its errors
        // are a pass-through, not a cascade failure, and a failed attempt
        // is not recorded as a decision.
        if let Some(embedding) = &self.embedding {
            if embedding.has_references() {
                match embedding.classify(text).await {
                    Ok(result) => {
                        self.metrics.record(&result);
                        if !result.is_ambiguous() {
                            debug!(
                                category = %result.category,
                                confidence = result.confidence,
                                "embedding tier short-circuit"
                            );
                            return Ok(result);
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "embedding tier failed, passing to llm tier");
                    }
                }
            }
        }

        // Tier 3 is terminal: its result is returned unconditionally.
        let result = self.llm.classify(text).await?;
        self.metrics.record(&result);
        Ok(result)
    }

    /// Classify each item independently, preserving input order
    pub async fn classify_batch(&self, texts: &[String]) -> Result<Vec<ClassificationResult>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.classify(text).await?);
        }
        Ok(results)
    }

    /// Expansion functions downstream processing should invoke for a
    /// category, in order
    pub fn expansion_functions(&self, category: RequirementCategory) -> &[String] {
        self.routing.expansions(category)
    }

    /// Shared metrics collector handle
    pub fn metrics(&self) -> &ClassificationMetrics {
        &self.metrics
    }

    /// Tier 1 classifier
    pub fn keyword(&self) -> &KeywordClassifier {
        &self.keyword
    }

    /// Mutable tier 1 classifier, for adding keywords
    pub fn keyword_mut(&mut self) -> &mut KeywordClassifier {
        &mut self.keyword
    }

    /// Tier 2 classifier, if configured
    pub fn embedding(&self) -> Option<&EmbeddingClassifier> {
        self.embedding.as_ref()
    }

    /// Mutable tier 2 classifier, for reference examples and calibration
    pub fn embedding_mut(&mut self) -> Option<&mut EmbeddingClassifier> {
        self.embedding.as_mut()
    }

    /// Tier 3 classifier
    pub fn llm(&self) -> &LlmClassifier {
        &self.llm
    }
}
