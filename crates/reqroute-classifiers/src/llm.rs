//! LLM classifier (Tier 3)
//!
//! Wraps an injected LLM backend and applies the confidence-banded routing
//! policy: auto-route at high confidence, soft-warn in the middle band, and
//! a human-review queue with a conservative `full_stack` override below the
//! review threshold. Results are cached by normalized input text; the cache
//! grows unbounded for the lifetime of the instance by design.

use crate::backend::LlmBackend;
use crate::classifier::Classifier;
use crate::config::ThresholdConfig;
use parking_lot::Mutex;
use reqroute_core::{
    ClassificationResult, ClassificationTier, RequirementCategory, Result, ReviewEntry,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Tier 3 LLM classifier.
///
/// The terminal cascade tier: it never returns `Ambiguous`, with one
/// exception, when no backend is configured at all.
pub struct LlmClassifier {
    name: String,
    backend: Option<Arc<dyn LlmBackend>>,
    thresholds: ThresholdConfig,
    cache: Mutex<HashMap<String, ClassificationResult>>,
    review_queue: Mutex<Vec<ReviewEntry>>,
}

impl LlmClassifier {
    /// Create a classifier with an LLM backend
    pub fn new(backend: Arc<dyn LlmBackend>, thresholds: ThresholdConfig) -> Self {
        Self {
            name: "llm".to_string(),
            backend: Some(backend),
            thresholds,
            cache: Mutex::new(HashMap::new()),
            review_queue: Mutex::new(Vec::new()),
        }
    }

    /// Create a no-op classifier without a backend. Every call returns
    /// `Ambiguous` with zero confidence.
    pub fn without_backend(thresholds: ThresholdConfig) -> Self {
        Self {
            name: "llm".to_string(),
            backend: None,
            thresholds,
            cache: Mutex::new(HashMap::new()),
            review_queue: Mutex::new(Vec::new()),
        }
    }

    /// Classify each item independently, in input order. No deduplication
    /// beyond the shared cache.
    pub async fn classify_batch(&self, texts: &[String]) -> Result<Vec<ClassificationResult>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.classify(text).await?);
        }
        Ok(results)
    }

    /// Snapshot of the human review queue
    pub fn review_queue(&self) -> Vec<ReviewEntry> {
        self.review_queue.lock().clone()
    }

    /// Number of entries awaiting review
    pub fn review_queue_len(&self) -> usize {
        self.review_queue.lock().len()
    }

    /// Drop all review queue entries. Never happens automatically.
    pub fn clear_review_queue(&self) {
        self.review_queue.lock().clear();
    }

    /// Disposition one review entry with its final category. Returns false
    /// if the index is out of range.
    pub fn resolve_review(&self, index: usize, final_category: RequirementCategory) -> bool {
        let mut queue = self.review_queue.lock();
        match queue.get_mut(index) {
            Some(entry) => {
                entry.reviewed = true;
                entry.final_category = Some(final_category);
                true
            }
            None => false,
        }
    }

    /// Number of cached results
    pub fn cache_len(&self) -> usize {
        self.cache.lock().len()
    }

    /// Cache key: trimmed, lower-cased input text
    fn normalize(text: &str) -> String {
        text.trim().to_lowercase()
    }
}

#[async_trait::async_trait]
impl Classifier for LlmClassifier {
    async fn classify(&self, text: &str) -> Result<ClassificationResult> {
        let start = Instant::now();
        let key = Self::normalize(text);

        if let Some(cached) = self.cache.lock().get(&key) {
            debug!(text = %key, "llm cache hit");
            let mut result = cached.clone();
            result.latency_ms = 0.0;
            return Ok(result);
        }

        let Some(backend) = self.backend.as_ref() else {
            // The one case where the terminal tier may return ambiguous.
            let mut result = ClassificationResult::ambiguous(ClassificationTier::Llm);
            result.latency_ms = start.elapsed().as_secs_f64() * 1000.0;
            return Ok(result);
        };

        let verdict = match backend.classify(text).await {
            Ok(verdict) => verdict,
            Err(e) => {
                // Degrade to the conservative default; do not cache failures.
                warn!(error = %e, "llm backend failed, defaulting to full_stack");
                let mut result = ClassificationResult::new(
                    RequirementCategory::FullStack,
                    0.0,
                    ClassificationTier::Llm,
                );
                result.latency_ms = start.elapsed().as_secs_f64() * 1000.0;
                return Ok(result);
            }
        };

        let predicted = RequirementCategory::parse_or_full_stack(&verdict.category);
        let confidence = verdict.confidence;

        let category = if confidence >= self.thresholds.llm_auto_route_confidence {
            predicted
        } else if confidence >= self.thresholds.llm_human_review_threshold {
            // Soft warn: still auto-routed.
            warn!(
                category = %predicted,
                confidence,
                auto_route = self.thresholds.llm_auto_route_confidence,
                "llm confidence below auto-route threshold, routing anyway"
            );
            predicted
        } else {
            warn!(
                category = %predicted,
                confidence,
                "llm confidence below review threshold, queued for human review"
            );
            self.review_queue.lock().push(ReviewEntry::new(
                text,
                predicted,
                confidence,
                verdict.reasoning.clone(),
            ));
            // Conservative default for uncertain cases.
            RequirementCategory::FullStack
        };

        let mut result = ClassificationResult::new(category, confidence, ClassificationTier::Llm);
        result.latency_ms = start.elapsed().as_secs_f64() * 1000.0;
        self.cache.lock().insert(key, result.clone());
        Ok(result)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn tier(&self) -> ClassificationTier {
        ClassificationTier::Llm
    }
}
