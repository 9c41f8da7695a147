//! Cascade integration tests
//!
//! Exercises the full keyword -> embedding -> LLM fallback chain with
//! configurable mock backends and call counters.

use async_trait::async_trait;
use reqroute_classifiers::prelude::*;
use reqroute_core::{Error, Result};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_test_writer()
        .try_init();
}

/// Deterministic fake embedding over three domain axes.
struct AxisEmbedding {
    calls: AtomicU32,
}

impl AxisEmbedding {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicU32::new(0),
        })
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl EmbeddingBackend for AxisEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let lower = text.to_lowercase();
        let count = |needle: &str| lower.matches(needle).count() as f32;
        Ok(vec![count("persist"), count("render"), count("broker")])
    }
}

/// Embedding backend that always fails.
struct BrokenEmbedding;

#[async_trait]
impl EmbeddingBackend for BrokenEmbedding {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(Error::backend("vector service down"))
    }
}

/// Scripted LLM backend with a call counter.
struct ScriptedLlm {
    category: String,
    confidence: f32,
    calls: AtomicU32,
}

impl ScriptedLlm {
    fn new(category: &str, confidence: f32) -> Arc<Self> {
        Arc::new(Self {
            category: category.to_string(),
            confidence,
            calls: AtomicU32::new(0),
        })
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl LlmBackend for ScriptedLlm {
    async fn classify(&self, _text: &str) -> Result<LlmVerdict> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(LlmVerdict::new(self.category.clone(), self.confidence))
    }
}

/// Embedding tier seeded with one reference vector per axis.
async fn seeded_embedding(backend: Arc<AxisEmbedding>) -> EmbeddingClassifier {
    let mut embedding = EmbeddingClassifier::new(backend, ThresholdConfig::default());
    embedding
        .add_reference_example(RequirementCategory::BackendOnly, "persist persist")
        .await
        .unwrap();
    embedding
        .add_reference_example(RequirementCategory::FrontendOnly, "render render")
        .await
        .unwrap();
    embedding
        .add_reference_example(RequirementCategory::Middleware, "broker broker")
        .await
        .unwrap();
    embedding
}

#[tokio::test]
async fn test_keyword_short_circuit_skips_other_tiers() {
    let embedding_backend = AxisEmbedding::new();
    let llm_backend = ScriptedLlm::new("backend_only", 0.9);

    let cascade = PreClassifier::new(ThresholdConfig::default())
        .unwrap()
        .with_embedding(seeded_embedding(embedding_backend.clone()).await)
        .with_llm_backend(llm_backend.clone());

    let embed_calls_after_seeding = embedding_backend.calls();
    let result = cascade.classify("Add auth to the api").await.unwrap();

    assert_eq!(result.category, RequirementCategory::Middleware);
    assert_eq!(result.tier, ClassificationTier::Keyword);
    assert_eq!(embedding_backend.calls(), embed_calls_after_seeding);
    assert_eq!(llm_backend.calls(), 0);

    assert_eq!(cascade.metrics().total(), 1);
    assert_eq!(cascade.metrics().tier_count(ClassificationTier::Keyword), 1);
}

#[tokio::test]
async fn test_embedding_tier_handles_keyword_miss() {
    let embedding_backend = AxisEmbedding::new();
    let cascade = PreClassifier::new(ThresholdConfig::default())
        .unwrap()
        .with_embedding(seeded_embedding(embedding_backend).await)
        .with_llm_backend(ScriptedLlm::new("full_stack", 0.9));

    // No keyword hit, but squarely on the backend embedding axis.
    let result = cascade.classify("persist the records").await.unwrap();
    assert_eq!(result.category, RequirementCategory::BackendOnly);
    assert_eq!(result.tier, ClassificationTier::Embedding);

    // Keyword (ambiguous) + embedding decisions both recorded.
    assert_eq!(cascade.metrics().total(), 2);
}

#[tokio::test]
async fn test_llm_is_terminal_when_embedding_unsure() {
    let embedding_backend = AxisEmbedding::new();
    let llm_backend = ScriptedLlm::new("middleware", 0.9);
    let cascade = PreClassifier::new(ThresholdConfig::default())
        .unwrap()
        .with_embedding(seeded_embedding(embedding_backend).await)
        .with_llm_backend(llm_backend.clone());

    // Mixed axes: similarity ~0.707 to two categories, below threshold.
    let result = cascade.classify("persist and render").await.unwrap();
    assert_eq!(result.category, RequirementCategory::Middleware);
    assert_eq!(result.tier, ClassificationTier::Llm);
    assert_eq!(llm_backend.calls(), 1);

    // Three tier decisions recorded for one cascade call.
    assert_eq!(cascade.metrics().total(), 3);
}

#[tokio::test]
async fn test_no_match_keyword_only_cascade_ends_ambiguous() {
    // Keyword tier only: no embedding, no LLM backend. The terminal tier
    // is allowed to return ambiguous in exactly this configuration.
    let cascade = PreClassifier::new(ThresholdConfig::default()).unwrap();
    let result = cascade.classify("The sky is blue today").await.unwrap();

    assert_eq!(result.category, RequirementCategory::Ambiguous);
    assert_eq!(result.confidence, 0.0);
    assert_eq!(result.tier, ClassificationTier::Llm);

    // Ambiguous tier 1 and tier 3 both recorded.
    assert_eq!(cascade.metrics().total(), 2);
}

#[tokio::test]
async fn test_embedding_failure_passes_through_to_llm() {
    init_tracing();
    let mut embedding =
        EmbeddingClassifier::new(Arc::new(BrokenEmbedding), ThresholdConfig::default());
    let llm_backend = ScriptedLlm::new("frontend_only", 0.95);

    // Seed one reference via the archive path since the backend cannot
    // embed; the cascade then considers the tier ready.
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("refs.json");
    std::fs::write(&path, r#"{"backend_only":[[1.0,0.0,0.0]]}"#).unwrap();
    embedding.load_references(&path).unwrap();

    let cascade = PreClassifier::new(ThresholdConfig::default())
        .unwrap()
        .with_embedding(embedding)
        .with_llm_backend(llm_backend.clone());

    let result = cascade.classify("no keywords here at all").await.unwrap();
    assert_eq!(result.category, RequirementCategory::FrontendOnly);
    assert_eq!(result.tier, ClassificationTier::Llm);
    assert_eq!(llm_backend.calls(), 1);

    // Failed tier 2 attempt is not recorded: only tier 1 and tier 3.
    assert_eq!(cascade.metrics().total(), 2);
    assert_eq!(
        cascade.metrics().tier_count(ClassificationTier::Embedding),
        0
    );
}

#[tokio::test]
async fn test_embedding_without_references_is_skipped() {
    let embedding_backend = AxisEmbedding::new();
    let embedding =
        EmbeddingClassifier::new(embedding_backend.clone(), ThresholdConfig::default());
    let cascade = PreClassifier::new(ThresholdConfig::default())
        .unwrap()
        .with_embedding(embedding)
        .with_llm_backend(ScriptedLlm::new("full_stack", 0.9));

    let result = cascade.classify("nothing matches this").await.unwrap();
    assert_eq!(result.tier, ClassificationTier::Llm);
    // Tier 2 never embedded anything.
    assert_eq!(embedding_backend.calls(), 0);
}

#[tokio::test]
async fn test_invalid_thresholds_rejected_at_construction() {
    let thresholds = ThresholdConfig {
        llm_human_review_threshold: 0.95,
        ..Default::default()
    };
    assert!(PreClassifier::new(thresholds).is_err());
}

#[tokio::test]
async fn test_result_always_within_contract() {
    let cascade = PreClassifier::new(ThresholdConfig::default())
        .unwrap()
        .with_llm_backend(ScriptedLlm::new("middleware", 0.6));

    let inputs = [
        "",
        "   ",
        "Add auth to the api",
        "The sky is blue today",
        "render render render",
        "ALL CAPS DATABASE QUERY",
        "punctuation?! (auth) [api]",
        "unicode: caf\u{e9} na\u{ef}ve \u{2014} auth",
    ];
    for text in inputs {
        let result = cascade.classify(text).await.unwrap();
        assert!(
            RequirementCategory::ALL.contains(&result.category),
            "category out of set for {text:?}"
        );
        assert!(
            ClassificationTier::ALL.contains(&result.tier),
            "tier out of set for {text:?}"
        );
        assert!(
            (0.0..=1.0).contains(&result.confidence),
            "confidence out of range for {text:?}"
        );
    }
}

#[tokio::test]
async fn test_metrics_invariant_over_batch() {
    let cascade = PreClassifier::new(ThresholdConfig::default())
        .unwrap()
        .with_llm_backend(ScriptedLlm::new("backend_only", 0.9));

    let texts: Vec<String> = vec![
        "Add auth to the api".to_string(),      // keyword only
        "The sky is blue today".to_string(),    // keyword + llm
        "database migration".to_string(),       // keyword only
        "completely unrelated words".to_string(), // keyword + llm
    ];
    let results = cascade.classify_batch(&texts).await.unwrap();
    assert_eq!(results.len(), texts.len());

    // Every cascade call records at least one decision; ambiguous tier 1
    // calls record a tier 3 decision too.
    assert_eq!(cascade.metrics().total(), 6);
    assert_eq!(cascade.metrics().tier_count(ClassificationTier::Keyword), 4);
    assert_eq!(cascade.metrics().tier_count(ClassificationTier::Llm), 2);
}

#[tokio::test]
async fn test_batch_preserves_order() {
    let cascade = PreClassifier::new(ThresholdConfig::default())
        .unwrap()
        .with_llm_backend(ScriptedLlm::new("full_stack", 0.9));

    let texts = vec![
        "database schema".to_string(),
        "css layout".to_string(),
        "oauth flow".to_string(),
    ];
    let results = cascade.classify_batch(&texts).await.unwrap();
    assert_eq!(results[0].category, RequirementCategory::BackendOnly);
    assert_eq!(results[1].category, RequirementCategory::FrontendOnly);
    assert_eq!(results[2].category, RequirementCategory::Middleware);
}

#[tokio::test]
async fn test_expansion_functions_lookup() {
    let cascade = PreClassifier::new(ThresholdConfig::default()).unwrap();
    assert_eq!(
        cascade.expansion_functions(RequirementCategory::BackendOnly),
        &["expand_backend_requirements".to_string()]
    );
    assert_eq!(
        cascade
            .expansion_functions(RequirementCategory::FullStack)
            .len(),
        3
    );
}

#[tokio::test]
async fn test_llm_cache_shared_across_cascade_calls() {
    let llm_backend = ScriptedLlm::new("full_stack", 0.9);
    let cascade = PreClassifier::new(ThresholdConfig::default())
        .unwrap()
        .with_llm_backend(llm_backend.clone());

    cascade.classify("no keywords in this text").await.unwrap();
    cascade.classify("no keywords in this text").await.unwrap();
    assert_eq!(llm_backend.calls(), 1);
}
