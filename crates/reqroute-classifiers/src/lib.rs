//! reqroute classifiers
//!
//! Cascaded pre-classification for free-text requirement statements: three
//! increasingly expensive tiers composed into one fallback chain.
//!
//! - Tier 1 (keyword): whole-word keyword matching with a fixed category
//!   priority; sub-millisecond, full confidence.
//! - Tier 2 (embedding): nearest-category cosine similarity over reference
//!   example vectors, gated by a calibratable threshold.
//! - Tier 3 (LLM): an injected model call with confidence-banded routing,
//!   result caching, and a human-review queue.
//!
//! A tier runs only if every cheaper tier returned `ambiguous`; the LLM
//! tier is terminal. All tiers share one metrics collector.

pub mod backend;
pub mod cascade;
pub mod classifier;
pub mod config;
pub mod embedding;
pub mod keyword;
pub mod llm;
pub mod routing;

pub use backend::{EmbeddingBackend, LlmBackend};
pub use cascade::PreClassifier;
pub use classifier::Classifier;
pub use config::ThresholdConfig;
pub use embedding::{EmbeddingClassifier, FitOptions};
pub use keyword::KeywordClassifier;
pub use llm::LlmClassifier;
pub use routing::RoutingTable;

pub use reqroute_core::{
    ClassificationResult, ClassificationTier, Error, LlmVerdict, RequirementCategory, Result,
    ReviewEntry,
};
pub use reqroute_telemetry::{ClassificationMetrics, MetricsSnapshot};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::backend::{EmbeddingBackend, LlmBackend};
    pub use crate::cascade::PreClassifier;
    pub use crate::classifier::Classifier;
    pub use crate::config::ThresholdConfig;
    pub use crate::embedding::{EmbeddingClassifier, FitOptions};
    pub use crate::keyword::KeywordClassifier;
    pub use crate::llm::LlmClassifier;
    pub use crate::routing::RoutingTable;
    pub use reqroute_core::{
        ClassificationResult, ClassificationTier, LlmVerdict, RequirementCategory, ReviewEntry,
    };
    pub use reqroute_telemetry::ClassificationMetrics;
}
