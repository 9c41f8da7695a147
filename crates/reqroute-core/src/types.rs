//! Core types for the pre-classification cascade

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Implementation category a requirement statement is routed to.
///
/// `Ambiguous` is a sentinel meaning "this tier could not decide". It is
/// never the cascade's final output, except when the terminal LLM tier has
/// no backend configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementCategory {
    BackendOnly,
    FrontendOnly,
    Middleware,
    FullStack,
    Ambiguous,
}

impl RequirementCategory {
    /// All categories, in declaration order.
    pub const ALL: [RequirementCategory; 5] = [
        Self::BackendOnly,
        Self::FrontendOnly,
        Self::Middleware,
        Self::FullStack,
        Self::Ambiguous,
    ];

    /// Get the category tag string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BackendOnly => "backend_only",
            Self::FrontendOnly => "frontend_only",
            Self::Middleware => "middleware",
            Self::FullStack => "full_stack",
            Self::Ambiguous => "ambiguous",
        }
    }

    /// Parse a category string case-insensitively, falling back to
    /// `FullStack` for anything unrecognized. This is the mapping applied
    /// to LLM-returned category strings.
    pub fn parse_or_full_stack(s: &str) -> Self {
        s.parse().unwrap_or(Self::FullStack)
    }
}

impl fmt::Display for RequirementCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequirementCategory {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "backend_only" => Ok(Self::BackendOnly),
            "frontend_only" => Ok(Self::FrontendOnly),
            "middleware" => Ok(Self::Middleware),
            "full_stack" => Ok(Self::FullStack),
            "ambiguous" => Ok(Self::Ambiguous),
            other => Err(crate::Error::classifier(format!(
                "unknown requirement category: {other:?}"
            ))),
        }
    }
}

/// Which cascade stage produced a result, for audit and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationTier {
    Keyword,
    Embedding,
    Llm,
}

impl ClassificationTier {
    /// All tiers, cheapest first.
    pub const ALL: [ClassificationTier; 3] = [Self::Keyword, Self::Embedding, Self::Llm];

    /// Get the tier tag string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keyword => "keyword",
            Self::Embedding => "embedding",
            Self::Llm => "llm",
        }
    }
}

impl fmt::Display for ClassificationTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a classification, from a single tier or from the cascade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Selected category
    pub category: RequirementCategory,

    /// Confidence score (0.0-1.0)
    pub confidence: f32,

    /// Tier that produced this result
    pub tier: ClassificationTier,

    /// Processing time in milliseconds
    pub latency_ms: f64,

    /// Ranked (category, score) matches, best first. Scores are match
    /// counts for the keyword tier and similarities for the embedding tier.
    pub top_matches: Vec<(RequirementCategory, f32)>,

    /// Keywords that matched (keyword tier only)
    pub matched_keywords: Vec<String>,
}

impl ClassificationResult {
    /// Create a new classification result
    pub fn new(category: RequirementCategory, confidence: f32, tier: ClassificationTier) -> Self {
        Self {
            category,
            confidence,
            tier,
            latency_ms: 0.0,
            top_matches: Vec::new(),
            matched_keywords: Vec::new(),
        }
    }

    /// An ambiguous result with zero confidence for the given tier
    pub fn ambiguous(tier: ClassificationTier) -> Self {
        Self::new(RequirementCategory::Ambiguous, 0.0, tier)
    }

    /// Whether this tier could not decide
    pub fn is_ambiguous(&self) -> bool {
        self.category == RequirementCategory::Ambiguous
    }
}

/// Raw verdict returned by an injected LLM backend.
///
/// Covers both forms of the LLM contract: (category, confidence) and
/// (category, confidence, reasoning). The category string is matched
/// case-insensitively against the category tags; unrecognized strings map
/// to `full_stack`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmVerdict {
    /// Category string as returned by the model
    pub category: String,

    /// Confidence score (0.0-1.0)
    pub confidence: f32,

    /// Free-text reasoning, when the backend provides one
    pub reasoning: Option<String>,
}

impl LlmVerdict {
    /// Create a verdict without reasoning
    pub fn new(category: impl Into<String>, confidence: f32) -> Self {
        Self {
            category: category.into(),
            confidence,
            reasoning: None,
        }
    }

    /// Attach reasoning text
    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = Some(reasoning.into());
        self
    }
}

/// Entry in the human review queue for low-confidence LLM classifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewEntry {
    /// Original requirement text
    pub text: String,

    /// Category the model predicted before the conservative override
    pub predicted_category: RequirementCategory,

    /// Model confidence at prediction time
    pub confidence: f32,

    /// Model reasoning, if any
    pub reasoning: Option<String>,

    /// Whether a human has dispositioned this entry
    pub reviewed: bool,

    /// Category assigned at review time
    pub final_category: Option<RequirementCategory>,
}

impl ReviewEntry {
    /// Create a new unreviewed entry
    pub fn new(
        text: impl Into<String>,
        predicted_category: RequirementCategory,
        confidence: f32,
        reasoning: Option<String>,
    ) -> Self {
        Self {
            text: text.into(),
            predicted_category,
            confidence,
            reasoning,
            reviewed: false,
            final_category: None,
        }
    }
}
