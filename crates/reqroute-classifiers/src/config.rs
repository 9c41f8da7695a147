//! Confidence thresholds governing all cascade tiers

use reqroute_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;

/// Environment variable names (primary, legacy alias) for each threshold.
const ENV_KEYWORD_CONFIDENCE: (&str, &str) =
    ("REQROUTE_KEYWORD_CONFIDENCE", "CLASSIFIER_KEYWORD_THRESHOLD");
const ENV_EMBEDDING_INITIAL: (&str, &str) = (
    "REQROUTE_EMBEDDING_SIMILARITY_INITIAL",
    "CLASSIFIER_EMBEDDING_THRESHOLD",
);
const ENV_EMBEDDING_MIN: (&str, &str) = (
    "REQROUTE_EMBEDDING_SIMILARITY_MIN",
    "CLASSIFIER_EMBEDDING_MIN_THRESHOLD",
);
const ENV_LLM_AUTO_ROUTE: (&str, &str) = (
    "REQROUTE_LLM_AUTO_ROUTE_CONFIDENCE",
    "CLASSIFIER_LLM_CONFIDENCE_THRESHOLD",
);
const ENV_LLM_HUMAN_REVIEW: (&str, &str) = (
    "REQROUTE_LLM_HUMAN_REVIEW_THRESHOLD",
    "CLASSIFIER_HUMAN_REVIEW_THRESHOLD",
);

/// The five confidence thresholds governing the cascade.
///
/// Validation is explicit: construction never fails, call
/// [`validate`](ThresholdConfig::validate) before trusting the values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Confidence assigned to every keyword-tier decision. Must be 1.0;
    /// keyword matches are never partial-confidence.
    #[serde(default = "default_keyword_confidence")]
    pub keyword_confidence: f32,

    /// Embedding similarity threshold before calibration, and the upper
    /// bound of the calibration search.
    #[serde(default = "default_embedding_initial")]
    pub embedding_similarity_initial: f32,

    /// Lower bound of the calibration search. Strictly less than the
    /// initial threshold.
    #[serde(default = "default_embedding_min")]
    pub embedding_similarity_min: f32,

    /// LLM confidence at or above which the returned category is accepted
    /// without comment.
    #[serde(default = "default_llm_auto_route")]
    pub llm_auto_route_confidence: f32,

    /// LLM confidence below which the classification is queued for human
    /// review and overridden to `full_stack`. Strictly less than the
    /// auto-route threshold.
    #[serde(default = "default_llm_human_review")]
    pub llm_human_review_threshold: f32,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            keyword_confidence: default_keyword_confidence(),
            embedding_similarity_initial: default_embedding_initial(),
            embedding_similarity_min: default_embedding_min(),
            llm_auto_route_confidence: default_llm_auto_route(),
            llm_human_review_threshold: default_llm_human_review(),
        }
    }
}

impl ThresholdConfig {
    /// Check the threshold invariants, returning a configuration error on
    /// the first violation.
    pub fn validate(&self) -> Result<()> {
        if self.keyword_confidence != 1.0 {
            return Err(Error::config(format!(
                "keyword_confidence must equal 1.0, got {}",
                self.keyword_confidence
            )));
        }
        if self.embedding_similarity_min >= self.embedding_similarity_initial {
            return Err(Error::config(format!(
                "embedding_similarity_min ({}) must be strictly less than \
                 embedding_similarity_initial ({})",
                self.embedding_similarity_min, self.embedding_similarity_initial
            )));
        }
        if self.llm_human_review_threshold >= self.llm_auto_route_confidence {
            return Err(Error::config(format!(
                "llm_human_review_threshold ({}) must be strictly less than \
                 llm_auto_route_confidence ({})",
                self.llm_human_review_threshold, self.llm_auto_route_confidence
            )));
        }
        Ok(())
    }

    /// Load thresholds from environment variables, falling back to the
    /// legacy variable names and then to the defaults. Unparseable values
    /// are a configuration error, not a silent default.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            keyword_confidence: read_env(ENV_KEYWORD_CONFIDENCE, default_keyword_confidence())?,
            embedding_similarity_initial: read_env(
                ENV_EMBEDDING_INITIAL,
                default_embedding_initial(),
            )?,
            embedding_similarity_min: read_env(ENV_EMBEDDING_MIN, default_embedding_min())?,
            llm_auto_route_confidence: read_env(ENV_LLM_AUTO_ROUTE, default_llm_auto_route())?,
            llm_human_review_threshold: read_env(
                ENV_LLM_HUMAN_REVIEW,
                default_llm_human_review(),
            )?,
        })
    }

    /// Serialize to a plain field-name -> value mapping
    pub fn as_map(&self) -> HashMap<String, f32> {
        HashMap::from([
            ("keyword_confidence".to_string(), self.keyword_confidence),
            (
                "embedding_similarity_initial".to_string(),
                self.embedding_similarity_initial,
            ),
            (
                "embedding_similarity_min".to_string(),
                self.embedding_similarity_min,
            ),
            (
                "llm_auto_route_confidence".to_string(),
                self.llm_auto_route_confidence,
            ),
            (
                "llm_human_review_threshold".to_string(),
                self.llm_human_review_threshold,
            ),
        ])
    }

    /// Build from a plain mapping; missing keys take their defaults
    pub fn from_map(map: &HashMap<String, f32>) -> Self {
        let defaults = Self::default();
        let get = |key: &str, fallback: f32| map.get(key).copied().unwrap_or(fallback);
        Self {
            keyword_confidence: get("keyword_confidence", defaults.keyword_confidence),
            embedding_similarity_initial: get(
                "embedding_similarity_initial",
                defaults.embedding_similarity_initial,
            ),
            embedding_similarity_min: get(
                "embedding_similarity_min",
                defaults.embedding_similarity_min,
            ),
            llm_auto_route_confidence: get(
                "llm_auto_route_confidence",
                defaults.llm_auto_route_confidence,
            ),
            llm_human_review_threshold: get(
                "llm_human_review_threshold",
                defaults.llm_human_review_threshold,
            ),
        }
    }
}

/// Read one threshold from the environment: primary name first, then the
/// legacy alias, then the default.
fn read_env(names: (&str, &str), default: f32) -> Result<f32> {
    let (primary, legacy) = names;
    let raw = env::var(primary).or_else(|_| env::var(legacy));
    match raw {
        Ok(value) => value.trim().parse::<f32>().map_err(|e| {
            Error::config(format!("invalid float in {primary}/{legacy}: {value:?} ({e})"))
        }),
        Err(_) => Ok(default),
    }
}

fn default_keyword_confidence() -> f32 {
    1.0
}

fn default_embedding_initial() -> f32 {
    0.75
}

fn default_embedding_min() -> f32 {
    0.20
}

fn default_llm_auto_route() -> f32 {
    0.85
}

fn default_llm_human_review() -> f32 {
    0.70
}
