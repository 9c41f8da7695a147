//! Keyword-matching classifier (Tier 1)
//!
//! Whole-word, case-insensitive keyword matching with a fixed category
//! priority for tie-breaks. Deterministic and sub-millisecond by design;
//! a keyword decision always carries full confidence.

use crate::classifier::Classifier;
use crate::config::ThresholdConfig;
use regex::Regex;
use reqroute_core::{ClassificationResult, ClassificationTier, RequirementCategory, Result};
use std::time::Instant;

/// Priority order for resolving multi-category matches. The first category
/// in this list with any match wins, regardless of match count.
const CATEGORY_PRIORITY: [RequirementCategory; 3] = [
    RequirementCategory::Middleware,
    RequirementCategory::BackendOnly,
    RequirementCategory::FrontendOnly,
];

/// Keyword set and its pre-compiled matcher for one category.
struct CategoryPatterns {
    category: RequirementCategory,
    keywords: Vec<String>,
    pattern: Regex,
}

/// Tier 1 keyword classifier.
pub struct KeywordClassifier {
    name: String,
    // Vec, not HashMap: iteration order is part of the contract for
    // categories outside the priority list.
    categories: Vec<CategoryPatterns>,
    thresholds: ThresholdConfig,
}

impl KeywordClassifier {
    /// Create a classifier with the default keyword sets
    pub fn new(thresholds: ThresholdConfig) -> Result<Self> {
        let mut classifier = Self::empty(thresholds);
        for (category, keywords) in default_keywords() {
            classifier.add_keywords(category, &keywords)?;
        }
        Ok(classifier)
    }

    /// Create a classifier with no keywords at all
    pub fn empty(thresholds: ThresholdConfig) -> Self {
        Self {
            name: "keyword".to_string(),
            categories: Vec::new(),
            thresholds,
        }
    }

    /// Add keywords to a category, recompiling its matcher. Creates the
    /// category entry on first use.
    pub fn add_keywords(
        &mut self,
        category: RequirementCategory,
        keywords: &[impl AsRef<str>],
    ) -> Result<()> {
        let normalized: Vec<String> = keywords
            .iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();

        match self.categories.iter_mut().find(|c| c.category == category) {
            Some(entry) => {
                entry.keywords.extend(normalized);
                entry.pattern = compile_pattern(&entry.keywords)?;
            }
            None => {
                let pattern = compile_pattern(&normalized)?;
                self.categories.push(CategoryPatterns {
                    category,
                    keywords: normalized,
                    pattern,
                });
            }
        }
        Ok(())
    }

    /// Get the keywords configured for a category
    pub fn keywords(&self, category: RequirementCategory) -> &[String] {
        self.categories
            .iter()
            .find(|c| c.category == category)
            .map(|c| c.keywords.as_slice())
            .unwrap_or(&[])
    }

    /// Find every keyword occurrence per category. Returns (category,
    /// matched keywords) for categories with at least one match, in
    /// registration order.
    fn find_matches(&self, text: &str) -> Vec<(RequirementCategory, Vec<String>)> {
        let mut matches = Vec::new();
        for entry in &self.categories {
            let hits: Vec<String> = entry
                .pattern
                .find_iter(text)
                .map(|m| m.as_str().to_lowercase())
                .collect();
            if !hits.is_empty() {
                matches.push((entry.category, hits));
            }
        }
        matches
    }
}

#[async_trait::async_trait]
impl Classifier for KeywordClassifier {
    async fn classify(&self, text: &str) -> Result<ClassificationResult> {
        let start = Instant::now();

        let matches = self.find_matches(text);

        if matches.is_empty() {
            let mut result = ClassificationResult::ambiguous(ClassificationTier::Keyword);
            result.latency_ms = start.elapsed().as_secs_f64() * 1000.0;
            return Ok(result);
        }

        // Priority order first; custom categories outside the priority
        // list fall back to the first match in registration order.
        let selected = CATEGORY_PRIORITY
            .iter()
            .find(|priority| matches.iter().any(|(c, _)| c == *priority))
            .copied()
            .unwrap_or(matches[0].0);

        let matched_keywords = matches
            .iter()
            .find(|(c, _)| *c == selected)
            .map(|(_, hits)| hits.clone())
            .unwrap_or_default();

        // Diagnostic view: every matching category by match count,
        // independent of which one was selected.
        let mut top_matches: Vec<(RequirementCategory, f32)> = matches
            .iter()
            .map(|(c, hits)| (*c, hits.len() as f32))
            .collect();
        top_matches.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let mut result = ClassificationResult::new(
            selected,
            self.thresholds.keyword_confidence,
            ClassificationTier::Keyword,
        );
        result.top_matches = top_matches;
        result.matched_keywords = matched_keywords;
        result.latency_ms = start.elapsed().as_secs_f64() * 1000.0;
        Ok(result)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn tier(&self) -> ClassificationTier {
        ClassificationTier::Keyword
    }
}

/// Compile one whole-word, case-insensitive alternation for a keyword set.
fn compile_pattern(keywords: &[String]) -> Result<Regex> {
    let alternation = keywords
        .iter()
        .map(|k| regex::escape(k))
        .collect::<Vec<_>>()
        .join("|");
    // An empty keyword set must match nothing, not everything.
    let source = if alternation.is_empty() {
        r"\b\B".to_string()
    } else {
        format!(r"(?i)\b(?:{alternation})\b")
    };
    Regex::new(&source)
        .map_err(|e| reqroute_core::Error::classifier(format!("failed to compile keyword pattern: {e}")))
}

/// Default keyword sets for the four routable categories.
fn default_keywords() -> Vec<(RequirementCategory, Vec<&'static str>)> {
    vec![
        (
            RequirementCategory::BackendOnly,
            vec![
                "api", "database", "server", "endpoint", "sql", "schema", "migration", "query",
                "rest", "graphql", "backend", "microservice", "worker", "queue", "cron", "storage",
            ],
        ),
        (
            RequirementCategory::FrontendOnly,
            vec![
                "ui", "ux", "button", "form", "css", "html", "react", "component", "page",
                "layout", "frontend", "modal", "styling", "responsive", "browser", "widget",
            ],
        ),
        (
            RequirementCategory::Middleware,
            vec![
                "auth", "authentication", "authorization", "middleware", "session", "jwt",
                "oauth", "cors", "rate limit", "rate limiting", "proxy", "gateway", "token",
            ],
        ),
        (
            RequirementCategory::FullStack,
            vec![
                "full stack", "full-stack", "end to end", "end-to-end", "crud", "web app",
                "application",
            ],
        ),
    ]
}
