//! Embedding-similarity classifier (Tier 2)
//!
//! Nearest-category search over per-category reference example vectors,
//! gated by a similarity threshold. The threshold starts at
//! `embedding_similarity_initial` and can be calibrated from labeled
//! samples via a randomized search ([`EmbeddingClassifier::fit`]).

use crate::backend::EmbeddingBackend;
use crate::classifier::Classifier;
use crate::config::ThresholdConfig;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use reqroute_core::{
    ClassificationResult, ClassificationTier, Error, RequirementCategory, Result,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Options for threshold calibration.
#[derive(Debug, Clone)]
pub struct FitOptions {
    /// Number of random candidate thresholds to try
    pub iterations: usize,

    /// Fraction of samples scored per iteration
    pub validation_split: f32,

    /// Seed for a deterministic search; `None` uses entropy
    pub seed: Option<u64>,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            iterations: 500,
            validation_split: 0.2,
            seed: None,
        }
    }
}

/// On-disk calibration state. Holds only threshold values, never the
/// reference vectors.
#[derive(Debug, Serialize, Deserialize)]
struct CalibrationFile {
    calibrated_threshold: Option<f32>,
    initial_threshold: f32,
    min_threshold: f32,
}

/// Tier 2 embedding-similarity classifier.
///
/// Owns its reference vectors exclusively; no category shares vectors with
/// another and no two classifiers share a reference set.
pub struct EmbeddingClassifier {
    name: String,
    backend: Option<Arc<dyn EmbeddingBackend>>,
    references: HashMap<RequirementCategory, Vec<Vec<f32>>>,
    thresholds: ThresholdConfig,
    calibrated_threshold: Option<f32>,
    // Coverage bookkeeping: decisions at or above the threshold vs passed
    // through to tier 3. Informational only, never control flow.
    confident_decisions: AtomicU64,
    passed_decisions: AtomicU64,
}

impl EmbeddingClassifier {
    /// Create a classifier with an embedding backend
    pub fn new(backend: Arc<dyn EmbeddingBackend>, thresholds: ThresholdConfig) -> Self {
        Self {
            name: "embedding".to_string(),
            backend: Some(backend),
            references: HashMap::new(),
            thresholds,
            calibrated_threshold: None,
            confident_decisions: AtomicU64::new(0),
            passed_decisions: AtomicU64::new(0),
        }
    }

    /// Create a classifier without a backend. Only useful with pre-loaded
    /// reference vectors; calls needing fresh embeddings return a
    /// configuration error.
    pub fn without_backend(thresholds: ThresholdConfig) -> Self {
        Self {
            name: "embedding".to_string(),
            backend: None,
            references: HashMap::new(),
            thresholds,
            calibrated_threshold: None,
            confident_decisions: AtomicU64::new(0),
            passed_decisions: AtomicU64::new(0),
        }
    }

    fn require_backend(&self) -> Result<&Arc<dyn EmbeddingBackend>> {
        self.backend
            .as_ref()
            .ok_or_else(|| Error::config("no embedding backend configured"))
    }

    /// Whether any category has at least one reference vector
    pub fn has_references(&self) -> bool {
        self.references.values().any(|v| !v.is_empty())
    }

    /// Total reference vectors across all categories
    pub fn reference_count(&self) -> usize {
        self.references.values().map(Vec::len).sum()
    }

    /// The threshold currently gating decisions: the calibrated value if
    /// present, else `embedding_similarity_initial`.
    pub fn effective_threshold(&self) -> f32 {
        self.calibrated_threshold
            .unwrap_or(self.thresholds.embedding_similarity_initial)
    }

    /// The calibrated threshold, if `fit` or `load_calibration` has run
    pub fn calibrated_threshold(&self) -> Option<f32> {
        self.calibrated_threshold
    }

    /// Embed and append an example under the given category
    pub async fn add_reference_example(
        &mut self,
        category: RequirementCategory,
        text: &str,
    ) -> Result<()> {
        let vector = self.require_backend()?.embed(text).await?;
        self.references.entry(category).or_default().push(vector);
        Ok(())
    }

    /// Best (category, similarity) for a vector against all reference sets.
    /// Similarity to a category is the max over its per-vector similarities.
    fn nearest_category(&self, vector: &[f32]) -> Vec<(RequirementCategory, f32)> {
        let mut scored: Vec<(RequirementCategory, f32)> = self
            .references
            .iter()
            .filter(|(_, vectors)| !vectors.is_empty())
            .map(|(category, vectors)| {
                let best = vectors
                    .iter()
                    .map(|v| cosine_similarity(vector, v))
                    .fold(f32::NEG_INFINITY, f32::max);
                (*category, best)
            })
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored
    }

    /// Calibrate the similarity threshold from labeled samples.
    ///
    /// Every sample is embedded once and registered as a reference example
    /// under its label. Each iteration then draws a uniformly random
    /// candidate threshold in `[embedding_similarity_min,
    /// embedding_similarity_initial]`, re-partitions a random validation
    /// subset, and scores the candidate's accuracy on it. The candidate
    /// with the highest observed accuracy becomes the calibrated threshold.
    ///
    /// Accuracy counts only validation samples whose best similarity
    /// clears the candidate threshold; below-threshold samples are neither
    /// correct nor incorrect. Each iteration re-partitions independently,
    /// so results are stochastic unless a seed is supplied.
    pub async fn fit(
        &mut self,
        samples: &[(RequirementCategory, String)],
        options: &FitOptions,
    ) -> Result<f32> {
        if samples.len() < 5 {
            return Err(Error::config(format!(
                "calibration requires at least 5 training samples, got {}",
                samples.len()
            )));
        }
        if !(0.0..1.0).contains(&options.validation_split) || options.validation_split == 0.0 {
            return Err(Error::config(format!(
                "validation_split must be in (0.0, 1.0), got {}",
                options.validation_split
            )));
        }
        let backend = self.require_backend()?.clone();

        // Embed every sample once, registering each as a reference example.
        let mut sample_vectors: Vec<(RequirementCategory, Vec<f32>)> =
            Vec::with_capacity(samples.len());
        for (category, text) in samples {
            let vector = backend.embed(text).await?;
            self.references
                .entry(*category)
                .or_default()
                .push(vector.clone());
            sample_vectors.push((*category, vector));
        }

        let mut rng: StdRng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let n = sample_vectors.len();
        let validation_size =
            (((n as f32) * options.validation_split).ceil() as usize).clamp(1, n);
        let mut indices: Vec<usize> = (0..n).collect();

        let low = self.thresholds.embedding_similarity_min;
        let high = self.thresholds.embedding_similarity_initial;
        let mut best_threshold = high;
        let mut best_accuracy = f32::NEG_INFINITY;

        for _ in 0..options.iterations {
            let candidate = rng.gen_range(low..=high);
            indices.shuffle(&mut rng);

            let mut evaluated = 0u32;
            let mut correct = 0u32;
            for &i in &indices[..validation_size] {
                let (label, vector) = &sample_vectors[i];
                let Some(&(predicted, similarity)) = self.nearest_category(vector).first() else {
                    continue;
                };
                if similarity >= candidate {
                    evaluated += 1;
                    if predicted == *label {
                        correct += 1;
                    }
                }
            }

            let accuracy = if evaluated == 0 {
                0.0
            } else {
                correct as f32 / evaluated as f32
            };
            if accuracy > best_accuracy {
                best_accuracy = accuracy;
                best_threshold = candidate;
            }
        }

        self.calibrated_threshold = Some(best_threshold);
        tracing::debug!(
            threshold = best_threshold,
            accuracy = best_accuracy,
            iterations = options.iterations,
            "embedding threshold calibrated"
        );
        Ok(best_threshold)
    }

    /// Persist the threshold values (not the reference vectors)
    pub fn save_calibration(&self, path: impl AsRef<Path>) -> Result<()> {
        let state = CalibrationFile {
            calibrated_threshold: self.calibrated_threshold,
            initial_threshold: self.thresholds.embedding_similarity_initial,
            min_threshold: self.thresholds.embedding_similarity_min,
        };
        let json = serde_json::to_string_pretty(&state)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Restore threshold values persisted by `save_calibration`
    pub fn load_calibration(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let json = std::fs::read_to_string(path)?;
        let state: CalibrationFile = serde_json::from_str(&json)?;
        self.calibrated_threshold = state.calibrated_threshold;
        self.thresholds.embedding_similarity_initial = state.initial_threshold;
        self.thresholds.embedding_similarity_min = state.min_threshold;
        Ok(())
    }

    /// Persist the reference vectors as a category -> matrix archive
    pub fn save_references(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string(&self.references)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Replace the reference vectors with an archive written by
    /// `save_references`
    pub fn load_references(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let json = std::fs::read_to_string(path)?;
        self.references = serde_json::from_str(&json)?;
        Ok(())
    }

    /// Fraction (as a percentage) of embedding-tier decisions routed
    /// confidently rather than passed through to tier 3
    pub fn tier2_coverage_percentage(&self) -> f32 {
        let confident = self.confident_decisions.load(Ordering::Relaxed);
        let passed = self.passed_decisions.load(Ordering::Relaxed);
        let total = confident + passed;
        if total == 0 {
            0.0
        } else {
            confident as f32 / total as f32 * 100.0
        }
    }
}

#[async_trait::async_trait]
impl Classifier for EmbeddingClassifier {
    async fn classify(&self, text: &str) -> Result<ClassificationResult> {
        let start = Instant::now();

        if !self.has_references() {
            let mut result = ClassificationResult::ambiguous(ClassificationTier::Embedding);
            result.latency_ms = start.elapsed().as_secs_f64() * 1000.0;
            return Ok(result);
        }

        let vector = self.require_backend()?.embed(text).await?;
        let scored = self.nearest_category(&vector);
        let (best_category, best_similarity) = scored[0];

        let threshold = self.effective_threshold();
        let mut result = if best_similarity >= threshold {
            self.confident_decisions.fetch_add(1, Ordering::Relaxed);
            ClassificationResult::new(best_category, best_similarity, ClassificationTier::Embedding)
        } else {
            self.passed_decisions.fetch_add(1, Ordering::Relaxed);
            // Below threshold: ambiguous, but the similarity is still
            // informative for diagnostics.
            ClassificationResult::new(
                RequirementCategory::Ambiguous,
                best_similarity,
                ClassificationTier::Embedding,
            )
        };
        result.top_matches = scored;
        result.latency_ms = start.elapsed().as_secs_f64() * 1000.0;
        Ok(result)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn tier(&self) -> ClassificationTier {
        ClassificationTier::Embedding
    }
}

/// Cosine similarity between two vectors. Mismatched lengths or zero
/// magnitudes score 0.0.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        0.0
    } else {
        dot / (magnitude_a * magnitude_b)
    }
}
