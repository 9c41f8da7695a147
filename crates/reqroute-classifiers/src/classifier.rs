//! Classifier trait shared by all cascade tiers

use async_trait::async_trait;
use reqroute_core::{ClassificationResult, ClassificationTier, Result};

/// Trait for all cascade tiers
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify the given requirement text
    async fn classify(&self, text: &str) -> Result<ClassificationResult>;

    /// Get the classifier name
    fn name(&self) -> &str;

    /// Get the cascade tier this classifier implements
    fn tier(&self) -> ClassificationTier;
}
