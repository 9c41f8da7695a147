//! Downstream routing table
//!
//! Pure lookup table from category to the ordered expansion functions the
//! next pipeline stage should invoke. Produced by configuration, consumed
//! here; never computed.

use reqroute_core::RequirementCategory;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

const EXPAND_BACKEND: &str = "expand_backend_requirements";
const EXPAND_FRONTEND: &str = "expand_frontend_requirements";
const EXPAND_MIDDLEWARE: &str = "expand_middleware_requirements";

/// Category -> ordered expansion function identifiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoutingTable {
    routes: HashMap<RequirementCategory, Vec<String>>,
}

impl Default for RoutingTable {
    fn default() -> Self {
        let full_stack = vec![
            EXPAND_BACKEND.to_string(),
            EXPAND_MIDDLEWARE.to_string(),
            EXPAND_FRONTEND.to_string(),
        ];
        Self {
            routes: HashMap::from([
                (
                    RequirementCategory::BackendOnly,
                    vec![EXPAND_BACKEND.to_string()],
                ),
                (
                    RequirementCategory::FrontendOnly,
                    vec![EXPAND_FRONTEND.to_string()],
                ),
                (
                    RequirementCategory::Middleware,
                    vec![EXPAND_MIDDLEWARE.to_string()],
                ),
                (RequirementCategory::FullStack, full_stack.clone()),
                // Ambiguous only escapes the cascade when no LLM backend is
                // configured; treat it like full_stack downstream.
                (RequirementCategory::Ambiguous, full_stack),
            ]),
        }
    }
}

impl RoutingTable {
    /// Load from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Load from file
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_yaml(&content)?)
    }

    /// Expansion functions for a category, in invocation order
    pub fn expansions(&self, category: RequirementCategory) -> &[String] {
        self.routes
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
