//! Telemetry for reqroute
//!
//! Aggregates per-call classification outcomes (tier, category, latency)
//! across the cascade. One collector is shared by all tiers of a
//! `PreClassifier`; cloning the collector clones the handle, not the counts.

pub mod metrics;

pub use metrics::{ClassificationMetrics, MetricsSnapshot};
