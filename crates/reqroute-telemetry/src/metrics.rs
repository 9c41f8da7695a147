//! Metrics collection for cascade decisions

use parking_lot::Mutex;
use reqroute_core::{ClassificationResult, ClassificationTier, RequirementCategory};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Running counters over every tier-level decision made through the cascade.
///
/// Every tier invocation records into the same collector, not only the
/// terminal one, so the total is >= the number of `classify` calls. Cloning
/// yields a handle to the same underlying counters. Counters are never reset
/// except by an explicit [`reset`](ClassificationMetrics::reset) call.
#[derive(Clone)]
pub struct ClassificationMetrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    total: AtomicU64,
    keyword: AtomicU64,
    embedding: AtomicU64,
    llm: AtomicU64,
    by_category: Mutex<HashMap<RequirementCategory, u64>>,
    latencies_ms: Mutex<Vec<f64>>,
}

impl ClassificationMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                total: AtomicU64::new(0),
                keyword: AtomicU64::new(0),
                embedding: AtomicU64::new(0),
                llm: AtomicU64::new(0),
                by_category: Mutex::new(HashMap::new()),
                latencies_ms: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Record a tier-level decision
    pub fn record(&self, result: &ClassificationResult) {
        self.inner.total.fetch_add(1, Ordering::Relaxed);

        let tier_counter = match result.tier {
            ClassificationTier::Keyword => &self.inner.keyword,
            ClassificationTier::Embedding => &self.inner.embedding,
            ClassificationTier::Llm => &self.inner.llm,
        };
        tier_counter.fetch_add(1, Ordering::Relaxed);

        *self
            .inner
            .by_category
            .lock()
            .entry(result.category)
            .or_insert(0) += 1;

        self.inner.latencies_ms.lock().push(result.latency_ms);
    }

    /// Total tier-level decisions recorded
    pub fn total(&self) -> u64 {
        self.inner.total.load(Ordering::Relaxed)
    }

    /// Decisions recorded for a given tier
    pub fn tier_count(&self, tier: ClassificationTier) -> u64 {
        match tier {
            ClassificationTier::Keyword => self.inner.keyword.load(Ordering::Relaxed),
            ClassificationTier::Embedding => self.inner.embedding.load(Ordering::Relaxed),
            ClassificationTier::Llm => self.inner.llm.load(Ordering::Relaxed),
        }
    }

    /// Decisions recorded for a given category
    pub fn category_count(&self, category: RequirementCategory) -> u64 {
        self.inner
            .by_category
            .lock()
            .get(&category)
            .copied()
            .unwrap_or(0)
    }

    /// Get a point-in-time snapshot of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        let latencies = self.inner.latencies_ms.lock();
        let latency_count = latencies.len() as u64;
        let avg_latency_ms = if latencies.is_empty() {
            0.0
        } else {
            latencies.iter().sum::<f64>() / latencies.len() as f64
        };
        drop(latencies);

        MetricsSnapshot {
            total: self.inner.total.load(Ordering::Relaxed),
            keyword: self.inner.keyword.load(Ordering::Relaxed),
            embedding: self.inner.embedding.load(Ordering::Relaxed),
            llm: self.inner.llm.load(Ordering::Relaxed),
            by_category: self
                .inner
                .by_category
                .lock()
                .iter()
                .map(|(k, v)| (k.as_str().to_string(), *v))
                .collect(),
            latency_count,
            avg_latency_ms,
        }
    }

    /// Reset all counters to zero
    pub fn reset(&self) {
        self.inner.total.store(0, Ordering::Relaxed);
        self.inner.keyword.store(0, Ordering::Relaxed);
        self.inner.embedding.store(0, Ordering::Relaxed);
        self.inner.llm.store(0, Ordering::Relaxed);
        self.inner.by_category.lock().clear();
        self.inner.latencies_ms.lock().clear();
    }
}

impl Default for ClassificationMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of current metrics
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub total: u64,
    pub keyword: u64,
    pub embedding: u64,
    pub llm: u64,
    pub by_category: HashMap<String, u64>,
    pub latency_count: u64,
    pub avg_latency_ms: f64,
}
