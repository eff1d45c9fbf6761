use std::sync::Arc;

use crate::metrics::{default_metrics, RecommenderMetrics};

use super::norm::{NormKind, NormPolicy};

/// Configuration options supplied when creating a [`super::Graph`].
#[derive(Clone)]
pub struct GraphOptions {
    /// Formula used for user and item norms.
    pub norm_kind: NormKind,
    /// Whether norms are recomputed on insertion or lazily.
    pub norm_policy: NormPolicy,
    /// Metrics sink notified of insertions and node creation.
    pub metrics: Arc<dyn RecommenderMetrics>,
}

impl GraphOptions {
    /// Creates options with the Euclidean norm kept eagerly up to date.
    pub fn new() -> Self {
        Self {
            norm_kind: NormKind::default(),
            norm_policy: NormPolicy::default(),
            metrics: default_metrics(),
        }
    }

    /// Sets the norm formula.
    pub fn norm_kind(mut self, kind: NormKind) -> Self {
        self.norm_kind = kind;
        self
    }

    /// Sets the norm recomputation policy.
    pub fn norm_policy(mut self, policy: NormPolicy) -> Self {
        self.norm_policy = policy;
        self
    }

    /// Sets the metrics collection implementation.
    pub fn metrics(mut self, metrics: Arc<dyn RecommenderMetrics>) -> Self {
        self.metrics = metrics;
        self
    }
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for GraphOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphOptions")
            .field("norm_kind", &self.norm_kind)
            .field("norm_policy", &self.norm_policy)
            .finish_non_exhaustive()
    }
}
