use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Trait for tracking graph and recommendation activity.
///
/// Implementations collect counts of insertions, node creations and served
/// recommendations. The graph calls into the installed implementation on
/// every operation, so implementations must be cheap.
pub trait RecommenderMetrics: Send + Sync {
    /// Records one `put_interaction` call.
    fn interaction_inserted(&self);

    /// Records the lazy creation of a node.
    ///
    /// # Parameters
    /// * `kind` - `"user"` or `"item"`.
    fn node_created(&self, kind: &'static str);

    /// Records a served recommendation request.
    ///
    /// # Parameters
    /// * `strategy` - Name of the scoring strategy that served it.
    /// * `known_user` - Whether the user existed in the graph.
    fn recommendation_served(&self, strategy: &'static str, known_user: bool);

    /// Records a completed neighbour detection pass over `users` users.
    fn neighbour_pass(&self, users: u64);
}

/// A no-op implementation of [`RecommenderMetrics`].
#[derive(Default)]
pub struct NoopMetrics;

impl RecommenderMetrics for NoopMetrics {
    fn interaction_inserted(&self) {}
    fn node_created(&self, _kind: &'static str) {}
    fn recommendation_served(&self, _strategy: &'static str, _known_user: bool) {}
    fn neighbour_pass(&self, _users: u64) {}
}

/// A thread-safe counter-based implementation of [`RecommenderMetrics`].
#[derive(Default)]
pub struct CounterMetrics {
    /// Number of interactions inserted.
    pub interactions_inserted: AtomicU64,

    /// Number of user nodes created.
    pub users_created: AtomicU64,

    /// Number of item nodes created.
    pub items_created: AtomicU64,

    /// Number of recommendation requests served.
    pub recommendations_served: AtomicU64,

    /// Number of requests for users absent from the graph.
    pub unknown_user_lookups: AtomicU64,

    /// Number of neighbour detection passes.
    pub neighbour_passes: AtomicU64,

    /// Total users processed across all neighbour passes.
    pub neighbour_users_processed: AtomicU64,
}

impl RecommenderMetrics for CounterMetrics {
    fn interaction_inserted(&self) {
        self.interactions_inserted.fetch_add(1, Ordering::Relaxed);
    }

    fn node_created(&self, kind: &'static str) {
        match kind {
            "user" => {
                self.users_created.fetch_add(1, Ordering::Relaxed);
            }
            "item" => {
                self.items_created.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }
    }

    fn recommendation_served(&self, _strategy: &'static str, known_user: bool) {
        self.recommendations_served.fetch_add(1, Ordering::Relaxed);
        if !known_user {
            self.unknown_user_lookups.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn neighbour_pass(&self, users: u64) {
        self.neighbour_passes.fetch_add(1, Ordering::Relaxed);
        self.neighbour_users_processed
            .fetch_add(users, Ordering::Relaxed);
    }
}

/// Returns the default metrics implementation, a [`NoopMetrics`].
pub fn default_metrics() -> Arc<dyn RecommenderMetrics> {
    Arc::new(NoopMetrics)
}
