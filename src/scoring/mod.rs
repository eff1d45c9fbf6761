//! Recommendation scoring strategies.
//!
//! All strategies walk the same [`Graph`] and differ only in the paths they
//! follow and in how a path's edge weights combine into a score. Paths that
//! reach the same candidate item add up. Items already present in the
//! source user's profile are never candidates.

mod baseline;
mod neighbour;
mod normalized;

use std::fmt;
use std::str::FromStr;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::graph::{Graph, UserNode};
use crate::topk::{self, DEFAULT_TOP_K};

pub use baseline::Baseline;
pub use neighbour::NeighbourBased;
pub use normalized::Normalized;

/// Accumulated candidate scores for one user.
#[derive(Debug, Clone, Default)]
pub struct ScoreBoard<'g> {
    scores: FxHashMap<&'g str, f64>,
}

impl<'g> ScoreBoard<'g> {
    /// Adds one path's contribution to `item_id`.
    pub fn add(&mut self, item_id: &'g str, contribution: f64) {
        *self.scores.entry(item_id).or_insert(0.0) += contribution;
    }

    /// Score of `item_id`, 0 when no path reached it.
    pub fn score(&self, item_id: &str) -> f64 {
        self.scores.get(item_id).copied().unwrap_or(0.0)
    }

    /// Whether any path reached `item_id`.
    pub fn contains(&self, item_id: &str) -> bool {
        self.scores.contains_key(item_id)
    }

    /// Number of candidate items reached.
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// Whether no candidate was reached.
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Iterates `(item id, score)` in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&'g str, f64)> + '_ {
        self.scores.iter().map(|(id, score)| (*id, *score))
    }

    /// The `k` best candidates with their scores, in rank order.
    pub fn ranked(&self, k: usize) -> Vec<(&'g str, f64)> {
        topk::top_k(self.iter(), k)
    }
}

/// A way of scoring candidate items for a user.
pub trait ScoringStrategy: Send + Sync {
    /// Stable strategy name used in logs and metrics.
    fn name(&self) -> &'static str;

    /// Maximum length of a recommendation list.
    fn top_k(&self) -> usize;

    /// Whether the strategy reads the neighbour index.
    fn requires_neighbours(&self) -> bool {
        false
    }

    /// Accumulates candidate scores for `user`.
    fn score<'g>(&self, graph: &'g Graph, user: &'g UserNode) -> ScoreBoard<'g>;

    /// Best candidates for `user_id` with their scores. Empty for an unknown
    /// user.
    fn recommend_scored(&self, graph: &Graph, user_id: &str) -> Vec<(String, f64)> {
        let metrics = &graph.options().metrics;
        let Some(user) = graph.user(user_id) else {
            metrics.recommendation_served(self.name(), false);
            return Vec::new();
        };
        metrics.recommendation_served(self.name(), true);
        self.score(graph, user)
            .ranked(self.top_k())
            .into_iter()
            .map(|(item_id, score)| (item_id.to_string(), score))
            .collect()
    }

    /// Best candidate item ids for `user_id`, highest score first. Empty for
    /// an unknown user.
    fn recommend(&self, graph: &Graph, user_id: &str) -> Vec<String> {
        self.recommend_scored(graph, user_id)
            .into_iter()
            .map(|(item_id, _)| item_id)
            .collect()
    }
}

/// Selects one of the built-in strategies by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Unnormalized length-3 path products.
    Baseline,
    /// Length-3 path products attenuated by user norms.
    #[default]
    Normalized,
    /// Similarity-weighted paths through precomputed neighbours.
    Neighbours,
}

impl StrategyKind {
    /// All strategies, in declaration order.
    pub const ALL: [StrategyKind; 3] = [
        StrategyKind::Baseline,
        StrategyKind::Normalized,
        StrategyKind::Neighbours,
    ];

    /// Instantiates the strategy with lists of at most `top_k` items.
    pub fn build(self, top_k: usize) -> Box<dyn ScoringStrategy> {
        match self {
            StrategyKind::Baseline => Box::new(Baseline::with_top_k(top_k)),
            StrategyKind::Normalized => Box::new(Normalized::with_top_k(top_k)),
            StrategyKind::Neighbours => Box::new(NeighbourBased::with_top_k(top_k)),
        }
    }

    /// Instantiates the strategy with the default list length.
    pub fn build_default(self) -> Box<dyn ScoringStrategy> {
        self.build(DEFAULT_TOP_K)
    }

    /// Stable lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            StrategyKind::Baseline => "baseline",
            StrategyKind::Normalized => "normalized",
            StrategyKind::Neighbours => "neighbours",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StrategyKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::InvalidArgument(format!("unknown strategy '{s}'")))
    }
}
