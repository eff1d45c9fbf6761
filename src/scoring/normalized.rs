use rustc_hash::FxHashMap;

use crate::graph::norm::attenuate;
use crate::graph::{Graph, UserNode};
use crate::topk::DEFAULT_TOP_K;

use super::{ScoreBoard, ScoringStrategy};

/// Baseline paths with the two source-side weights attenuated by norms.
///
/// A path `user → item → user' → item'` contributes
/// `w(user, item) / |user| * w(user', item) / |user'| * w(user', item')`.
/// A zero norm makes the path contribute 0. Norms are read through
/// [`Graph::norm_of`], so a stale cached norm is never used; each co-rater's
/// norm is resolved once per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Normalized {
    top_k: usize,
}

impl Normalized {
    /// Normalized strategy returning lists of at most `top_k` items.
    pub fn with_top_k(top_k: usize) -> Self {
        Self { top_k }
    }
}

impl Default for Normalized {
    fn default() -> Self {
        Self::with_top_k(DEFAULT_TOP_K)
    }
}

impl ScoringStrategy for Normalized {
    fn name(&self) -> &'static str {
        "normalized"
    }

    fn top_k(&self) -> usize {
        self.top_k
    }

    fn score<'g>(&self, graph: &'g Graph, user: &'g UserNode) -> ScoreBoard<'g> {
        let own = user.profile();
        let user_norm = graph.norm_of(user);
        let mut board = ScoreBoard::default();
        let mut norms: FxHashMap<&'g str, f64> = FxHashMap::default();
        for (item_id, user_weight) in own.iter() {
            let Some(item) = graph.item(item_id) else {
                continue;
            };
            let head = attenuate(user_weight, user_norm);
            for (other_id, other_weight) in item.profile().iter() {
                let Some(other) = graph.user(other_id) else {
                    continue;
                };
                let other_norm = *norms
                    .entry(other.id())
                    .or_insert_with(|| graph.norm_of(other));
                let prefix = head * attenuate(other_weight, other_norm);
                for (candidate_id, candidate_weight) in other.profile().iter() {
                    if own.contains(candidate_id) {
                        continue;
                    }
                    board.add(candidate_id, prefix * candidate_weight);
                }
            }
        }
        board
    }
}
