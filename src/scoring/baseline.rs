use crate::graph::{Graph, UserNode};
use crate::topk::DEFAULT_TOP_K;

use super::{ScoreBoard, ScoringStrategy};

/// Scores every item at the end of a path `user → item → user' → item'` by
/// the product of the three edge weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Baseline {
    top_k: usize,
}

impl Baseline {
    /// Baseline strategy returning lists of at most `top_k` items.
    pub fn with_top_k(top_k: usize) -> Self {
        Self { top_k }
    }
}

impl Default for Baseline {
    fn default() -> Self {
        Self::with_top_k(DEFAULT_TOP_K)
    }
}

impl ScoringStrategy for Baseline {
    fn name(&self) -> &'static str {
        "baseline"
    }

    fn top_k(&self) -> usize {
        self.top_k
    }

    fn score<'g>(&self, graph: &'g Graph, user: &'g UserNode) -> ScoreBoard<'g> {
        let own = user.profile();
        let mut board = ScoreBoard::default();
        for (item_id, user_weight) in own.iter() {
            let Some(item) = graph.item(item_id) else {
                continue;
            };
            for (other_id, other_weight) in item.profile().iter() {
                let Some(other) = graph.user(other_id) else {
                    continue;
                };
                let prefix = user_weight * other_weight;
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
