use tracing::warn;

use crate::graph::{Graph, UserNode};
use crate::topk::DEFAULT_TOP_K;

use super::{ScoreBoard, ScoringStrategy};

/// Scores items through the precomputed neighbour index.
///
/// A path `user → neighbour → item` contributes
/// `similarity(user, neighbour) * w(neighbour, item)`. Users without
/// neighbours, including every user before
/// [`crate::neighbours::detect_neighbours`] has run, get no recommendations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NeighbourBased {
    top_k: usize,
}

impl NeighbourBased {
    /// Neighbour strategy returning lists of at most `top_k` items.
    pub fn with_top_k(top_k: usize) -> Self {
        Self { top_k }
    }
}

impl Default for NeighbourBased {
    fn default() -> Self {
        Self::with_top_k(DEFAULT_TOP_K)
    }
}

impl ScoringStrategy for NeighbourBased {
    fn name(&self) -> &'static str {
        "neighbours"
    }

    fn top_k(&self) -> usize {
        self.top_k
    }

    fn requires_neighbours(&self) -> bool {
        true
    }

    fn score<'g>(&self, graph: &'g Graph, user: &'g UserNode) -> ScoreBoard<'g> {
        if !graph.neighbours_are_current() {
            warn!(user_id = user.id(), "pathrec.scoring.neighbours.stale_index");
        }
        let own = user.profile();
        let mut board = ScoreBoard::default();
        for neighbour in user.neighbours() {
            let Some(other) = graph.user(&neighbour.user_id) else {
                continue;
            };
            for (candidate_id, candidate_weight) in other.profile().iter() {
                if own.contains(candidate_id) {
                    continue;
                }
                board.add(candidate_id, neighbour.similarity * candidate_weight);
            }
        }
        board
    }
}
