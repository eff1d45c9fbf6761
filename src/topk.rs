//! Ranking utilities.
//!
//! Every ranked list in the crate (recommendations, neighbour candidates,
//! neighbours) goes through [`top_k`], so ties resolve the same way
//! everywhere: higher score first, then lexicographically smaller
//! identifier first.

use std::cmp::Ordering;

/// Default length of a recommendation list.
pub const DEFAULT_TOP_K: usize = 10;

/// Orders `(id, score)` pairs by descending score, then ascending id.
pub fn rank_order(a: &(&str, f64), b: &(&str, f64)) -> Ordering {
    b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0))
}

/// Returns the `k` best `(id, score)` pairs in rank order.
///
/// NaN scores are dropped; `+inf` outranks every finite score. Ids are
/// expected to be unique.
pub fn top_k<'a, I>(scores: I, k: usize) -> Vec<(&'a str, f64)>
where
    I: IntoIterator<Item = (&'a str, f64)>,
{
    if k == 0 {
        return Vec::new();
    }
    let mut ranked: Vec<(&'a str, f64)> = scores
        .into_iter()
        .filter(|(_, score)| !score.is_nan())
        .collect();
    if ranked.len() > k {
        ranked.select_nth_unstable_by(k - 1, rank_order);
        ranked.truncate(k);
    }
    ranked.sort_unstable_by(rank_order);
    ranked
}
