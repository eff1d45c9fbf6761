//! Approximate user-neighbour index.
//!
//! Comparing every pair of users is quadratic, so detection runs in two
//! steps per user: a cheap walk over the inverted index (user → items →
//! users) preselects at most `candidate_limit` candidates, then exact cosine
//! similarity ranks those candidates and the best `neighbour_limit` are kept.

mod options;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::info;

use crate::graph::norm::attenuate;
use crate::graph::{Graph, Neighbour, Profile, UserNode};
use crate::topk::top_k;

pub use options::{
    CandidateWeighting, NeighbourOptions, DEFAULT_CANDIDATE_LIMIT, DEFAULT_NEIGHBOUR_LIMIT,
    DEFAULT_PROGRESS_INTERVAL,
};

/// Summary of a [`detect_neighbours`] pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DetectionReport {
    /// Users whose neighbour list was recomputed.
    pub users: usize,
    /// Candidates scored with exact similarity, summed over users.
    pub candidates_scored: usize,
    /// Neighbours stored, summed over users.
    pub neighbours_stored: usize,
    /// Norms refreshed before the pass.
    pub norms_refreshed: usize,
    /// Wall-clock duration of the pass.
    pub duration_ms: u64,
}

/// Preselects users that share items with `profile`.
///
/// Each user reached through one of the profile's items scores one unit per
/// shared item, scaled by `1 / norm` under
/// [`CandidateWeighting::InverseNorm`] (a zero norm scores 0). Returns at most
/// `options.candidate_limit` ids, best first, ties by ascending id. The owner
/// of `profile` is not filtered out.
pub fn candidates<'g>(
    graph: &'g Graph,
    profile: &Profile,
    options: &NeighbourOptions,
) -> Vec<&'g str> {
    let mut shared: FxHashMap<&'g str, u32> = FxHashMap::default();
    for item_id in profile.ids() {
        let Some(item) = graph.item(item_id) else {
            continue;
        };
        for user_id in item.profile().ids() {
            *shared.entry(user_id).or_insert(0) += 1;
        }
    }

    let scored = shared.into_iter().map(|(user_id, count)| {
        let score = match options.weighting {
            CandidateWeighting::SharedItems => f64::from(count),
            CandidateWeighting::InverseNorm => graph
                .user(user_id)
                .map(|user| f64::from(count) * attenuate(1.0, graph.norm_of(user)))
                .unwrap_or(0.0),
        };
        (user_id, score)
    });

    top_k(scored, options.candidate_limit)
        .into_iter()
        .map(|(user_id, _)| user_id)
        .collect()
}

/// Cosine similarity of two profiles.
///
/// Sums `a[i] * b[i]` over shared ids and divides by `norm_a * norm_b`.
/// Returns 0 when either norm is 0.
pub fn similarity(profile_a: &Profile, norm_a: f64, profile_b: &Profile, norm_b: f64) -> f64 {
    let denom = norm_a * norm_b;
    if !(denom > 0.0) {
        return 0.0;
    }
    // Absent ids contribute 0, so walking the smaller side is equivalent.
    let (small, large) = if profile_a.len() <= profile_b.len() {
        (profile_a, profile_b)
    } else {
        (profile_b, profile_a)
    };
    let dot: f64 = small.iter().map(|(id, w)| w * large.weight(id)).sum();
    dot / denom
}

/// Recomputes the neighbour list of every user. See
/// [`detect_neighbours_with_progress`].
pub fn detect_neighbours(graph: &mut Graph, options: &NeighbourOptions) -> DetectionReport {
    detect_neighbours_with_progress(graph, options, &|_, _| {})
}

/// Recomputes the neighbour list of every user, calling
/// `progress(done, total)` after each user.
///
/// Stale norms are refreshed first. Lists are computed against a shared
/// read-only view of the graph (in parallel when `options.parallel` is set)
/// and stored once every user is done, so the serial and parallel passes
/// produce the same lists.
pub fn detect_neighbours_with_progress(
    graph: &mut Graph,
    options: &NeighbourOptions,
    progress: &(dyn Fn(usize, usize) + Sync),
) -> DetectionReport {
    let start = Instant::now();
    let norms_refreshed = graph.refresh_norms();

    let view: &Graph = graph;
    let users: Vec<&UserNode> = view.users().collect();
    let total = users.len();
    let done = AtomicUsize::new(0);
    info!(
        users = total,
        candidate_limit = options.candidate_limit,
        neighbour_limit = options.neighbour_limit,
        parallel = options.parallel,
        "pathrec.neighbours.detect.begin"
    );

    let detect_one = |user: &&UserNode| {
        let (list, scored) = neighbours_for(view, user, options);
        let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
        if options.progress_interval > 0 && finished % options.progress_interval == 0 {
            info!(
                done = finished,
                total,
                percent = finished * 100 / total.max(1),
                "pathrec.neighbours.detect.progress"
            );
        }
        progress(finished, total);
        (user.id().to_string(), list, scored)
    };
    let computed: Vec<(String, Vec<Neighbour>, usize)> = if options.parallel {
        users.par_iter().map(detect_one).collect()
    } else {
        users.iter().map(detect_one).collect()
    };

    let mut report = DetectionReport {
        users: total,
        norms_refreshed,
        ..DetectionReport::default()
    };
    let mut lists = Vec::with_capacity(computed.len());
    for (user_id, list, scored) in computed {
        report.candidates_scored += scored;
        report.neighbours_stored += list.len();
        lists.push((user_id, list));
    }
    graph.store_neighbours(lists);
    graph.options().metrics.neighbour_pass(total as u64);

    report.duration_ms = start.elapsed().as_millis() as u64;
    info!(
        users = report.users,
        candidates_scored = report.candidates_scored,
        neighbours_stored = report.neighbours_stored,
        duration_ms = report.duration_ms,
        "pathrec.neighbours.detect.completed"
    );
    report
}

/// Ranks the candidates of one user. Returns the list and the number of
/// candidates scored.
fn neighbours_for(
    graph: &Graph,
    user: &UserNode,
    options: &NeighbourOptions,
) -> (Vec<Neighbour>, usize) {
    let norm = graph.norm_of(user);
    let scored: Vec<(&str, f64)> = candidates(graph, user.profile(), options)
        .into_iter()
        .filter(|candidate| *candidate != user.id())
        .filter_map(|candidate| graph.user(candidate))
        .map(|other| {
            let sim = similarity(user.profile(), norm, other.profile(), graph.norm_of(other));
            (other.id(), sim)
        })
        .collect();
    let count = scored.len();
    let list = top_k(scored, options.neighbour_limit)
        .into_iter()
        .map(|(user_id, similarity)| Neighbour {
            user_id: user_id.to_string(),
            similarity,
        })
        .collect();
    (list, count)
}
