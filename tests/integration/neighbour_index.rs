#![allow(missing_docs)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use pathrec::graph::{Graph, GraphOptions, NormPolicy};
use pathrec::metrics::CounterMetrics;
use pathrec::neighbours::{
    candidates, detect_neighbours, detect_neighbours_with_progress, similarity,
    CandidateWeighting, NeighbourOptions,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Users drawn from a small catalogue so that almost everyone overlaps.
fn dense_graph(users: usize, items: usize, per_user: usize, seed: u64) -> Graph {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut graph = Graph::default();
    for user in 0..users {
        for _ in 0..per_user {
            let item = rng.gen_range(0..items);
            let weight = f64::from(rng.gen_range(1u32..=10)) / 10.0;
            graph.put_interaction(&format!("user_{user:04}"), &format!("item_{item:04}"), weight);
        }
    }
    graph
}

#[test]
fn neighbour_lists_respect_the_default_limits() {
    let mut graph = dense_graph(300, 20, 5, 7);
    let options = NeighbourOptions::default();
    for user in graph.users() {
        assert!(candidates(&graph, user.profile(), &options).len() <= 1000);
    }
    let report = detect_neighbours(&mut graph, &options);
    assert_eq!(report.users, 300);
    for user in graph.users() {
        let neighbours = user.neighbours();
        assert!(neighbours.len() <= 50);
        assert!(neighbours.iter().all(|n| n.user_id != user.id()));
        for pair in neighbours.windows(2) {
            assert!(
                pair[0].similarity > pair[1].similarity
                    || (pair[0].similarity == pair[1].similarity
                        && pair[0].user_id < pair[1].user_id)
            );
        }
    }
    assert!(graph.neighbours_are_current());
}

#[test]
fn default_candidate_limit_holds_on_a_heavily_shared_item() {
    let mut graph = Graph::default();
    for user in 0..1100 {
        graph.put_interaction(&format!("user_{user:04}"), "bestseller", 1.0);
    }
    let options = NeighbourOptions::default();
    let reader = graph.user("user_0000").unwrap();
    let picked = candidates(&graph, reader.profile(), &options);
    assert_eq!(picked.len(), 1000);
    // Equal scores fall back to id order.
    assert_eq!(picked[0], "user_0000");
    assert_eq!(picked[999], "user_0999");

    detect_neighbours(&mut graph, &options);
    assert!(graph.users().all(|user| user.neighbours().len() == 50));
}

#[test]
fn small_candidate_limit_bounds_the_preselection() {
    let graph = dense_graph(120, 10, 4, 3);
    let options = NeighbourOptions::default().candidate_limit(25);
    for user in graph.users() {
        assert!(candidates(&graph, user.profile(), &options).len() <= 25);
    }
}

#[test]
fn shared_item_weighting_prefers_larger_overlap() {
    let mut graph = Graph::default();
    for item in ["a", "b", "c"] {
        graph.put_interaction("me", item, 1.0);
        graph.put_interaction("twin", item, 1.0);
    }
    graph.put_interaction("stranger", "a", 1.0);
    let options = NeighbourOptions::default().weighting(CandidateWeighting::SharedItems);
    let me = graph.user("me").unwrap();
    let ranked = candidates(&graph, me.profile(), &options);
    assert_eq!(ranked, vec!["me", "twin", "stranger"]);
}

#[test]
fn similarity_is_symmetric_and_bounded() {
    let graph = dense_graph(40, 15, 6, 11);
    let users: Vec<_> = graph.users().collect();
    for a in &users {
        for b in &users {
            let ab = similarity(a.profile(), graph.norm_of(a), b.profile(), graph.norm_of(b));
            let ba = similarity(b.profile(), graph.norm_of(b), a.profile(), graph.norm_of(a));
            assert!((ab - ba).abs() < 1e-12);
            assert!((0.0..=1.0 + 1e-9).contains(&ab));
        }
    }
}

#[test]
fn parallel_pass_matches_serial_pass() {
    let mut serial = dense_graph(150, 30, 6, 5);
    let mut parallel = dense_graph(150, 30, 6, 5);
    detect_neighbours(&mut serial, &NeighbourOptions::default());
    detect_neighbours(&mut parallel, &NeighbourOptions::default().parallel(true));
    for user in serial.users() {
        let other = parallel.user(user.id()).unwrap();
        assert_eq!(user.neighbours(), other.neighbours(), "user {}", user.id());
    }
}

#[test]
fn insertion_after_detection_marks_index_stale() {
    let mut graph = dense_graph(20, 10, 3, 1);
    assert!(!graph.neighbours_are_current());
    detect_neighbours(&mut graph, &NeighbourOptions::default());
    assert!(graph.neighbours_are_current());
    graph.put_interaction("user_0000", "item_9999", 1.0);
    assert!(!graph.neighbours_are_current());
    detect_neighbours(&mut graph, &NeighbourOptions::default());
    assert!(graph.neighbours_are_current());
}

#[test]
fn deferred_norms_are_refreshed_before_detection() {
    let mut graph = Graph::new(GraphOptions::new().norm_policy(NormPolicy::Deferred));
    graph.put_interaction("a", "x", 1.0);
    graph.put_interaction("b", "x", 0.5);
    let report = detect_neighbours(&mut graph, &NeighbourOptions::default());
    assert_eq!(report.norms_refreshed, 3);
    assert!(graph.users().all(|user| !user.norm().is_stale()));
    let a = graph.user("a").unwrap();
    assert_eq!(a.neighbours()[0].user_id, "b");
    assert!((a.neighbours()[0].similarity - 1.0).abs() < 1e-12);
}

#[test]
fn progress_and_metrics_see_every_user() {
    let metrics = Arc::new(CounterMetrics::default());
    let mut graph = Graph::new(GraphOptions::new().metrics(metrics.clone()));
    for user in 0..12 {
        graph.put_interaction(&format!("u{user}"), "shared", 1.0);
    }
    let calls = AtomicUsize::new(0);
    let report = detect_neighbours_with_progress(
        &mut graph,
        &NeighbourOptions::default().parallel(true),
        &|_, total| {
            assert_eq!(total, 12);
            calls.fetch_add(1, Ordering::Relaxed);
        },
    );
    assert_eq!(calls.load(Ordering::Relaxed), 12);
    assert_eq!(report.neighbours_stored, 12 * 11);
    assert_eq!(metrics.neighbour_passes.load(Ordering::Relaxed), 1);
    assert_eq!(metrics.neighbour_users_processed.load(Ordering::Relaxed), 12);
}
