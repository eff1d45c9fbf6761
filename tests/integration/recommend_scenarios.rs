#![allow(missing_docs)]

use pathrec::graph::{Graph, GraphOptions, NormKind, NormPolicy};
use pathrec::neighbours::{detect_neighbours, NeighbourOptions};
use pathrec::scoring::{Baseline, NeighbourBased, Normalized, ScoringStrategy, StrategyKind};

fn triangle(options: GraphOptions) -> Graph {
    let mut graph = Graph::new(options);
    graph.put_interaction("A", "x", 1.0);
    graph.put_interaction("A", "y", 1.0);
    graph.put_interaction("B", "x", 1.0);
    graph.put_interaction("B", "z", 1.0);
    graph.put_interaction("C", "y", 1.0);
    graph.put_interaction("C", "z", 1.0);
    graph
}

/// Forty users over sixty items with overlapping tastes.
fn catalogue() -> Graph {
    let mut graph = Graph::default();
    for user in 0..40 {
        for step in 0..8 {
            let item = (user * 3 + step * 7) % 60;
            let weight = 0.1 + ((user + step) % 9) as f64 / 10.0;
            graph.put_interaction(&format!("u{user:02}"), &format!("i{item:02}"), weight);
        }
    }
    graph
}

#[test]
fn triangle_scenario_recommends_only_the_unseen_item() {
    let mut graph = triangle(GraphOptions::default());
    detect_neighbours(&mut graph, &NeighbourOptions::default());
    for kind in StrategyKind::ALL {
        let strategy = kind.build_default();
        let recs = strategy.recommend(&graph, "A");
        assert_eq!(recs, vec!["z".to_string()], "strategy {kind}");
    }
}

#[test]
fn triangle_scores_match_hand_computation() {
    let graph = triangle(GraphOptions::default());
    let a = graph.user("A").unwrap();

    // Two paths reach z, each with product 1.
    let baseline = Baseline::default().score(&graph, a);
    assert!((baseline.score("z") - 2.0).abs() < 1e-12);

    // Every user norm is sqrt(2): each path is 1/sqrt(2) * 1/sqrt(2) * 1.
    let normalized = Normalized::default().score(&graph, a);
    assert!((normalized.score("z") - 1.0).abs() < 1e-12);
}

#[test]
fn no_strategy_recommends_known_items_or_exceeds_the_limit() {
    let mut graph = catalogue();
    detect_neighbours(&mut graph, &NeighbourOptions::default());
    let strategies: Vec<Box<dyn ScoringStrategy>> = vec![
        Box::new(Baseline::default()),
        Box::new(Normalized::default()),
        Box::new(NeighbourBased::default()),
    ];
    for strategy in &strategies {
        for user in graph.users() {
            let recs = strategy.recommend(&graph, user.id());
            assert!(recs.len() <= 10, "{} returned {}", strategy.name(), recs.len());
            for item in &recs {
                assert!(
                    !user.profile().contains(item),
                    "{} recommended known item {item} to {}",
                    strategy.name(),
                    user.id()
                );
            }
        }
    }
}

#[test]
fn recommendations_are_ranked_best_first_with_id_ties() {
    let graph = catalogue();
    for user in graph.users() {
        let scored = Normalized::default().recommend_scored(&graph, user.id());
        for pair in scored.windows(2) {
            let (ref a_id, a) = pair[0];
            let (ref b_id, b) = pair[1];
            assert!(a > b || (a == b && a_id < b_id), "{a_id}:{a} before {b_id}:{b}");
        }
    }
}

#[test]
fn unknown_user_gets_an_empty_list_from_every_strategy() {
    let mut graph = triangle(GraphOptions::default());
    detect_neighbours(&mut graph, &NeighbourOptions::default());
    for kind in StrategyKind::ALL {
        assert!(kind.build_default().recommend(&graph, "nobody").is_empty());
    }
    assert!(graph.user("nobody").is_none());
}

#[test]
fn neighbour_strategy_is_empty_until_detection() {
    let graph = catalogue();
    for user in graph.users() {
        assert!(user.neighbours().is_empty());
        assert!(NeighbourBased::default().recommend(&graph, user.id()).is_empty());
    }
}

#[test]
fn deferred_norms_score_like_eager_norms() {
    let eager = triangle(GraphOptions::new());
    let deferred = triangle(GraphOptions::new().norm_policy(NormPolicy::Deferred));
    for user in ["A", "B", "C"] {
        assert_eq!(
            Normalized::default().recommend_scored(&eager, user),
            Normalized::default().recommend_scored(&deferred, user)
        );
    }
}

#[test]
fn norm_formula_changes_normalized_scores_for_fractional_weights() {
    let build = |kind| {
        let mut graph = Graph::new(GraphOptions::new().norm_kind(kind));
        graph.put_interaction("A", "x", 0.5);
        graph.put_interaction("B", "x", 0.5);
        graph.put_interaction("B", "z", 0.25);
        graph
    };
    let euclidean = build(NormKind::Euclidean);
    let self_power = build(NormKind::SelfPower);
    let e = Normalized::default().recommend_scored(&euclidean, "A");
    let s = Normalized::default().recommend_scored(&self_power, "A");
    assert_eq!(e[0].0, "z");
    assert_eq!(s[0].0, "z");
    assert!((e[0].1 - s[0].1).abs() > 1e-6);
}

#[test]
fn top_k_is_configurable() {
    let graph = catalogue();
    let user = graph.users().next().unwrap().id().to_string();
    let three = StrategyKind::Baseline.build(3).recommend(&graph, &user);
    let ten = StrategyKind::Baseline.build(10).recommend(&graph, &user);
    assert!(three.len() <= 3);
    assert_eq!(three[..], ten[..three.len()]);
}

#[test]
fn overflowing_path_products_still_rank_first() {
    let mut graph = Graph::default();
    graph.try_put_interaction("A", "x", 1e200).unwrap();
    graph.try_put_interaction("B", "x", 1e200).unwrap();
    graph.try_put_interaction("B", "z", 1e200).unwrap();
    graph.put_interaction("C", "x", 1.0);
    graph.put_interaction("C", "w", 1.0);

    let scored = Baseline::default().recommend_scored(&graph, "A");
    assert_eq!(scored[0], ("z".to_string(), f64::INFINITY));
    assert_eq!(scored[1].0, "w");
    assert_eq!(Baseline::default().recommend(&graph, "A"), vec!["z", "w"]);
}
