//! Offline evaluation: train/test split, recall, and the experiment driver.

mod split;

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::RunConfig;
use crate::error::Result;
use crate::graph::{Graph, GraphOptions, Interaction};
use crate::neighbours::{detect_neighbours_with_progress, DetectionReport};
use crate::scoring::ScoringStrategy;

pub use split::{check_dataset, split_dataset, DatasetCheck, DEFAULT_SEED, DEFAULT_TEST_FRACTION};

/// Default number of test users between two evaluation progress log lines.
pub const DEFAULT_PROGRESS_INTERVAL: usize = 100;

/// Recall of one strategy over a held-out set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EvaluationReport {
    /// Strategy that produced the recommendations.
    pub strategy: String,
    /// Distinct test users asked for recommendations.
    pub users_evaluated: usize,
    /// Test users unknown to the graph.
    pub unknown_users: usize,
    /// Held-out items that appeared in their user's recommendation list.
    pub correctly_recommended: usize,
    /// Held-out `(user, item)` pairs.
    pub total_held_out: usize,
    /// Wall-clock duration.
    pub duration_ms: u64,
}

impl EvaluationReport {
    /// `correctly_recommended / total_held_out`, 0 for an empty test set.
    pub fn recall(&self) -> f64 {
        if self.total_held_out == 0 {
            0.0
        } else {
            self.correctly_recommended as f64 / self.total_held_out as f64
        }
    }
}

/// Asks `strategy` for every test user and counts held-out hits.
pub fn evaluate(graph: &Graph, strategy: &dyn ScoringStrategy, test: &[Interaction]) -> EvaluationReport {
    evaluate_with_progress(graph, strategy, test, DEFAULT_PROGRESS_INTERVAL, &|_, _| {})
}

/// [`evaluate`] with a progress log line every `progress_interval` users and
/// a `progress(done, total)` callback after each user.
pub fn evaluate_with_progress(
    graph: &Graph,
    strategy: &dyn ScoringStrategy,
    test: &[Interaction],
    progress_interval: usize,
    progress: &dyn Fn(usize, usize),
) -> EvaluationReport {
    let start = Instant::now();
    if strategy.requires_neighbours() && !graph.neighbours_are_current() {
        warn!(
            strategy = strategy.name(),
            "pathrec.eval.stale_neighbour_index"
        );
    }

    let mut held_out: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for interaction in test {
        held_out
            .entry(interaction.user_id.as_str())
            .or_default()
            .insert(interaction.item_id.as_str());
    }

    let total_users = held_out.len();
    let mut report = EvaluationReport {
        strategy: strategy.name().to_string(),
        users_evaluated: total_users,
        ..EvaluationReport::default()
    };
    for (n, (user_id, items)) in held_out.iter().enumerate() {
        if progress_interval > 0 && n % progress_interval == 0 {
            info!(
                done = n,
                total = total_users,
                percent = n * 100 / total_users.max(1),
                correct = report.correctly_recommended,
                "pathrec.eval.progress"
            );
        }
        if graph.user(user_id).is_none() {
            report.unknown_users += 1;
        }
        let recommended = strategy.recommend(graph, user_id);
        report.correctly_recommended += recommended
            .iter()
            .filter(|item| items.contains(item.as_str()))
            .count();
        report.total_held_out += items.len();
        progress(n + 1, total_users);
    }

    report.duration_ms = start.elapsed().as_millis() as u64;
    info!(
        strategy = %report.strategy,
        correct = report.correctly_recommended,
        total = report.total_held_out,
        recall = report.recall(),
        "pathrec.eval.completed"
    );
    report
}

/// Everything an experiment run produced.
#[derive(Debug, Clone, Serialize)]
pub struct ExperimentReport {
    /// Interactions in the input dataset.
    pub dataset_size: usize,
    /// Interactions used to build the graph.
    pub train_size: usize,
    /// Interactions held out.
    pub test_size: usize,
    /// User overlap between the splits.
    pub check: DatasetCheck,
    /// Users in the trained graph.
    pub graph_users: usize,
    /// Items in the trained graph.
    pub graph_items: usize,
    /// Stale norms recomputed once after training.
    pub refreshed_norms: usize,
    /// Neighbour pass, when the strategy needed one.
    pub neighbours: Option<DetectionReport>,
    /// Recall measurement.
    pub evaluation: EvaluationReport,
}

/// Hooks the experiment driver calls while it runs.
pub trait ExperimentObserver {
    /// A phase is starting.
    fn phase(&self, _name: &str) {}
    /// Neighbour detection progress.
    fn neighbours_progress(&self, _done: usize, _total: usize) {}
    /// Evaluation progress.
    fn evaluation_progress(&self, _done: usize, _total: usize) {}
}

/// Observer that ignores every event.
#[derive(Debug, Default)]
pub struct SilentObserver;

impl ExperimentObserver for SilentObserver {}

/// One offline experiment: split, train a fresh graph, detect neighbours if
/// the strategy needs them, evaluate.
#[derive(Debug, Clone)]
pub struct Experiment {
    config: RunConfig,
}

impl Experiment {
    /// Creates an experiment from a run configuration.
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    /// The configuration in use.
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Runs the experiment. With `unit_weights` every train interaction is
    /// inserted with weight 1.0 regardless of its recorded weight.
    pub fn run(
        &self,
        interactions: &[Interaction],
        unit_weights: bool,
        observer: &(dyn ExperimentObserver + Sync),
    ) -> Result<ExperimentReport> {
        let cfg = &self.config;
        info!(dataset_size = interactions.len(), "pathrec.experiment.begin");

        observer.phase("split");
        let (train, test) =
            split_dataset(interactions, cfg.evaluation.test_fraction, cfg.evaluation.seed)?;
        let check = check_dataset(&train, &test);
        info!(
            train = train.len(),
            test = test.len(),
            cold_users = check.cold_users,
            "pathrec.experiment.split"
        );

        observer.phase("build");
        let options = GraphOptions::new()
            .norm_kind(cfg.graph.norm_kind)
            .norm_policy(cfg.graph.norm_policy);
        let mut graph = Graph::new(options);
        for interaction in &train {
            let weight = if unit_weights { 1.0 } else { interaction.weight };
            graph.put_interaction(&interaction.user_id, &interaction.item_id, weight);
        }
        info!(
            users = graph.user_count(),
            items = graph.item_count(),
            edges = graph.edge_count(),
            "pathrec.experiment.graph_built"
        );
        let refreshed_norms = graph.refresh_norms();

        let strategy = cfg.scoring.strategy.build(cfg.scoring.top_k);
        let neighbours = if strategy.requires_neighbours() {
            observer.phase("neighbours");
            Some(detect_neighbours_with_progress(
                &mut graph,
                &cfg.neighbours,
                &|done, total| observer.neighbours_progress(done, total),
            ))
        } else {
            None
        };

        observer.phase("evaluate");
        let evaluation = evaluate_with_progress(
            &graph,
            strategy.as_ref(),
            &test,
            cfg.evaluation.progress_interval,
            &|done, total| observer.evaluation_progress(done, total),
        );

        Ok(ExperimentReport {
            dataset_size: interactions.len(),
            train_size: train.len(),
            test_size: test.len(),
            check,
            graph_users: graph.user_count(),
            graph_items: graph.item_count(),
            refreshed_norms,
            neighbours,
            evaluation,
        })
    }
}
