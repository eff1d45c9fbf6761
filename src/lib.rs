//! pathrec: item recommendation over a bipartite user-item graph.
//!
//! Interactions are stored as symmetric weighted edges between user and item
//! nodes. Recommendations come from walking three-hop paths
//! `user → item → user → item` ([`scoring::Baseline`],
//! [`scoring::Normalized`]) or two-hop paths through a precomputed neighbour
//! index ([`scoring::NeighbourBased`], fed by
//! [`neighbours::detect_neighbours`]).
//!
//! ```
//! use pathrec::{Graph, ScoringStrategy, StrategyKind};
//!
//! let mut graph = Graph::default();
//! graph.put_interaction("A", "x", 1.0);
//! graph.put_interaction("B", "x", 1.0);
//! graph.put_interaction("B", "z", 1.0);
//!
//! let strategy = StrategyKind::Baseline.build_default();
//! assert_eq!(strategy.recommend(&graph, "A"), vec!["z".to_string()]);
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod dataset;
mod error;
pub mod eval;
pub mod graph;
pub mod metrics;
pub mod neighbours;
pub mod scoring;
pub mod topk;

pub use config::{ConfigError, RunConfig};
pub use error::{Error, Result};
pub use eval::{evaluate, EvaluationReport, Experiment, ExperimentReport};
pub use graph::{Graph, GraphOptions, Interaction, NormKind, NormPolicy};
pub use metrics::{CounterMetrics, NoopMetrics, RecommenderMetrics};
pub use neighbours::{detect_neighbours, DetectionReport, NeighbourOptions};
pub use scoring::{Baseline, NeighbourBased, Normalized, ScoringStrategy, StrategyKind};
