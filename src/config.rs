//! Run configuration.
//!
//! A run is described by a TOML file with four optional sections:
//!
//! ```toml
//! [graph]
//! norm_kind = "euclidean"      # or "self_power"
//! norm_policy = "eager"        # or "deferred"
//!
//! [neighbours]
//! candidate_limit = 1000
//! neighbour_limit = 50
//! weighting = "inverse_norm"   # or "shared_items"
//! parallel = false
//!
//! [scoring]
//! strategy = "normalized"      # "baseline" | "normalized" | "neighbours"
//! top_k = 10
//!
//! [evaluation]
//! test_fraction = 0.1
//! seed = 42
//! progress_interval = 100
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::eval::{DEFAULT_PROGRESS_INTERVAL, DEFAULT_SEED, DEFAULT_TEST_FRACTION};
use crate::graph::{NormKind, NormPolicy};
use crate::neighbours::NeighbourOptions;
use crate::scoring::StrategyKind;
use crate::topk::DEFAULT_TOP_K;

/// Graph construction settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GraphSection {
    /// Norm formula.
    pub norm_kind: NormKind,
    /// Norm recomputation policy.
    pub norm_policy: NormPolicy,
}

/// Scoring settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScoringSection {
    /// Strategy used to rank items.
    pub strategy: StrategyKind,
    /// Recommendation list length.
    pub top_k: usize,
}

impl Default for ScoringSection {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            top_k: DEFAULT_TOP_K,
        }
    }
}

/// Offline evaluation settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EvaluationSection {
    /// Share of interactions held out.
    pub test_fraction: f64,
    /// Shuffle seed.
    pub seed: u64,
    /// Test users between two progress log lines (0 disables them).
    pub progress_interval: usize,
}

impl Default for EvaluationSection {
    fn default() -> Self {
        Self {
            test_fraction: DEFAULT_TEST_FRACTION,
            seed: DEFAULT_SEED,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

/// Complete run configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// `[graph]` section.
    pub graph: GraphSection,
    /// `[neighbours]` section.
    pub neighbours: NeighbourOptions,
    /// `[scoring]` section.
    pub scoring: ScoringSection,
    /// `[evaluation]` section.
    pub evaluation: EvaluationSection,
}

impl RunConfig {
    /// Loads `explicit`, or the default config file when `None`. A missing
    /// default file yields the defaults; a missing explicit file is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::read(path),
            None => match default_config_path() {
                Some(path) if path.exists() => Self::read(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Reads and validates one TOML file.
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: RunConfig = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values no run can use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..1.0).contains(&self.evaluation.test_fraction) {
            return Err(ConfigError::Invalid {
                field: "evaluation.test_fraction",
                reason: format!("must be in [0, 1), got {}", self.evaluation.test_fraction),
            });
        }
        if self.scoring.top_k == 0 {
            return Err(ConfigError::Invalid {
                field: "scoring.top_k",
                reason: "must be at least 1".into(),
            });
        }
        if self.neighbours.neighbour_limit > self.neighbours.candidate_limit {
            return Err(ConfigError::Invalid {
                field: "neighbours.neighbour_limit",
                reason: format!(
                    "{} exceeds candidate_limit {}",
                    self.neighbours.neighbour_limit, self.neighbours.candidate_limit
                ),
            });
        }
        Ok(())
    }
}

/// Errors raised while loading a [`RunConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        /// Config path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The file is not valid TOML for a run config.
    #[error("failed to parse config {path}: {source}")]
    Parse {
        /// Config path.
        path: PathBuf,
        /// Underlying error.
        source: toml::de::Error,
    },
    /// A value is out of range.
    #[error("invalid config value {field}: {reason}")]
    Invalid {
        /// Dotted field name.
        field: &'static str,
        /// What is wrong.
        reason: String,
    },
}

/// `<config dir>/pathrec/config.toml`, when the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|base| base.join("pathrec").join("config.toml"))
}
