use serde::{Deserialize, Serialize};

/// Default number of candidates kept per user before exact scoring.
pub const DEFAULT_CANDIDATE_LIMIT: usize = 1000;
/// Default number of neighbours stored per user.
pub const DEFAULT_NEIGHBOUR_LIMIT: usize = 50;
/// Default number of users between two progress log lines.
pub const DEFAULT_PROGRESS_INTERVAL: usize = 100;

/// How a shared item contributes to a candidate's preselection score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateWeighting {
    /// Every shared item counts 1.
    SharedItems,
    /// Every shared item counts `1 / norm(candidate)`, which pushes
    /// high-degree users down the candidate list.
    #[default]
    InverseNorm,
}

/// Settings for a neighbour detection pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeighbourOptions {
    /// Maximum candidates considered per user.
    pub candidate_limit: usize,
    /// Maximum neighbours stored per user.
    pub neighbour_limit: usize,
    /// Candidate preselection scoring.
    pub weighting: CandidateWeighting,
    /// Compute users concurrently on the rayon pool.
    pub parallel: bool,
    /// Users between two progress log lines (0 disables them).
    pub progress_interval: usize,
}

impl Default for NeighbourOptions {
    fn default() -> Self {
        Self {
            candidate_limit: DEFAULT_CANDIDATE_LIMIT,
            neighbour_limit: DEFAULT_NEIGHBOUR_LIMIT,
            weighting: CandidateWeighting::default(),
            parallel: false,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

impl NeighbourOptions {
    /// Sets the candidate limit.
    pub fn candidate_limit(mut self, limit: usize) -> Self {
        self.candidate_limit = limit;
        self
    }

    /// Sets the neighbour limit.
    pub fn neighbour_limit(mut self, limit: usize) -> Self {
        self.neighbour_limit = limit;
        self
    }

    /// Sets the candidate weighting.
    pub fn weighting(mut self, weighting: CandidateWeighting) -> Self {
        self.weighting = weighting;
        self
    }

    /// Enables or disables the parallel pass.
    pub fn parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    /// Sets the progress logging interval.
    pub fn progress_interval(mut self, users: usize) -> Self {
        self.progress_interval = users;
        self
    }
}
