use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by pathrec.
///
/// The scoring core never fails: an unknown user yields an empty
/// recommendation list and a zero norm yields a zero contribution. The
/// variants below belong to validated ingestion and to the I/O collaborators.
#[derive(Debug, Error)]
pub enum Error {
    /// A weight rejected by [`crate::graph::Graph::try_put_interaction`].
    #[error("invalid weight {weight} for interaction ({user_id}, {item_id})")]
    InvalidWeight {
        /// User side of the rejected interaction.
        user_id: String,
        /// Item side of the rejected interaction.
        item_id: String,
        /// The offending weight.
        weight: f64,
    },
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// Malformed delimited input.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    /// Malformed JSON dataset.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// A ratings row could not be interpreted.
    #[error("{path}:{line}: {reason}")]
    MalformedRecord {
        /// File being read.
        path: PathBuf,
        /// One-based line number.
        line: u64,
        /// What was wrong with the row.
        reason: String,
    },
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
    /// Invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    pub(crate) fn invalid_weight(user_id: &str, item_id: &str, weight: f64) -> Self {
        Error::InvalidWeight {
            user_id: user_id.to_string(),
            item_id: item_id.to_string(),
            weight,
        }
    }
}
