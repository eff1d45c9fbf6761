#![forbid(unsafe_code)]

//! Interaction dataset ingestion.
//!
//! Reads raw rating dumps, renames identifiers, and moves prepared datasets
//! in and out of JSON. The core graph only ever sees the resulting
//! [`Interaction`] records.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use rustc_hash::FxHashMap;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::graph::Interaction;

/// Layout of a delimited ratings file.
#[derive(Debug, Clone)]
pub struct RatingsFormat {
    /// Field delimiter.
    pub delimiter: u8,
    /// Whether the first row is a header.
    pub has_headers: bool,
    /// Column holding the user id.
    pub user_column: usize,
    /// Column holding the item id.
    pub item_column: usize,
    /// Column holding the rating.
    pub rating_column: usize,
    /// Ratings are divided by this value to obtain a weight.
    pub rating_scale: f64,
    /// Skip rows whose rating cannot be parsed instead of failing.
    pub skip_malformed: bool,
}

impl Default for RatingsFormat {
    /// Semicolon-separated, quoted, with a header row and ratings out of 10.
    fn default() -> Self {
        Self {
            delimiter: b';',
            has_headers: true,
            user_column: 0,
            item_column: 1,
            rating_column: 2,
            rating_scale: 10.0,
            skip_malformed: false,
        }
    }
}

/// Counters from a ratings load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadStats {
    /// Data rows read.
    pub rows: u64,
    /// Rows dropped because the rating was zero.
    pub zero_ratings: u64,
    /// Rows dropped because they could not be parsed.
    pub malformed: u64,
}

/// Reads ratings from `path`. See [`read_ratings`].
pub fn load_ratings_csv(
    path: impl AsRef<Path>,
    format: &RatingsFormat,
) -> Result<(Vec<Interaction>, LoadStats)> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let (interactions, stats) = read_ratings(BufReader::new(file), format, path)?;
    info!(
        path = %path.display(),
        rows = stats.rows,
        kept = interactions.len(),
        zero_ratings = stats.zero_ratings,
        malformed = stats.malformed,
        "pathrec.dataset.ratings_loaded"
    );
    Ok((interactions, stats))
}

/// Parses delimited ratings. Each kept row becomes an interaction weighted
/// `rating / rating_scale`; zero ratings mark "seen, not rated" and are
/// dropped.
pub fn read_ratings<R: Read>(
    reader: R,
    format: &RatingsFormat,
    origin: &Path,
) -> Result<(Vec<Interaction>, LoadStats)> {
    let mut csv = ReaderBuilder::new()
        .delimiter(format.delimiter)
        .has_headers(format.has_headers)
        .flexible(true)
        .from_reader(reader);
    let mut stats = LoadStats::default();
    let mut out = Vec::new();
    let mut record = StringRecord::new();
    while csv.read_record(&mut record)? {
        stats.rows += 1;
        let line = record.position().map(|p| p.line()).unwrap_or(stats.rows);
        match parse_row(&record, format) {
            Ok(Some(interaction)) => out.push(interaction),
            Ok(None) => stats.zero_ratings += 1,
            Err(reason) if format.skip_malformed => {
                warn!(line, reason = %reason, "pathrec.dataset.row_skipped");
                stats.malformed += 1;
            }
            Err(reason) => {
                return Err(Error::MalformedRecord {
                    path: origin.to_path_buf(),
                    line,
                    reason,
                })
            }
        }
    }
    Ok((out, stats))
}

fn parse_row(
    record: &StringRecord,
    format: &RatingsFormat,
) -> std::result::Result<Option<Interaction>, String> {
    let field = |idx: usize, name: &str| {
        record
            .get(idx)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| format!("missing {name} column {idx}"))
    };
    let user_id = field(format.user_column, "user")?;
    let item_id = field(format.item_column, "item")?;
    let raw = field(format.rating_column, "rating")?;
    let rating: f64 = raw
        .parse()
        .map_err(|_| format!("rating '{raw}' is not a number"))?;
    let weight = rating / format.rating_scale;
    if weight == 0.0 {
        return Ok(None);
    }
    Ok(Some(Interaction::new(user_id, item_id, weight)))
}

/// Renames users to `user_NNNN` and items to `item_NNNN`, numbered in order
/// of first appearance. Weights are kept.
pub fn anonymize(interactions: &[Interaction]) -> Vec<Interaction> {
    let mut users: FxHashMap<&str, usize> = FxHashMap::default();
    let mut items: FxHashMap<&str, usize> = FxHashMap::default();
    interactions
        .iter()
        .map(|interaction| {
            let next_user = users.len();
            let user = *users.entry(interaction.user_id.as_str()).or_insert(next_user);
            let next_item = items.len();
            let item = *items.entry(interaction.item_id.as_str()).or_insert(next_item);
            Interaction::new(
                format!("user_{user:04}"),
                format!("item_{item:04}"),
                interaction.weight,
            )
        })
        .collect()
}

/// Reads a JSON array of interactions. A missing `weight` defaults to 1.0.
pub fn load_json(path: impl AsRef<Path>) -> Result<Vec<Interaction>> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let interactions: Vec<Interaction> = serde_json::from_reader(reader)?;
    info!(
        path = %path.display(),
        interactions = interactions.len(),
        "pathrec.dataset.json_loaded"
    );
    Ok(interactions)
}

/// Writes interactions as a JSON array, creating parent directories.
pub fn save_json(path: impl AsRef<Path>, interactions: &[Interaction]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, interactions)?;
    writer.flush()?;
    Ok(())
}
