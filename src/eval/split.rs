use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::graph::Interaction;

/// Default share of interactions held out for testing.
pub const DEFAULT_TEST_FRACTION: f64 = 0.1;
/// Default shuffle seed.
pub const DEFAULT_SEED: u64 = 42;

/// Shuffles `interactions` with a seeded generator and holds out
/// `ceil(len * test_fraction)` of them. Returns `(train, test)`.
///
/// The same input, fraction and seed always produce the same split.
pub fn split_dataset(
    interactions: &[Interaction],
    test_fraction: f64,
    seed: u64,
) -> Result<(Vec<Interaction>, Vec<Interaction>)> {
    if !(0.0..1.0).contains(&test_fraction) {
        return Err(Error::InvalidArgument(format!(
            "test fraction must be in [0, 1), got {test_fraction}"
        )));
    }
    let mut shuffled = interactions.to_vec();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    shuffled.shuffle(&mut rng);
    let test_len = (shuffled.len() as f64 * test_fraction).ceil() as usize;
    let train = shuffled.split_off(test_len);
    Ok((train, shuffled))
}

/// Overlap between the train and test users.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DatasetCheck {
    /// Distinct users in the train split.
    pub train_users: usize,
    /// Distinct users in the test split.
    pub test_users: usize,
    /// Test users with no train interaction; nothing can be recommended to
    /// them.
    pub cold_users: usize,
}

/// Counts the test users that never appear in the train split.
pub fn check_dataset(train: &[Interaction], test: &[Interaction]) -> DatasetCheck {
    let train_users: HashSet<&str> = train.iter().map(|i| i.user_id.as_str()).collect();
    let test_users: HashSet<&str> = test.iter().map(|i| i.user_id.as_str()).collect();
    let cold_users = test_users
        .iter()
        .filter(|user| !train_users.contains(*user))
        .count();
    DatasetCheck {
        train_users: train_users.len(),
        test_users: test_users.len(),
        cold_users,
    }
}
