//! Train/test splitting

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{Error, Result};

/// Shuffle `0..n_samples` with `seed` and split off a test set
///
/// The test set gets `ceil(test_fraction * n_samples)` indices, the training
/// set the rest. Both sets must end up non-empty.
pub fn train_test_split(
    n_samples: usize,
    test_fraction: f64,
    seed: u64,
) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(Error::InvalidInput(format!(
            "test fraction must be within (0, 1), got {}",
            test_fraction
        )));
    }

    let n_test = (test_fraction * n_samples as f64).ceil() as usize;
    if n_samples < 2 || n_test >= n_samples {
        return Err(Error::InvalidInput(format!(
            "{} samples cannot be split into non-empty train and test sets",
            n_samples
        )));
    }

    let mut indices: Vec<usize> = (0..n_samples).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train = indices.split_off(n_test);
    Ok((train, indices))
}
