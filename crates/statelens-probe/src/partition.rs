//! Deterministic dataset partitioning.
//!
//! Episodes are split into train/validation/test by shuffling the index list
//! `0..n` with a PCG generator seeded only from the run seed, then slicing
//! at `floor(0.7 n)` and `floor(0.8 n)`. The shuffle depends on nothing but
//! the seed and `n`, so the same seed always yields the same partition
//! across processes and runs — the property that makes accuracy numbers
//! comparable across encoders and methods.
//!
//! Small corpora may leave a partition empty; that is not fatal here (the
//! probe trainer's contract decides what to do with an empty split), but it
//! is logged.

use rand::{SeedableRng as _, seq::SliceRandom as _};
use rand_pcg::Pcg64;

/// Fraction of episodes assigned to the training partition.
const TRAIN_FRACTION: f64 = 0.7;
/// Fraction of episodes assigned to train + validation together.
const VALIDATION_BOUNDARY: f64 = 0.8;

/// Disjoint train/validation/test index sets over `0..n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    /// Indices of the training partition, in shuffled order.
    pub train: Vec<usize>,
    /// Indices of the validation partition, in shuffled order.
    pub validation: Vec<usize>,
    /// Indices of the test partition, in shuffled order.
    pub test: Vec<usize>,
}

/// One parallel sequence partitioned by a [`SplitIndices`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split<T> {
    pub train: Vec<T>,
    pub validation: Vec<T>,
    pub test: Vec<T>,
}

impl SplitIndices {
    /// Shuffles `0..n` by `seed` and slices at 70% / 80%.
    #[expect(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    #[must_use]
    pub fn new(n: usize, seed: u64) -> Self {
        let mut indices: Vec<usize> = (0..n).collect();
        let mut rng = Pcg64::seed_from_u64(seed);
        indices.shuffle(&mut rng);

        let train_end = (TRAIN_FRACTION * n as f64) as usize;
        let validation_end = (VALIDATION_BOUNDARY * n as f64) as usize;
        let test = indices.split_off(validation_end);
        let validation = indices.split_off(train_end);

        let split = Self {
            train: indices,
            validation,
            test,
        };
        for (name, partition) in [
            ("train", &split.train),
            ("validation", &split.validation),
            ("test", &split.test),
        ] {
            if partition.is_empty() {
                log::warn!("{name} partition is empty for n = {n}");
            }
        }
        split
    }

    /// Total number of partitioned indices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.train.len() + self.validation.len() + self.test.len()
    }

    /// Whether the partition covers no indices at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Partitions an owned parallel sequence by these indices.
    ///
    /// After this, each partition exclusively owns its slice; there is no
    /// aliasing across train/validation/test.
    ///
    /// # Panics
    ///
    /// Panics if `items.len()` differs from the partitioned index count.
    #[must_use]
    pub fn apply<T>(&self, items: Vec<T>) -> Split<T> {
        assert_eq!(
            items.len(),
            self.len(),
            "partitioned sequence length must match the index count"
        );
        let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
        let mut take = |indices: &[usize]| {
            indices
                .iter()
                .map(|&i| slots[i].take().expect("split indices are disjoint"))
                .collect()
        };
        Split {
            train: take(&self.train),
            validation: take(&self.validation),
            test: take(&self.test),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn test_exact_partition_sizes_for_100() {
        let split = SplitIndices::new(100, 0);
        assert_eq!(split.train.len(), 70);
        assert_eq!(split.validation.len(), 10);
        assert_eq!(split.test.len(), 20);
    }

    #[test]
    fn test_exact_partition_sizes_for_7() {
        // floor(4.9) = 4, floor(5.6) - 4 = 1, remainder 2
        let split = SplitIndices::new(7, 0);
        assert_eq!(split.train.len(), 4);
        assert_eq!(split.validation.len(), 1);
        assert_eq!(split.test.len(), 2);
    }

    #[test]
    fn test_same_seed_gives_identical_partition() {
        for seed in [0, 1, 17, u64::MAX] {
            assert_eq!(SplitIndices::new(53, seed), SplitIndices::new(53, seed));
        }
    }

    #[test]
    fn test_different_seeds_give_different_shuffles() {
        assert_ne!(SplitIndices::new(100, 0), SplitIndices::new(100, 1));
    }

    #[test]
    fn test_partitions_are_disjoint_and_exhaustive() {
        let split = SplitIndices::new(41, 9);
        let all: Vec<usize> = split
            .train
            .iter()
            .chain(&split.validation)
            .chain(&split.test)
            .copied()
            .collect();
        let unique: BTreeSet<usize> = all.iter().copied().collect();
        assert_eq!(all.len(), 41);
        assert_eq!(unique, (0..41).collect());
    }

    #[test]
    fn test_small_n_leaves_empty_partitions_without_error() {
        let split = SplitIndices::new(1, 0);
        assert_eq!(split.train.len(), 0);
        assert_eq!(split.validation.len(), 0);
        assert_eq!(split.test.len(), 1);
    }

    #[test]
    fn test_apply_reorders_items_by_partition() {
        let split = SplitIndices::new(10, 3);
        let items: Vec<usize> = (0..10).collect();
        let parts = split.apply(items);
        assert_eq!(parts.train, split.train);
        assert_eq!(parts.validation, split.validation);
        assert_eq!(parts.test, split.test);
    }

    #[test]
    #[should_panic(expected = "length must match")]
    fn test_apply_rejects_mismatched_length() {
        let split = SplitIndices::new(10, 3);
        let _ = split.apply(vec![0; 9]);
    }
}
