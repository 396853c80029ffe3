//! Majority-class baseline.
//!
//! For each label key, predict the value most frequent in the training
//! partition and score that constant prediction on the test partition. The
//! result is a trivial lower bound that calibrates probe accuracies against
//! chance/majority performance, independent of any learned model.
//!
//! Ties in the training counts break deterministically toward the lowest
//! value (see [`statelens_stats::categorical::ValueCounts::majority_value`]).

use statelens_env::EpisodeLabels;

use crate::{driver::RunResult, filter::EntropyFilter};

/// Evaluates the majority baseline for every label key.
///
/// Returns `test_<key>` accuracy per key plus the unweighted mean across
/// keys as `test_mean_acc`. A key never matched on the test partition
/// reports 0.0 and still participates in the mean.
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn majority_baseline(
    train_labels: &[EpisodeLabels],
    test_labels: &[EpisodeLabels],
) -> RunResult {
    let train_counts = EntropyFilter::pooled_counts(train_labels);
    let test_frames: Vec<_> = test_labels.iter().flatten().collect();
    if test_frames.is_empty() {
        log::warn!("majority baseline evaluated on an empty test partition");
    }

    let mut result = RunResult::new();
    let mut accuracy_sum = 0.0;
    let mut key_count = 0usize;
    for (key, counts) in &train_counts {
        let Some(majority) = counts.majority_value() else {
            continue;
        };
        let matches = test_frames
            .iter()
            .filter(|frame| frame.get(key) == Some(&majority))
            .count();
        let accuracy = if test_frames.is_empty() {
            0.0
        } else {
            matches as f64 / test_frames.len() as f64
        };
        accuracy_sum += accuracy;
        key_count += 1;
        result.insert(format!("test_{key}"), accuracy);
    }

    if key_count > 0 {
        result.insert("test_mean_acc".to_owned(), accuracy_sum / key_count as f64);
    }
    result
}
