//! External probe trainer contract.
//!
//! The supervised probe itself — a small classifier trained on frozen
//! encoder features — lives outside this crate. The pipeline only needs two
//! operations from it: fit on the train/validation partitions, then score
//! the test partition per label. Trainers are built per seed through a
//! factory, which receives the run's sample label frame (defining the label
//! keys and their arity source) and, when the probe operates directly on
//! flattened raw pixels, the fixed input feature size.

use statelens_env::{Episode, EpisodeLabels, LabelFrame};

use crate::{driver::RunResult, error::ProbeError};

/// A supervised probe being trained and evaluated on frozen features.
pub trait ProbeTrainer {
    /// Fits the probe on the train partition, using the validation
    /// partition for early stopping.
    fn train(
        &mut self,
        train_eps: &[Episode],
        val_eps: &[Episode],
        train_labels: &[EpisodeLabels],
        val_labels: &[EpisodeLabels],
    ) -> Result<(), ProbeError>;

    /// Scores the test partition.
    ///
    /// Returns the test loss and the per-label test accuracies, keyed
    /// `test_<label>` (conventionally including `test_mean_acc`).
    fn evaluate(
        &mut self,
        test_eps: &[Episode],
        test_labels: &[EpisodeLabels],
    ) -> Result<(f64, RunResult), ProbeError>;
}

/// Builds one fresh [`ProbeTrainer`] per seed.
pub trait ProbeTrainerFactory {
    /// Creates a trainer for one run.
    ///
    /// `sample_label` is a representative label frame from the corpus;
    /// `feature_size` is set when the probe consumes flattened raw pixels
    /// with no encoder in front.
    fn create(&self, sample_label: &LabelFrame, feature_size: Option<usize>)
    -> Box<dyn ProbeTrainer>;
}
