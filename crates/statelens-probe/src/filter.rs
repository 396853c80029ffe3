//! Label entropy filtering.
//!
//! A label whose empirical distribution is almost a point mass is trivially
//! predictable: a probe scoring 99% on it carries no information about the
//! encoder. To avoid reporting such misleading accuracies, every label key
//! whose pooled Shannon entropy falls strictly below a threshold is dropped
//! from the corpus — globally, from every label frame, never per frame.
//!
//! The decision pools value counts across every frame of every episode
//! *before* any split, so whether a key survives is independent of any later
//! seed-dependent shuffling. The filter is a pure transformation: the input
//! corpus is left untouched and a reduced copy is returned, which also makes
//! it trivially idempotent.

use std::collections::BTreeMap;

use statelens_env::EpisodeLabels;
use statelens_stats::categorical::ValueCounts;

/// Default entropy threshold, in nats.
pub const DEFAULT_ENTROPY_THRESHOLD: f64 = 0.3;

/// Drops label keys with near-constant pooled distributions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntropyFilter {
    threshold: f64,
}

impl Default for EntropyFilter {
    fn default() -> Self {
        Self::new(DEFAULT_ENTROPY_THRESHOLD)
    }
}

/// The result of one filter application.
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    /// The corpus with dropped keys removed from every label frame.
    pub labels: Vec<EpisodeLabels>,
    /// Keys that were dropped, in ascending order.
    pub dropped: Vec<String>,
}

impl EntropyFilter {
    /// Creates a filter with the given threshold in nats.
    #[must_use]
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// The filter's threshold in nats.
    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Pools per-key value counts over every frame of every episode.
    #[must_use]
    pub fn pooled_counts(corpus: &[EpisodeLabels]) -> BTreeMap<String, ValueCounts> {
        let mut counts: BTreeMap<String, ValueCounts> = BTreeMap::new();
        for episode in corpus {
            for frame in episode {
                for (key, value) in frame {
                    counts.entry(key.clone()).or_default().record(*value);
                }
            }
        }
        counts
    }

    /// Returns a copy of the corpus with every low-entropy key removed.
    ///
    /// Keys with pooled entropy `>= threshold` are always kept; a point-mass
    /// key (entropy 0) is always dropped for any positive threshold. Dropped
    /// keys are logged.
    #[must_use]
    pub fn apply(&self, corpus: &[EpisodeLabels]) -> FilterOutcome {
        let counts = Self::pooled_counts(corpus);
        let dropped: Vec<String> = counts
            .iter()
            .filter(|(_, c)| c.entropy_nats() < self.threshold)
            .map(|(key, _)| key.clone())
            .collect();

        for key in &dropped {
            log::warn!(
                "dropping label '{key}': pooled entropy {:.4} nats over {} distinct values \
                 is below threshold {:.4}",
                counts[key].entropy_nats(),
                counts[key].distinct(),
                self.threshold,
            );
        }

        let labels = corpus
            .iter()
            .map(|episode| {
                episode
                    .iter()
                    .map(|frame| {
                        frame
                            .iter()
                            .filter(|(key, _)| !dropped.contains(key))
                            .map(|(key, value)| (key.clone(), *value))
                            .collect()
                    })
                    .collect()
            })
            .collect();

        FilterOutcome { labels, dropped }
    }
}
