//! Pooled occurrence counts for a single categorical label key.
//!
//! The probing protocol treats every label as a categorical variable. This
//! module provides the count table the entropy filter and majority baseline
//! share: record every observed value, then ask for the distribution's
//! Shannon entropy or its most frequent value.
//!
//! Counts are kept in a [`BTreeMap`] so that every derived quantity is
//! deterministic: iteration is in ascending value order, which fixes the
//! majority tie-break to the lowest value.

use std::collections::BTreeMap;

/// Occurrence counts over the observed values of one categorical label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueCounts {
    counts: BTreeMap<i64, usize>,
    total: usize,
}

impl ValueCounts {
    /// Creates an empty count table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one observation of `value`.
    pub fn record(&mut self, value: i64) {
        *self.counts.entry(value).or_insert(0) += 1;
        self.total += 1;
    }

    /// Total number of recorded observations.
    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Number of distinct observed values.
    #[must_use]
    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    /// Iterates over `(value, count)` pairs in ascending value order.
    pub fn iter(&self) -> impl Iterator<Item = (i64, usize)> + '_ {
        self.counts.iter().map(|(v, c)| (*v, *c))
    }

    /// Shannon entropy of the empirical distribution, in nats.
    ///
    /// Returns 0.0 for an empty table and for a point mass.
    ///
    /// # Examples
    ///
    /// ```
    /// use statelens_stats::categorical::ValueCounts;
    ///
    /// let mut counts = ValueCounts::new();
    /// for _ in 0..990 {
    ///     counts.record(1);
    /// }
    /// for _ in 0..10 {
    ///     counts.record(0);
    /// }
    /// // Heavily skewed: about 0.056 nats
    /// assert!(counts.entropy_nats() < 0.06);
    /// ```
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn entropy_nats(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let n = self.total as f64;
        -self
            .counts
            .values()
            .map(|&c| {
                let p = c as f64 / n;
                p * p.ln()
            })
            .sum::<f64>()
    }

    /// The most frequent value, or `None` if no observations were recorded.
    ///
    /// Ties are broken toward the lowest value, which makes the result
    /// deterministic across runs and processes.
    #[must_use]
    pub fn majority_value(&self) -> Option<i64> {
        let mut best: Option<(i64, usize)> = None;
        for (&value, &count) in &self.counts {
            match best {
                // Strict comparison keeps the lowest value among ties,
                // since iteration is in ascending value order.
                Some((_, best_count)) if count <= best_count => {}
                _ => best = Some((value, count)),
            }
        }
        best.map(|(value, _)| value)
    }
}

impl FromIterator<i64> for ValueCounts {
    fn from_iter<I: IntoIterator<Item = i64>>(iter: I) -> Self {
        let mut counts = Self::new();
        for value in iter {
            counts.record(value);
        }
        counts
    }
}
