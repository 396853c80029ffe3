//! Cross-run metric accumulation.
//!
//! A probing sweep repeats the full evaluation cycle once per seed, and each
//! seed yields a map from metric name to scalar. The accumulator collects
//! those maps into parallel per-key lists and summarizes each key as its
//! mean and population variance across runs.
//!
//! Runs are allowed to report different key sets; a key absent from one run
//! simply contributes no entry for that run. In practice the entropy filter
//! decides over the full pre-split corpus, so the key set is the same for
//! every seed, but the accumulator does not rely on that.

use std::collections::BTreeMap;

/// Accumulates per-run metric maps and summarizes them across runs.
#[derive(Debug, Clone, Default)]
pub struct MetricAccumulator {
    series: BTreeMap<String, Vec<f64>>,
}

impl MetricAccumulator {
    /// Creates an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one observation of `key`.
    pub fn record(&mut self, key: &str, value: f64) {
        self.series.entry(key.to_owned()).or_default().push(value);
    }

    /// Appends every entry of one run's metric map.
    pub fn record_run(&mut self, metrics: &BTreeMap<String, f64>) {
        for (key, value) in metrics {
            self.record(key, *value);
        }
    }

    /// Number of observations recorded for `key`.
    #[must_use]
    pub fn count(&self, key: &str) -> usize {
        self.series.get(key).map_or(0, Vec::len)
    }

    /// Mean of the recorded observations for `key`, if any.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn mean(&self, key: &str) -> Option<f64> {
        let values = self.series.get(key)?;
        if values.is_empty() {
            return None;
        }
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }

    /// Population variance of the recorded observations for `key`, if any.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn variance(&self, key: &str) -> Option<f64> {
        let values = self.series.get(key)?;
        if values.is_empty() {
            return None;
        }
        let mean = self.mean(key)?;
        Some(values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64)
    }

    /// Per-key means over every recorded key.
    #[must_use]
    pub fn means(&self) -> BTreeMap<String, f64> {
        self.summary(Self::mean)
    }

    /// Per-key population variances over every recorded key.
    #[must_use]
    pub fn variances(&self) -> BTreeMap<String, f64> {
        self.summary(Self::variance)
    }

    fn summary(&self, stat: impl Fn(&Self, &str) -> Option<f64>) -> BTreeMap<String, f64> {
        self.series
            .keys()
            .filter_map(|key| stat(self, key).map(|v| (key.clone(), v)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_owned(), *v))
            .collect()
    }

    #[test]
    fn test_mean_and_variance_over_two_runs() {
        let mut acc = MetricAccumulator::new();
        acc.record_run(&run(&[("test_a", 0.5)]));
        acc.record_run(&run(&[("test_a", 0.7)]));

        assert!((acc.mean("test_a").unwrap() - 0.6).abs() < 1e-12);
        assert!((acc.variance("test_a").unwrap() - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_missing_key_yields_none() {
        let acc = MetricAccumulator::new();
        assert_eq!(acc.mean("absent"), None);
        assert_eq!(acc.variance("absent"), None);
        assert_eq!(acc.count("absent"), 0);
    }

    #[test]
    fn test_tolerates_differing_key_sets() {
        let mut acc = MetricAccumulator::new();
        acc.record_run(&run(&[("test_a", 1.0), ("test_b", 0.0)]));
        acc.record_run(&run(&[("test_a", 0.0)]));

        assert_eq!(acc.count("test_a"), 2);
        assert_eq!(acc.count("test_b"), 1);
        assert!((acc.mean("test_a").unwrap() - 0.5).abs() < 1e-12);
        assert!((acc.mean("test_b").unwrap() - 0.0).abs() < 1e-12);
    }

    #[test]
    fn test_single_observation_has_zero_variance() {
        let mut acc = MetricAccumulator::new();
        acc.record("test_a", 0.3);
        assert_eq!(acc.variance("test_a"), Some(0.0));
    }

    #[test]
    fn test_summary_maps_cover_all_keys() {
        let mut acc = MetricAccumulator::new();
        acc.record_run(&run(&[("test_a", 0.5), ("test_mean_acc", 0.5)]));
        acc.record_run(&run(&[("test_a", 0.7), ("test_mean_acc", 0.7)]));

        let means = acc.means();
        assert_eq!(means.len(), 2);
        assert!((means["test_a"] - 0.6).abs() < 1e-12);

        let variances = acc.variances();
        assert_eq!(variances.len(), 2);
        assert!((variances["test_mean_acc"] - 0.01).abs() < 1e-12);
    }
}
