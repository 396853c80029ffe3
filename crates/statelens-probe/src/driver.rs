//! Probe evaluation driver.
//!
//! [`ProbeDriver`] runs the full evaluation cycle for each seed in a
//! configured range — acquire, length-filter, entropy-filter, split, then
//! either the majority baseline or an external probe trainer — and
//! aggregates the per-seed results into mean and variance per metric.
//!
//! Each seed is a fully independent draw: a fresh acquisition, a fresh
//! shuffle, and a fresh probe training. That is deliberate; the variance
//! across individual seeds is part of what gets reported. Seeds execute
//! strictly sequentially, so only one seed's episode set is resident at a
//! time, and a failure in any seed aborts the sweep rather than skipping.

use std::collections::BTreeMap;

use rand::SeedableRng as _;
use rand_pcg::Pcg64;
use serde::Serialize;
use statelens_env::{Episode, EpisodeLabels, LabelFrame};
use statelens_stats::aggregate::MetricAccumulator;

use crate::{
    baseline::majority_baseline,
    error::PipelineError,
    filter::{DEFAULT_ENTROPY_THRESHOLD, EntropyFilter},
    partition::SplitIndices,
    sink::TrackingSink,
    source::{EpisodeSource, SourceBatch},
    trainer::ProbeTrainerFactory,
};

/// A metric map produced by one seed's evaluation.
pub type RunResult = BTreeMap<String, f64>;

/// How probe accuracy is obtained for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::IsVariant)]
pub enum EvalMethod {
    /// Majority-class baseline; no probe is trained.
    #[display("majority")]
    Majority,
    /// Probe trained on frozen encoder features.
    #[display("learned-probe")]
    LearnedProbe,
    /// Probe trained directly on flattened raw pixels, no encoder.
    #[display("flat-pixels")]
    FlatPixels,
    /// Probe trained on pre-encoded archival representations.
    #[display("precomputed-representation")]
    PrecomputedRepresentation,
}

/// Error for an unrecognized evaluation method name.
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display(
    "unknown evaluation method '{name}', expected one of: majority, learned-probe, \
     flat-pixels, precomputed-representation"
)]
pub struct ParseEvalMethodError {
    name: String,
}

impl std::str::FromStr for EvalMethod {
    type Err = ParseEvalMethodError;

    /// Parses the same names [`Display`](std::fmt::Display) emits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "majority" => Ok(Self::Majority),
            "learned-probe" => Ok(Self::LearnedProbe),
            "flat-pixels" => Ok(Self::FlatPixels),
            "precomputed-representation" => Ok(Self::PrecomputedRepresentation),
            _ => Err(ParseEvalMethodError { name: s.to_owned() }),
        }
    }
}

/// Options of a probing sweep.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Evaluation method.
    pub method: EvalMethod,
    /// Entropy filter threshold in nats.
    pub entropy_threshold: f64,
    /// Probe training batch size; episodes no longer than this are
    /// discarded before filtering.
    pub batch_size: usize,
    /// Number of seeds in the sweep.
    pub num_runs: usize,
    /// First seed; the sweep covers `base_seed .. base_seed + num_runs`.
    pub base_seed: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            method: EvalMethod::Majority,
            entropy_threshold: DEFAULT_ENTROPY_THRESHOLD,
            batch_size: 64,
            num_runs: 1,
            base_seed: 0,
        }
    }
}

impl ProbeConfig {
    /// Checks the configuration against a source's collection mode.
    ///
    /// Invalid combinations fail fast with a descriptive error; nothing is
    /// silently defaulted.
    pub fn validate(&self, mode: crate::source::CollectMode) -> Result<(), PipelineError> {
        if self.num_runs == 0 {
            return Err(PipelineError::configuration("num_runs must be at least 1"));
        }
        if !self.entropy_threshold.is_finite() || self.entropy_threshold < 0.0 {
            return Err(PipelineError::configuration(format!(
                "entropy threshold must be a non-negative finite number, got {}",
                self.entropy_threshold
            )));
        }
        if self.method.is_precomputed_representation() && !mode.is_archival() {
            return Err(PipelineError::configuration(
                "method 'precomputed-representation' requires the archival collection mode",
            ));
        }
        Ok(())
    }
}

/// Aggregated outcome of a sweep.
#[derive(Debug, Clone, Serialize)]
pub struct SweepSummary {
    /// Every seed's run result, in seed order.
    pub runs: Vec<RunResult>,
    /// Per-metric means across runs, keyed `mean_<metric>`.
    pub mean: RunResult,
    /// Per-metric population variances across runs, keyed `var_<metric>`.
    pub variance: RunResult,
}

/// Orchestrates probing runs across a seed range.
pub struct ProbeDriver<'a> {
    config: ProbeConfig,
    sink: &'a mut dyn TrackingSink,
    step: u64,
}

impl<'a> ProbeDriver<'a> {
    /// Creates a driver reporting through `sink`.
    pub fn new(config: ProbeConfig, sink: &'a mut dyn TrackingSink) -> Self {
        Self {
            config,
            sink,
            step: 0,
        }
    }

    fn log(&mut self, metrics: &RunResult) {
        self.sink.log(metrics, self.step);
        self.step += 1;
    }

    /// Runs the configured number of seeds and aggregates their results.
    ///
    /// `factory` must be provided for every method except the majority
    /// baseline. Any seed failure aborts the sweep; the summary only ever
    /// reflects a complete seed set.
    pub fn run_sweep(
        &mut self,
        source: &mut EpisodeSource<'_>,
        factory: Option<&dyn ProbeTrainerFactory>,
    ) -> Result<SweepSummary, PipelineError> {
        self.config.validate(source.mode())?;
        if !self.config.method.is_majority() && factory.is_none() {
            return Err(PipelineError::configuration(format!(
                "method '{}' requires an external probe trainer",
                self.config.method
            )));
        }
        source.set_use_representations(self.config.method.is_precomputed_representation());

        let mut accumulator = MetricAccumulator::new();
        let mut runs = Vec::with_capacity(self.config.num_runs);
        for i in 0..self.config.num_runs {
            let seed = self.config.base_seed + i as u64;
            log::info!("run {}/{} (seed {seed})", i + 1, self.config.num_runs);
            let result = self.run_seed(seed, source, factory)?;
            accumulator.record_run(&result);
            runs.push(result);
        }

        let mean: RunResult = prefixed("mean_", &accumulator.means());
        let variance: RunResult = prefixed("var_", &accumulator.variances());
        self.log(&mean);
        self.log(&variance);
        Ok(SweepSummary {
            runs,
            mean,
            variance,
        })
    }

    /// Runs the full pipeline for one seed.
    fn run_seed(
        &mut self,
        seed: u64,
        source: &mut EpisodeSource<'_>,
        factory: Option<&dyn ProbeTrainerFactory>,
    ) -> Result<RunResult, PipelineError> {
        let mut rng = Pcg64::seed_from_u64(seed);
        let batch = source.acquire(&mut rng)?;
        if batch.episodes.is_empty() {
            return Err(PipelineError::empty_source("collection"));
        }

        let (episodes, labels, rewards) = self.length_filter(batch)?;
        let outcome = EntropyFilter::new(self.config.entropy_threshold).apply(&labels);
        let labels = outcome.labels;

        // Representative label frame and flat feature size, taken before the
        // split so they do not depend on which episodes land in train.
        let sample_label = labels.iter().flatten().next().cloned();
        let feature_size = self
            .config
            .method
            .is_flat_pixels()
            .then(|| episodes[0].feature_size());

        let split = SplitIndices::new(episodes.len(), seed);
        let episodes = split.apply(episodes);
        let labels = split.apply(labels);
        if let Some(rewards) = rewards {
            let rewards = split.apply(rewards);
            self.report_test_rewards(&rewards.test);
        }

        let result = if self.config.method.is_majority() {
            majority_baseline(&labels.train, &labels.test)
        } else {
            let factory = factory.ok_or_else(|| {
                PipelineError::configuration("probe trainer factory missing for learned method")
            })?;
            let sample_label = sample_label.unwrap_or_else(LabelFrame::new);
            let mut trainer = factory.create(&sample_label, feature_size);
            trainer.train(
                &episodes.train,
                &episodes.validation,
                &labels.train,
                &labels.validation,
            )?;
            let (loss, accuracies) = trainer.evaluate(&episodes.test, &labels.test)?;
            log::debug!("seed {seed}: test loss {loss:.4}");
            accuracies
        };

        self.log(&result);
        Ok(result)
    }

    /// Discards episodes no longer than the probe batch size.
    #[expect(clippy::type_complexity)]
    fn length_filter(
        &self,
        batch: SourceBatch,
    ) -> Result<(Vec<Episode>, Vec<EpisodeLabels>, Option<Vec<f32>>), PipelineError> {
        let SourceBatch {
            episodes,
            labels,
            episode_rewards,
        } = batch;
        let keep: Vec<bool> = episodes
            .iter()
            .map(|e| e.len() > self.config.batch_size)
            .collect();

        let episodes = retain_kept(episodes, &keep);
        if episodes.is_empty() {
            return Err(PipelineError::empty_source("length filtering"));
        }
        let labels = retain_kept(labels, &keep);
        let episode_rewards = episode_rewards.map(|r| retain_kept(r, &keep));
        Ok((episodes, labels, episode_rewards))
    }

    #[expect(clippy::cast_precision_loss)]
    fn report_test_rewards(&mut self, test_rewards: &[f32]) {
        if test_rewards.is_empty() {
            return;
        }
        let mean =
            f64::from(test_rewards.iter().sum::<f32>()) / test_rewards.len() as f64;
        self.log(&RunResult::from([(
            "test_mean_reward_per_episode".to_owned(),
            mean,
        )]));
    }
}

fn retain_kept<T>(items: Vec<T>, keep: &[bool]) -> Vec<T> {
    std::iter::zip(items, keep)
        .filter_map(|(item, &k)| k.then_some(item))
        .collect()
}

fn prefixed(prefix: &str, metrics: &RunResult) -> RunResult {
    metrics
        .iter()
        .map(|(key, value)| (format!("{prefix}{key}"), *value))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use statelens_env::{
        ArchivalQuery, ArchiveRecord, EpisodeArchive, archive::ArchivedTensor,
        scripted::ScriptedEnv,
    };

    use super::*;
    use crate::{
        error::ProbeError,
        sink::{CaptureSink, NullSink},
        trainer::ProbeTrainer,
    };

    #[test]
    fn test_method_names_round_trip_through_parsing() {
        for method in [
            EvalMethod::Majority,
            EvalMethod::LearnedProbe,
            EvalMethod::FlatPixels,
            EvalMethod::PrecomputedRepresentation,
        ] {
            let parsed: EvalMethod = method
                .to_string()
                .parse()
                .unwrap_or_else(|err| panic!("'{method}' must parse back: {err}"));
            assert_eq!(parsed, method);
        }
        assert!("encoder".parse::<EvalMethod>().is_err());
    }

    fn majority_config() -> ProbeConfig {
        ProbeConfig {
            method: EvalMethod::Majority,
            entropy_threshold: DEFAULT_ENTROPY_THRESHOLD,
            batch_size: 3,
            num_runs: 2,
            base_seed: 0,
        }
    }

    fn run_majority_sweep() -> (SweepSummary, CaptureSink) {
        let mut env = ScriptedEnv::new(2, 8, 6, 5);
        let mut source = EpisodeSource::RandomAgent {
            env: &mut env,
            total_steps: 200,
        };
        let mut sink = CaptureSink::new();
        let mut driver = ProbeDriver::new(majority_config(), &mut sink);
        let summary = driver.run_sweep(&mut source, None).unwrap();
        (summary, sink)
    }

    #[test]
    fn test_majority_sweep_reports_position_label() {
        let (summary, sink) = run_majority_sweep();

        assert_eq!(summary.runs.len(), 2);
        for run in &summary.runs {
            assert!(run.contains_key("test_agent_x"));
            assert!(run.contains_key("test_mean_acc"));
        }
        assert!(summary.mean.contains_key("mean_test_agent_x"));
        assert!(summary.variance.contains_key("var_test_mean_acc"));
        // Two per-run logs plus the mean and variance maps
        assert_eq!(sink.records.len(), 4);
    }

    #[test]
    fn test_sweep_is_reproducible() {
        let (a, _) = run_majority_sweep();
        let (b, _) = run_majority_sweep();
        assert_eq!(a.runs, b.runs);
        assert_eq!(a.mean, b.mean);
        assert_eq!(a.variance, b.variance);
    }

    #[test]
    fn test_step_counter_is_monotonic() {
        let (_, sink) = run_majority_sweep();
        let steps: Vec<u64> = sink.records.iter().map(|(s, _)| *s).collect();
        assert!(steps.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_zero_runs_is_a_configuration_error() {
        let mut env = ScriptedEnv::new(1, 8, 6, 5);
        let mut source = EpisodeSource::RandomAgent {
            env: &mut env,
            total_steps: 50,
        };
        let mut sink = NullSink;
        let config = ProbeConfig {
            num_runs: 0,
            ..majority_config()
        };
        let err = ProbeDriver::new(config, &mut sink)
            .run_sweep(&mut source, None)
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_precomputed_representation_requires_archival_source() {
        let mut env = ScriptedEnv::new(1, 8, 6, 5);
        let mut source = EpisodeSource::RandomAgent {
            env: &mut env,
            total_steps: 50,
        };
        let mut sink = NullSink;
        let config = ProbeConfig {
            method: EvalMethod::PrecomputedRepresentation,
            ..majority_config()
        };
        let err = ProbeDriver::new(config, &mut sink)
            .run_sweep(&mut source, Some(&StubFactory::default()))
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_learned_method_without_trainer_fails_fast() {
        let mut env = ScriptedEnv::new(1, 8, 6, 5);
        let mut source = EpisodeSource::RandomAgent {
            env: &mut env,
            total_steps: 50,
        };
        let mut sink = NullSink;
        let config = ProbeConfig {
            method: EvalMethod::FlatPixels,
            ..majority_config()
        };
        let err = ProbeDriver::new(config, &mut sink)
            .run_sweep(&mut source, None)
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_all_episodes_too_short_is_empty_source() {
        let mut env = ScriptedEnv::new(1, 8, 6, 5);
        let mut source = EpisodeSource::RandomAgent {
            env: &mut env,
            total_steps: 50,
        };
        let mut sink = NullSink;
        let config = ProbeConfig {
            batch_size: 100,
            ..majority_config()
        };
        let err = ProbeDriver::new(config, &mut sink)
            .run_sweep(&mut source, None)
            .unwrap_err();
        assert!(matches!(err, PipelineError::EmptySource { ref stage } if stage == "length filtering"));
    }

    #[test]
    fn test_empty_archive_is_empty_source() {
        let archive = EpisodeArchive {
            env_name: "track".to_owned(),
            num_frame_stack: 1,
            downsampled: false,
            records: vec![],
        };
        let mut source = EpisodeSource::Archival {
            store: &archive,
            query: ArchivalQuery {
                env_name: "track".to_owned(),
                num_frame_stack: 1,
                downsample: false,
                algos: vec![],
                tags: vec![],
                use_representations: false,
            },
        };
        let mut sink = NullSink;
        let err = ProbeDriver::new(majority_config(), &mut sink)
            .run_sweep(&mut source, None)
            .unwrap_err();
        assert!(matches!(err, PipelineError::EmptySource { ref stage } if stage == "collection"));
    }

    #[derive(Debug, Default)]
    struct StubFactory {
        feature_sizes: RefCell<Vec<Option<usize>>>,
    }

    struct StubTrainer {
        trained: bool,
    }

    impl ProbeTrainerFactory for StubFactory {
        fn create(
            &self,
            _sample_label: &LabelFrame,
            feature_size: Option<usize>,
        ) -> Box<dyn ProbeTrainer> {
            self.feature_sizes.borrow_mut().push(feature_size);
            Box::new(StubTrainer { trained: false })
        }
    }

    impl ProbeTrainer for StubTrainer {
        fn train(
            &mut self,
            _train_eps: &[Episode],
            _val_eps: &[Episode],
            _train_labels: &[EpisodeLabels],
            _val_labels: &[EpisodeLabels],
        ) -> Result<(), ProbeError> {
            self.trained = true;
            Ok(())
        }

        fn evaluate(
            &mut self,
            _test_eps: &[Episode],
            _test_labels: &[EpisodeLabels],
        ) -> Result<(f64, RunResult), ProbeError> {
            assert!(self.trained, "evaluate must come after train");
            Ok((0.1, RunResult::from([("test_agent_x".to_owned(), 0.9)])))
        }
    }

    #[test]
    fn test_flat_pixels_passes_feature_size_to_factory() {
        let mut env = ScriptedEnv::new(2, 8, 6, 5);
        let mut source = EpisodeSource::RandomAgent {
            env: &mut env,
            total_steps: 200,
        };
        let mut sink = CaptureSink::new();
        let config = ProbeConfig {
            method: EvalMethod::FlatPixels,
            ..majority_config()
        };
        let factory = StubFactory::default();
        let summary = ProbeDriver::new(config, &mut sink)
            .run_sweep(&mut source, Some(&factory))
            .unwrap();

        // One trainer per seed, each seeing the flattened frame size
        assert_eq!(*factory.feature_sizes.borrow(), vec![Some(48), Some(48)]);
        assert!((summary.mean["mean_test_agent_x"] - 0.9).abs() < 1e-12);
        assert!((summary.variance["var_test_agent_x"] - 0.0).abs() < 1e-12);
    }

    #[test]
    fn test_precomputed_representation_sweep_on_archive() {
        let labels = vec![
            LabelFrame::from([("agent_x".to_owned(), 0), ("noise".to_owned(), 0)]),
            LabelFrame::from([("agent_x".to_owned(), 1), ("noise".to_owned(), 1)]),
        ];
        let records = (0..10)
            .map(|i| ArchiveRecord {
                algo: "dqn".to_owned(),
                tags: vec![],
                reward: i as f32,
                frames: None,
                representations: Some(ArchivedTensor {
                    dims: vec![2, 4],
                    data: vec![0.0; 8],
                }),
                labels: labels.clone(),
            })
            .collect();
        let archive = EpisodeArchive {
            env_name: "track".to_owned(),
            num_frame_stack: 1,
            downsampled: false,
            records,
        };
        let mut source = EpisodeSource::Archival {
            store: &archive,
            query: ArchivalQuery {
                env_name: "track".to_owned(),
                num_frame_stack: 1,
                downsample: false,
                algos: vec![],
                tags: vec![],
                use_representations: false,
            },
        };
        let mut sink = CaptureSink::new();
        let config = ProbeConfig {
            method: EvalMethod::PrecomputedRepresentation,
            batch_size: 1,
            num_runs: 1,
            ..majority_config()
        };
        let factory = StubFactory::default();
        let summary = ProbeDriver::new(config, &mut sink)
            .run_sweep(&mut source, Some(&factory))
            .unwrap();

        // Representations skip the flat-pixels feature size
        assert_eq!(*factory.feature_sizes.borrow(), vec![None]);
        assert!(summary.mean.contains_key("mean_test_agent_x"));
        // Test-split mean reward was reported through the sink
        assert!(
            sink.metrics()
                .iter()
                .any(|m| m.contains_key("test_mean_reward_per_episode"))
        );
    }
}
