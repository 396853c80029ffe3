//! The statelens probing evaluation pipeline.
//!
//! This crate turns a stream of raw game episodes into a reproducible
//! accuracy report per game-state label, without ever touching the encoder
//! under evaluation. The pipeline per seed:
//!
//! 1. **Acquire** episodes and labels from an [`source::EpisodeSource`]
//!    (live random-agent rollout or archival store)
//! 2. **Filter** labels whose pooled distribution is too skewed to be
//!    informative ([`filter::EntropyFilter`])
//! 3. **Partition** episodes into train/validation/test deterministically by
//!    seed ([`partition::SplitIndices`])
//! 4. **Evaluate**: either the majority-class baseline
//!    ([`baseline::majority_baseline`]) or an external probe trainer through
//!    the [`trainer::ProbeTrainer`] contract
//!
//! [`driver::ProbeDriver`] orchestrates the cycle across a seed range and
//! summarizes per-seed results as mean and variance per metric. All metric
//! reporting flows through an injected [`sink::TrackingSink`], never through
//! global state.
//!
//! # Reproducibility
//!
//! The partition shuffle depends only on the seed and the episode count, and
//! the entropy filter decides over the full pre-split corpus, so two runs
//! with the same seed see the same split and the same label set. Seeds run
//! strictly sequentially; a failure in any seed aborts the whole sweep so
//! that aggregate statistics only ever reflect complete seed sets.

pub use self::{
    driver::{EvalMethod, ParseEvalMethodError, ProbeConfig, ProbeDriver, RunResult, SweepSummary},
    error::{PipelineError, ProbeError},
    filter::{EntropyFilter, FilterOutcome},
    partition::{Split, SplitIndices},
    sink::{CaptureSink, JsonlSink, NullSink, TrackingSink},
    source::{CollectMode, EpisodeSource, SourceBatch},
    trainer::{ProbeTrainer, ProbeTrainerFactory},
};

pub mod baseline;
pub mod driver;
pub mod error;
pub mod filter;
pub mod partition;
pub mod sink;
pub mod source;
pub mod trainer;
