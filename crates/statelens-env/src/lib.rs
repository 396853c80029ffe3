//! Episode acquisition layer for the statelens probing pipeline.
//!
//! This crate owns the raw material of a probing run: episodes of frames and
//! their per-frame label dictionaries, plus the two ways of obtaining them:
//!
//! - **Live rollout** ([`collect::collect_random_agent`]): drive a batch of
//!   environment instances with uniformly random actions for a fixed step
//!   budget, cutting episodes at `done` boundaries
//! - **Archival loading** ([`archive`]): pre-recorded episodes (raw frames or
//!   pre-encoded representations) filtered by algorithm and tag metadata
//!
//! Environments are consumed through the [`EnvironmentBatch`] trait, which
//! mirrors a vectorized environment: one blocking `step` call advances all
//! instances in lockstep. A deterministic [`scripted::ScriptedEnv`]
//! implementation is included for tests and offline data generation.

pub use self::{
    archive::{ArchivalEpisode, ArchivalQuery, ArchivalStore, ArchiveRecord, EpisodeArchive},
    collect::{Rollout, collect_random_agent},
    environment::{ActionSpace, EnvironmentBatch, StepBatch, StepInfo},
    episode::{Episode, EpisodeLabels, EpisodeShapeError, Frame, LabelFrame},
};

pub mod archive;
pub mod collect;
pub mod environment;
pub mod episode;
pub mod scripted;

/// Errors raised while collecting episodes from a live environment batch.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum CollectError {
    /// The environment's action space cannot be sampled categorically.
    #[display("unsupported action space {space}: need a discrete space with at least two actions")]
    UnsupportedActionSpace { space: String },
    /// An instance produced frames of inconsistent shape within one episode.
    #[display("inconsistent frames in collected episode: {_0}")]
    Shape(EpisodeShapeError),
}
