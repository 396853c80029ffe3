//! Episode sources: one interface over both acquisition modes.
//!
//! The pipeline does not care whether episodes come from a live rollout or
//! from an archive; it asks an [`EpisodeSource`] for a [`SourceBatch`] and
//! proceeds identically from there. The source is a closed enum rather than
//! a trait so that every collection mode is handled exhaustively.

use rand::Rng;
use statelens_env::{
    ArchivalQuery, ArchivalStore, EnvironmentBatch, Episode, EpisodeLabels, collect_random_agent,
};

use crate::error::PipelineError;

/// The collection mode of a source, for configuration validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::IsVariant)]
pub enum CollectMode {
    /// Live rollout with a uniformly random policy.
    #[display("random_agent")]
    RandomAgent,
    /// Pre-recorded episodes from an archival store.
    #[display("archival")]
    Archival,
}

/// Episodes, labels, and (for archival sources) per-episode rewards.
#[derive(Debug, Clone)]
pub struct SourceBatch {
    /// Acquired episodes in the pipeline layout (`[time, channel, height,
    /// width]` for raw frames, `[time, features]` for representations).
    pub episodes: Vec<Episode>,
    /// Per-frame labels, aligned with `episodes` by index.
    pub labels: Vec<EpisodeLabels>,
    /// Per-episode total rewards, aligned with `episodes`; only archival
    /// sources provide them.
    pub episode_rewards: Option<Vec<f32>>,
}

/// A source of episodes for one probing run.
pub enum EpisodeSource<'a> {
    /// Drive a live environment batch with random actions.
    RandomAgent {
        env: &'a mut dyn EnvironmentBatch,
        /// Total step budget, divided evenly across instances.
        total_steps: usize,
    },
    /// Load pre-recorded episodes matching a query.
    Archival {
        store: &'a dyn ArchivalStore,
        query: ArchivalQuery,
    },
}

impl EpisodeSource<'_> {
    /// The source's collection mode.
    #[must_use]
    pub fn mode(&self) -> CollectMode {
        match self {
            Self::RandomAgent { .. } => CollectMode::RandomAgent,
            Self::Archival { .. } => CollectMode::Archival,
        }
    }

    /// Whether archival queries should return pre-encoded representations.
    ///
    /// Set by the driver from the evaluation method; a no-op for live
    /// sources.
    pub fn set_use_representations(&mut self, use_representations: bool) {
        if let Self::Archival { query, .. } = self {
            query.use_representations = use_representations;
        }
    }

    /// Acquires one batch of episodes.
    ///
    /// `rng` drives action sampling for live rollouts; archival loading
    /// ignores it.
    pub fn acquire<R>(&mut self, rng: &mut R) -> Result<SourceBatch, PipelineError>
    where
        R: Rng + ?Sized,
    {
        match self {
            Self::RandomAgent { env, total_steps } => {
                let rollout = collect_random_agent(*env, *total_steps, rng)?;
                Ok(SourceBatch {
                    episodes: rollout.episodes,
                    labels: rollout.labels,
                    episode_rewards: None,
                })
            }
            Self::Archival { store, query } => {
                let mut episodes = Vec::new();
                let mut labels = Vec::new();
                let mut rewards = Vec::new();
                for archived in store.load_episodes(query) {
                    let episode = Episode::from_raw(archived.tensor.dims, archived.tensor.data)?;
                    // Spatial recordings arrive channels-last
                    episodes.push(episode.to_channels_first());
                    labels.push(archived.labels);
                    rewards.push(archived.reward);
                }
                Ok(SourceBatch {
                    episodes,
                    labels,
                    episode_rewards: Some(rewards),
                })
            }
        }
    }
}
