//! Random-agent episode collection.
//!
//! Drives an [`EnvironmentBatch`] with uniformly random actions for a fixed
//! total step budget, divided evenly across instances. Episode boundaries
//! follow the batch's `done` flags: each instance accumulates its in-progress
//! episode in a per-instance buffer, and `done` flushes the buffer into the
//! flat output list and opens a new one.
//!
//! Following vectorized-environment convention, the observation returned on
//! a `done` step is the first frame of the *next* episode, so it lands in the
//! freshly opened buffer. Buffers still open when the budget runs out are
//! flushed as (possibly truncated) episodes.

use rand::Rng;

use crate::{
    CollectError,
    environment::{ActionSpace, EnvironmentBatch},
    episode::{Episode, EpisodeLabels, Frame},
};

/// The product of one random-agent collection pass.
#[derive(Debug, Clone)]
pub struct Rollout {
    /// All completed (and trailing in-progress) episodes, flattened across
    /// instances in instance order.
    pub episodes: Vec<Episode>,
    /// Per-frame labels, aligned with `episodes` by index.
    pub labels: Vec<EpisodeLabels>,
    /// Terminal reward summaries, aligned with `episodes` by index.
    ///
    /// `None` for episodes that never reported a terminal summary (episodes
    /// truncated by the step budget).
    pub terminal_rewards: Vec<Option<f32>>,
}

/// One instance's open episode buffer.
///
/// The arena of these buffers is fixed at `num_instances`; ownership of the
/// accumulated frames transfers to the output list at flush time.
#[derive(Debug, Default)]
struct OpenEpisode {
    frames: Vec<Frame>,
    labels: EpisodeLabels,
}

impl OpenEpisode {
    fn flush_into(&mut self, out: &mut RolloutBuilder, reward: Option<f32>) -> Result<(), CollectError> {
        if self.frames.is_empty() {
            return Ok(());
        }
        let frames = std::mem::take(&mut self.frames);
        let labels = std::mem::take(&mut self.labels);
        let episode = Episode::from_frames(frames).map_err(CollectError::Shape)?;
        out.episodes.push(episode);
        out.labels.push(labels);
        out.terminal_rewards.push(reward);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct RolloutBuilder {
    episodes: Vec<Episode>,
    labels: Vec<EpisodeLabels>,
    terminal_rewards: Vec<Option<f32>>,
}

/// Collects episodes by stepping `env` with uniformly random actions.
///
/// Actions are drawn from `1..n` of the discrete action space (action 0 is
/// reserved for no-op and never sampled). The batch is stepped
/// `total_steps / num_instances` times, so the budget is divided evenly
/// across instances.
///
/// # Errors
///
/// [`CollectError::UnsupportedActionSpace`] when the action space is not
/// discrete with at least two actions, [`CollectError::Shape`] when an
/// instance reports frames of inconsistent shape within one episode.
pub fn collect_random_agent<R>(
    env: &mut dyn EnvironmentBatch,
    total_steps: usize,
    rng: &mut R,
) -> Result<Rollout, CollectError>
where
    R: Rng + ?Sized,
{
    let space = env.action_space();
    let ActionSpace::Discrete { n } = space else {
        return Err(CollectError::UnsupportedActionSpace {
            space: space.to_string(),
        });
    };
    if n < 2 {
        return Err(CollectError::UnsupportedActionSpace {
            space: space.to_string(),
        });
    }

    let num_instances = env.num_instances();
    let _ = env.reset();

    let mut out = RolloutBuilder::default();
    let mut arena: Vec<OpenEpisode> = (0..num_instances).map(|_| OpenEpisode::default()).collect();

    let steps = total_steps / num_instances.max(1);
    log::debug!("collecting {steps} steps across {num_instances} instances");
    for _ in 0..steps {
        let actions: Vec<u32> = (0..num_instances).map(|_| rng.random_range(1..n)).collect();
        let batch = env.step(&actions);

        for (i, frame) in batch.observations.into_iter().enumerate() {
            let info = &batch.infos[i];
            if batch.dones[i] {
                // The finished episode flushes with its terminal summary;
                // this observation opens the next episode.
                arena[i].flush_into(&mut out, info.episode_reward)?;
            }
            arena[i].frames.push(frame);
            if let Some(labels) = &info.labels {
                arena[i].labels.push(labels.clone());
            }
        }
    }

    for open in &mut arena {
        open.flush_into(&mut out, None)?;
    }

    log::debug!("collected {} episodes", out.episodes.len());
    Ok(Rollout {
        episodes: out.episodes,
        labels: out.labels,
        terminal_rewards: out.terminal_rewards,
    })
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg64;

    use super::*;
    use crate::scripted::ScriptedEnv;

    #[test]
    fn test_collects_complete_episodes_from_scripted_env() {
        let mut env = ScriptedEnv::new(2, 8, 6, 10);
        let mut rng = Pcg64::seed_from_u64(0);
        let rollout = collect_random_agent(&mut env, 80, &mut rng).unwrap();

        assert!(!rollout.episodes.is_empty());
        assert_eq!(rollout.episodes.len(), rollout.labels.len());
        assert_eq!(rollout.episodes.len(), rollout.terminal_rewards.len());
        for (episode, labels) in rollout.episodes.iter().zip(&rollout.labels) {
            assert_eq!(episode.frame_dims(), &[1, 6, 8]);
            assert_eq!(episode.len(), labels.len());
            // Episodes run at most the scripted length plus the opening frame
            assert!(episode.len() <= 11);
        }
    }

    #[test]
    fn test_same_seed_collects_identical_rollouts() {
        let collect = || {
            let mut env = ScriptedEnv::new(3, 8, 6, 7);
            let mut rng = Pcg64::seed_from_u64(42);
            collect_random_agent(&mut env, 120, &mut rng).unwrap()
        };
        let a = collect();
        let b = collect();
        assert_eq!(a.episodes, b.episodes);
        assert_eq!(a.labels, b.labels);
    }

    #[test]
    fn test_budget_divides_evenly_across_instances() {
        let mut env = ScriptedEnv::new(4, 8, 6, 1000);
        let mut rng = Pcg64::seed_from_u64(1);
        // 20 steps per instance, no episode finishes: one open buffer each
        let rollout = collect_random_agent(&mut env, 80, &mut rng).unwrap();
        assert_eq!(rollout.episodes.len(), 4);
        for episode in &rollout.episodes {
            assert_eq!(episode.len(), 20);
        }
        assert!(rollout.terminal_rewards.iter().all(Option::is_none));
    }

    #[test]
    fn test_rejects_non_discrete_action_space() {
        struct ContinuousEnv;
        impl EnvironmentBatch for ContinuousEnv {
            fn num_instances(&self) -> usize {
                1
            }
            fn action_space(&self) -> ActionSpace {
                ActionSpace::Continuous { dim: 3 }
            }
            fn reset(&mut self) -> Vec<Frame> {
                unreachable!("collection must fail before reset")
            }
            fn step(&mut self, _actions: &[u32]) -> crate::environment::StepBatch {
                unreachable!("collection must fail before stepping")
            }
        }

        let mut rng = Pcg64::seed_from_u64(0);
        let err = collect_random_agent(&mut ContinuousEnv, 10, &mut rng).unwrap_err();
        assert!(matches!(err, CollectError::UnsupportedActionSpace { .. }));
    }

    #[test]
    fn test_rejects_single_action_discrete_space() {
        struct OneActionEnv;
        impl EnvironmentBatch for OneActionEnv {
            fn num_instances(&self) -> usize {
                1
            }
            fn action_space(&self) -> ActionSpace {
                ActionSpace::Discrete { n: 1 }
            }
            fn reset(&mut self) -> Vec<Frame> {
                unreachable!()
            }
            fn step(&mut self, _actions: &[u32]) -> crate::environment::StepBatch {
                unreachable!()
            }
        }

        let mut rng = Pcg64::seed_from_u64(0);
        let err = collect_random_agent(&mut OneActionEnv, 10, &mut rng).unwrap_err();
        assert!(matches!(err, CollectError::UnsupportedActionSpace { .. }));
    }

    #[test]
    fn test_terminal_rewards_attach_to_finished_episodes() {
        let mut env = ScriptedEnv::new(1, 8, 6, 5);
        let mut rng = Pcg64::seed_from_u64(7);
        let rollout = collect_random_agent(&mut env, 23, &mut rng).unwrap();

        // Every flushed-on-done episode carries a summary; only the trailing
        // in-progress episode may lack one.
        let (last, finished) = rollout.terminal_rewards.split_last().unwrap();
        assert!(finished.iter().all(Option::is_some));
        let _ = last;
    }
}
