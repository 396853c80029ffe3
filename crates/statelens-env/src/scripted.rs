//! A deterministic scripted environment batch.
//!
//! `ScriptedEnv` is a tiny synthetic game used to exercise the collection
//! pipeline in tests and to generate episode archives offline: an agent
//! walks along a one-dimensional track rendered as a grayscale frame, scores
//! a point each time it touches the right wall, and episodes end after a
//! fixed number of steps. Everything is a pure function of the action
//! sequence, so collections are reproducible given a seeded action source.
//!
//! Exposed labels per frame: `agent_x` (track position) and `score`.

use crate::{
    environment::{ActionSpace, EnvironmentBatch, StepBatch, StepInfo},
    episode::{Frame, LabelFrame},
};

const ACTION_LEFT: u32 = 1;
const ACTION_RIGHT: u32 = 2;

#[derive(Debug, Clone)]
struct InstanceState {
    pos: usize,
    score: i64,
    steps_in_episode: usize,
}

impl InstanceState {
    fn start(width: usize) -> Self {
        Self {
            pos: width / 2,
            score: 0,
            steps_in_episode: 0,
        }
    }
}

/// A batch of scripted track-walking game instances.
#[derive(Debug, Clone)]
pub struct ScriptedEnv {
    width: usize,
    height: usize,
    episode_len: usize,
    instances: Vec<InstanceState>,
}

impl ScriptedEnv {
    /// Environment name recorded in generated archives.
    pub const ENV_NAME: &'static str = "track";

    /// Creates a batch of `num_instances` games on a `width`-cell track,
    /// rendered at `height` rows, with episodes of exactly `episode_len`
    /// steps.
    ///
    /// # Panics
    ///
    /// Panics if any dimension or the episode length is zero.
    #[must_use]
    pub fn new(num_instances: usize, width: usize, height: usize, episode_len: usize) -> Self {
        assert!(num_instances > 0 && width > 1 && height > 0 && episode_len > 0);
        Self {
            width,
            height,
            episode_len,
            instances: vec![InstanceState::start(width); num_instances],
        }
    }

    fn render(&self, state: &InstanceState) -> Frame {
        let mut data = vec![0.0; self.height * self.width];
        let row = self.height / 2;
        data[row * self.width + state.pos] = 1.0;
        Frame::new(vec![1, self.height, self.width], data)
            .expect("scripted frame dims are consistent")
    }

    #[expect(clippy::cast_possible_wrap)]
    fn labels(state: &InstanceState) -> LabelFrame {
        LabelFrame::from([
            ("agent_x".to_owned(), state.pos as i64),
            ("score".to_owned(), state.score),
        ])
    }
}

impl EnvironmentBatch for ScriptedEnv {
    fn num_instances(&self) -> usize {
        self.instances.len()
    }

    fn action_space(&self) -> ActionSpace {
        // left, right, and the reserved no-op
        ActionSpace::Discrete { n: 3 }
    }

    fn reset(&mut self) -> Vec<Frame> {
        for state in &mut self.instances {
            *state = InstanceState::start(self.width);
        }
        self.instances
            .iter()
            .map(|state| self.render(state))
            .collect()
    }

    fn step(&mut self, actions: &[u32]) -> StepBatch {
        assert_eq!(actions.len(), self.instances.len());

        let mut observations = Vec::with_capacity(self.instances.len());
        let mut rewards = Vec::with_capacity(self.instances.len());
        let mut dones = Vec::with_capacity(self.instances.len());
        let mut infos = Vec::with_capacity(self.instances.len());

        let width = self.width;
        let episode_len = self.episode_len;
        for (state, &action) in std::iter::zip(&mut self.instances, actions) {
            match action {
                ACTION_LEFT => state.pos = state.pos.saturating_sub(1),
                ACTION_RIGHT if state.pos + 1 < width => state.pos += 1,
                _ => {}
            }
            let mut reward = 0.0;
            if state.pos == width - 1 {
                state.score += 1;
                reward = 1.0;
            }
            state.steps_in_episode += 1;

            let done = state.steps_in_episode >= episode_len;
            let mut info = StepInfo::default();
            if done {
                // Terminal summary, then the instance resets itself; the
                // returned observation opens the next episode.
                #[expect(clippy::cast_precision_loss)]
                {
                    info.episode_reward = Some(state.score as f32);
                }
                *state = InstanceState::start(width);
            }
            info.labels = Some(Self::labels(state));
            rewards.push(reward);
            dones.push(done);
            infos.push(info);
        }
        for state in &self.instances {
            observations.push(self.render(state));
        }

        StepBatch {
            observations,
            rewards,
            dones,
            infos,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_have_single_lit_pixel() {
        let mut env = ScriptedEnv::new(1, 8, 6, 10);
        let obs = env.reset();
        assert_eq!(obs[0].dims(), &[1, 6, 8]);
        let lit: Vec<_> = obs[0]
            .data()
            .iter()
            .enumerate()
            .filter(|(_, v)| **v > 0.0)
            .collect();
        assert_eq!(lit.len(), 1);
    }

    #[test]
    fn test_labels_track_agent_position() {
        let mut env = ScriptedEnv::new(1, 8, 6, 100);
        env.reset();
        let batch = env.step(&[ACTION_RIGHT]);
        let labels = batch.infos[0].labels.clone().unwrap();
        assert_eq!(labels["agent_x"], 5);
        assert_eq!(labels["score"], 0);
    }

    #[test]
    fn test_episode_ends_after_fixed_length() {
        let mut env = ScriptedEnv::new(1, 8, 6, 3);
        env.reset();
        assert!(!env.step(&[0]).dones[0]);
        assert!(!env.step(&[0]).dones[0]);
        let batch = env.step(&[0]);
        assert!(batch.dones[0]);
        assert_eq!(batch.infos[0].episode_reward, Some(0.0));
        // Post-done labels describe the freshly reset instance
        assert_eq!(batch.infos[0].labels.as_ref().unwrap()["agent_x"], 4);
    }

    #[test]
    fn test_scoring_at_right_wall() {
        let mut env = ScriptedEnv::new(1, 8, 6, 100);
        env.reset();
        env.step(&[ACTION_RIGHT]);
        env.step(&[ACTION_RIGHT]);
        let batch = env.step(&[ACTION_RIGHT]);
        assert_eq!(batch.rewards[0], 1.0);
        assert_eq!(batch.infos[0].labels.as_ref().unwrap()["score"], 1);
    }
}
