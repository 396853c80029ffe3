//! Vectorized environment interface.
//!
//! A batch executes N environment instances in lockstep: one blocking
//! [`EnvironmentBatch::step`] call advances every instance by one simulated
//! step and returns all results synchronously. How the batch runs its
//! instances internally (threads, processes, or a vectorized call) is its
//! own business; the pipeline never observes intra-step concurrency.

use crate::episode::{Frame, LabelFrame};

/// The action space of an environment batch.
///
/// The random-agent collector only supports discrete-categorical spaces;
/// everything else is reported through [`crate::CollectError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::IsVariant)]
pub enum ActionSpace {
    /// `n` mutually exclusive actions, identified by `0..n`.
    #[display("discrete({n})")]
    Discrete { n: u32 },
    /// A real-valued action vector of the given dimension.
    #[display("continuous({dim})")]
    Continuous { dim: usize },
    /// A vector of `n` independent binary switches.
    #[display("multi-binary({n})")]
    MultiBinary { n: usize },
}

/// Side-channel information reported by one instance for one step.
#[derive(Debug, Clone, Default)]
pub struct StepInfo {
    /// Terminal episode summary: total reward, present on the step where an
    /// episode finished.
    pub episode_reward: Option<f32>,
    /// Ground-truth game-state labels for the returned observation, when the
    /// environment exposes them.
    pub labels: Option<LabelFrame>,
}

/// The result of stepping every instance of a batch once.
#[derive(Debug, Clone)]
pub struct StepBatch {
    /// One observation per instance.
    pub observations: Vec<Frame>,
    /// One step reward per instance.
    pub rewards: Vec<f32>,
    /// Whether each instance finished its episode on this step.
    pub dones: Vec<bool>,
    /// Per-instance side-channel information.
    pub infos: Vec<StepInfo>,
}

/// A batch of environment instances stepped in lockstep.
pub trait EnvironmentBatch {
    /// Number of instances in the batch.
    fn num_instances(&self) -> usize;

    /// The (shared) action space of the instances.
    fn action_space(&self) -> ActionSpace;

    /// Resets every instance and returns the initial observations.
    fn reset(&mut self) -> Vec<Frame>;

    /// Advances every instance by one step.
    ///
    /// Instances that finish an episode are expected to reset themselves and
    /// return the first observation of the next episode, in the style of
    /// vectorized environment wrappers.
    fn step(&mut self, actions: &[u32]) -> StepBatch;
}
