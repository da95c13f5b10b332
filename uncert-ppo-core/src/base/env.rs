//! Environment.
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Box-shaped range of actions accepted by an environment.
///
/// Agents emit actions in `[0, 1]`, which are rescaled into this range
/// with [`adjust_range`](crate::util::adjust_range) before being applied.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ActionSpace {
    /// Lower bounds, one per action dimension.
    pub low: Vec<f32>,

    /// Upper bounds, one per action dimension.
    pub high: Vec<f32>,
}

impl ActionSpace {
    /// Constructs an action space.
    pub fn new(low: Vec<f32>, high: Vec<f32>) -> Self {
        debug_assert_eq!(low.len(), high.len());
        Self { low, high }
    }

    /// Number of action dimensions.
    pub fn dim(&self) -> usize {
        self.low.len()
    }
}

/// The result of an environment step.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvStep {
    /// Observation after the step.
    pub obs: Vec<f32>,

    /// Reward of the step.
    pub reward: f32,

    /// The episode should end, e.g. because the agent performs too poorly.
    pub is_done: bool,

    /// The episode reached a terminal state of the environment.
    pub is_dead: bool,
}

/// Represents an environment, typically an MDP.
///
/// Any error returned by [`Env::reset`] or [`Env::step`] is propagated as is
/// by the training and evaluation loops; they never retry.
pub trait Env {
    /// Configurations.
    type Config: Clone;

    /// Builds an environment with a given random seed.
    fn build(config: &Self::Config, seed: i64) -> Result<Self>
    where
        Self: Sized;

    /// Resets the environment and returns the initial observation.
    fn reset(&mut self) -> Result<Vec<f32>>;

    /// Performes an environment step.
    fn step(&mut self, act: &[f32]) -> Result<EnvStep>;

    /// Range into which actions are rescaled.
    fn action_space(&self) -> &ActionSpace;

    /// Running score above which the task is considered solved.
    fn reward_threshold(&self) -> f32;

    /// Standard deviation of the observation noise currently in use.
    fn random_noise(&self) -> f32 {
        0.0
    }

    /// Releases resources held by the environment.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
