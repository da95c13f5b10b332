//! Agent.
use crate::{record::Record, Transition};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Mode of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum Mode {
    /// Training mode.
    Train,

    /// Evaluation mode.
    Eval,
}

/// Uncertainty of a prediction, decomposed into two parts.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UncertaintyPair {
    /// Disagreement among ensemble members.
    pub epistemic: f32,

    /// Noise modeled by a single member's predictive distribution.
    pub aleatoric: f32,
}

impl UncertaintyPair {
    /// Constructs an [`UncertaintyPair`].
    pub fn new(epistemic: f32, aleatoric: f32) -> Self {
        Self {
            epistemic,
            aleatoric,
        }
    }
}

/// Output of [`UncertAgent::select_action`].
#[derive(Debug, Clone, PartialEq)]
pub struct ActionSelection {
    /// Action in `[0, 1]` for each dimension.
    pub action: Vec<f32>,

    /// Log probability of the action under the policy that produced it.
    pub log_prob: f32,

    /// Uncertainty of the agent on the given state.
    pub uncertainty: UncertaintyPair,
}

/// A trainable policy reporting its own uncertainty.
///
/// The agent owns its transition buffer. [`UncertAgent::store_transition`]
/// returns `true` when the buffer became full, which is the signal for
/// calling [`UncertAgent::update`].
pub trait UncertAgent {
    /// Set the policy to training mode.
    fn train(&mut self);

    /// Set the policy to evaluation mode.
    fn eval(&mut self);

    /// Return if it is in training mode.
    fn is_train(&self) -> bool;

    /// Selects an action for a single state.
    ///
    /// With `eval == true` exploration may be suppressed. The uncertainty
    /// is computed in both cases.
    fn select_action(&mut self, state: &[f32], eval: bool) -> Result<ActionSelection>;

    /// Stores a transition, returns `true` if the buffer is now full.
    fn store_transition(&mut self, transition: Transition) -> Result<bool>;

    /// Performs the optimization with the transitions in the buffer.
    fn update(&mut self) -> Result<Record>;

    /// Empties the buffer. Calling it on an empty buffer is a no-op.
    fn empty_buffer(&mut self);

    /// Saves the agent together with the given epoch into a single file.
    fn save(&self, epoch: usize, path: &Path) -> Result<()>;

    /// Loads the agent from a file written by [`UncertAgent::save`] and
    /// returns the stored epoch. The agent is left in `mode`.
    fn load(&mut self, path: &Path, mode: Mode) -> Result<usize>;
}
