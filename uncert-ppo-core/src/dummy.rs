//! Scripted environment and agent, used for tests of the training loop.
use crate::{
    record::Record, ActionSelection, ActionSpace, Env, EnvStep, Mode, Transition,
    TransitionBuffer, UncertAgent, UncertaintyPair,
};
use anyhow::{anyhow, Result};
use std::{
    cell::RefCell,
    path::{Path, PathBuf},
};

/// Configuration of [`DummyEnv`].
#[derive(Clone, Debug)]
pub struct DummyEnvConfig {
    /// Length of an episode in steps, after which `is_dead` is returned.
    pub episode_len: usize,

    /// Reward of every step, indexed by episode (cycled).
    pub rewards: Vec<f32>,

    /// Running score above which the task is solved.
    pub reward_threshold: f32,

    /// If set, `step` fails at this step count of any episode.
    pub fail_at_step: Option<usize>,

    /// Observation noise reported by the environment.
    pub noise: f32,
}

impl Default for DummyEnvConfig {
    fn default() -> Self {
        Self {
            episode_len: 5,
            rewards: vec![1.0],
            reward_threshold: f32::MAX,
            fail_at_step: None,
            noise: 0.0,
        }
    }
}

/// An environment returning scripted rewards.
///
/// The observation is the step count within the episode.
pub struct DummyEnv {
    config: DummyEnvConfig,
    action_space: ActionSpace,
    n_resets: usize,
    step: usize,
    /// Actions received by `step`, after rescaling.
    pub actions: Vec<Vec<f32>>,
}

impl Env for DummyEnv {
    type Config = DummyEnvConfig;

    fn build(config: &Self::Config, _seed: i64) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            action_space: ActionSpace::new(vec![-2.0], vec![2.0]),
            n_resets: 0,
            step: 0,
            actions: vec![],
        })
    }

    fn reset(&mut self) -> Result<Vec<f32>> {
        self.n_resets += 1;
        self.step = 0;
        Ok(vec![0.0])
    }

    fn step(&mut self, act: &[f32]) -> Result<EnvStep> {
        if Some(self.step) == self.config.fail_at_step {
            return Err(anyhow!("DummyEnv failed at step {}", self.step));
        }
        self.actions.push(act.to_vec());
        self.step += 1;
        let rewards = &self.config.rewards;
        let reward = rewards[(self.n_resets - 1) % rewards.len()];
        Ok(EnvStep {
            obs: vec![self.step as f32],
            reward,
            is_done: false,
            is_dead: self.step >= self.config.episode_len,
        })
    }

    fn action_space(&self) -> &ActionSpace {
        &self.action_space
    }

    fn reward_threshold(&self) -> f32 {
        self.config.reward_threshold
    }

    fn random_noise(&self) -> f32 {
        self.config.noise
    }
}

/// An agent with a constant policy that counts its interactions.
pub struct DummyAgent {
    train: bool,
    buffer: TransitionBuffer,
    uncertainty: UncertaintyPair,
    /// The number of calls of `update`.
    pub n_updates: usize,
    /// Modes in which `select_action` was called, `true` for evaluation.
    pub eval_flags: Vec<bool>,
    /// Epochs and paths given to `save`.
    pub saved: RefCell<Vec<(usize, PathBuf)>>,
}

impl DummyAgent {
    /// Constructs a [`DummyAgent`] with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            train: false,
            buffer: TransitionBuffer::new(capacity),
            uncertainty: UncertaintyPair::default(),
            n_updates: 0,
            eval_flags: vec![],
            saved: RefCell::new(vec![]),
        }
    }

    /// Sets the uncertainty returned by `select_action`.
    pub fn uncertainty(mut self, epistemic: f32, aleatoric: f32) -> Self {
        self.uncertainty = UncertaintyPair::new(epistemic, aleatoric);
        self
    }

    /// Epochs of the models saved in the given path.
    pub fn saved_epochs(&self, path: &Path) -> Vec<usize> {
        self.saved
            .borrow()
            .iter()
            .filter(|(_, p)| p == path)
            .map(|(e, _)| *e)
            .collect()
    }

    /// The number of transitions in the buffer.
    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }
}

impl UncertAgent for DummyAgent {
    fn train(&mut self) {
        self.train = true;
    }

    fn eval(&mut self) {
        self.train = false;
    }

    fn is_train(&self) -> bool {
        self.train
    }

    fn select_action(&mut self, _state: &[f32], eval: bool) -> Result<ActionSelection> {
        self.eval_flags.push(eval);
        Ok(ActionSelection {
            action: vec![0.75],
            log_prob: 0.0,
            uncertainty: self.uncertainty,
        })
    }

    fn store_transition(&mut self, transition: Transition) -> Result<bool> {
        self.buffer.store(transition)
    }

    fn update(&mut self) -> Result<Record> {
        let transitions = self.buffer.drain()?;
        self.n_updates += 1;
        Ok(Record::from_scalar("n_transitions", transitions.len() as f32))
    }

    fn empty_buffer(&mut self) {
        self.buffer.clear();
    }

    fn save(&self, epoch: usize, path: &Path) -> Result<()> {
        self.saved.borrow_mut().push((epoch, path.to_path_buf()));
        Ok(())
    }

    fn load(&mut self, path: &Path, mode: Mode) -> Result<usize> {
        match mode {
            Mode::Train => self.train(),
            Mode::Eval => self.eval(),
        }
        self.saved
            .borrow()
            .iter()
            .rev()
            .find(|(_, p)| p == path)
            .map(|(e, _)| *e)
            .ok_or_else(|| anyhow!("No model saved in {:?}", path))
    }
}
