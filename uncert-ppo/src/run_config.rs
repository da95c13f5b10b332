//! Configuration of a training run.
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};
use uncert_ppo_candle_agent::BootstrapAgentConfig;
use uncert_ppo_core::TrainerConfig;
use uncert_ppo_pendulum_env::PendulumConfig;

/// Configuration of a training run.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
#[serde(default)]
pub struct RunConfig {
    /// Configuration of the training loop.
    pub trainer: TrainerConfig,

    /// Configuration of the agent.
    pub agent: BootstrapAgentConfig,

    /// Configuration of the environments for training and evaluation.
    ///
    /// Observation noise applies to training only.
    pub env: PendulumConfig,

    /// Random seed of the environment for evaluation.
    pub eval_seed: i64,

    /// Number of rollouts in each evaluation.
    pub nb_evaluations: usize,

    /// Root directory of uncertainty logs.
    pub uncert_dir: String,

    /// Checkpoint to resume training from.
    pub from_checkpoint: Option<String>,

    /// Directory of Tensorboard logs, if any.
    pub tensorboard_dir: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            trainer: TrainerConfig::default(),
            agent: BootstrapAgentConfig::default(),
            env: PendulumConfig::default(),
            eval_seed: 10,
            nb_evaluations: 3,
            uncert_dir: "uncertainties".to_string(),
            from_checkpoint: None,
            tensorboard_dir: None,
        }
    }
}

impl RunConfig {
    /// Makes the agent consistent with the environment.
    ///
    /// The input dimension of the networks is the dimension of stacked
    /// observations, the pendulum has a single action and the model name
    /// follows the variant of the agent.
    pub fn sync(mut self) -> Self {
        let ac = &mut self.agent.actor_critic_config;
        ac.state_dim = self.env.obs_dim();
        ac.action_dim = 1;
        self.trainer.model_name = self.agent.model.name().to_string();
        self
    }

    /// Loads [`RunConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`RunConfig`] as YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
