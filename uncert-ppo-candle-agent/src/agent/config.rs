//! Configuration of [`BootstrapAgent`](super::BootstrapAgent).
use crate::{actor_critic::ActorCriticConfig, opt::OptimizerConfig, ppo::PpoConfig, Device};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Variant of the agent.
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone, Copy)]
pub enum UncertModel {
    /// A single network, no uncertainty.
    Base,

    /// An ensemble of networks trained on their own permutations.
    Bootstrap,
}

impl UncertModel {
    /// Number of networks of the variant, given the configured ensemble size.
    pub fn n_members(&self, nb_nets: usize) -> usize {
        match self {
            Self::Base => 1,
            Self::Bootstrap => nb_nets,
        }
    }

    /// Name used for files of the model.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Bootstrap => "bootstrap",
        }
    }
}

/// Configuration of [`BootstrapAgent`](super::BootstrapAgent).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
#[serde(default)]
pub struct BootstrapAgentConfig {
    /// Variant of the agent.
    pub model: UncertModel,

    /// Number of ensemble members of the bootstrap variant.
    pub nb_nets: usize,

    /// Capacity of the transition buffer.
    pub buffer_capacity: usize,

    /// Configuration of each network.
    pub actor_critic_config: ActorCriticConfig,

    /// Hyperparameters of the update.
    pub ppo_config: PpoConfig,

    /// Optimizer of each member.
    pub opt_config: OptimizerConfig,

    /// Seed of the random number generator for sampling actions and permutations.
    pub seed: u64,

    /// Device of the networks.
    pub device: Device,
}

impl Default for BootstrapAgentConfig {
    fn default() -> Self {
        Self {
            model: UncertModel::Base,
            nb_nets: 10,
            buffer_capacity: 1000,
            actor_critic_config: ActorCriticConfig::default(),
            ppo_config: PpoConfig::default(),
            opt_config: OptimizerConfig::default(),
            seed: 0,
            device: Device::Cpu,
        }
    }
}

impl BootstrapAgentConfig {
    /// Sets the variant.
    pub fn model(mut self, v: UncertModel) -> Self {
        self.model = v;
        self
    }

    /// Sets the number of ensemble members.
    pub fn nb_nets(mut self, v: usize) -> Self {
        self.nb_nets = v;
        self
    }

    /// Sets the capacity of the transition buffer.
    pub fn buffer_capacity(mut self, v: usize) -> Self {
        self.buffer_capacity = v;
        self
    }

    /// Configuration of the networks.
    pub fn actor_critic_config(mut self, v: ActorCriticConfig) -> Self {
        self.actor_critic_config = v;
        self
    }

    /// Hyperparameters of the update.
    pub fn ppo_config(mut self, v: PpoConfig) -> Self {
        self.ppo_config = v;
        self
    }

    /// Sets optimizer configuration.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.opt_config = v;
        self
    }

    /// Sets the random seed.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Device.
    pub fn device(mut self, v: Device) -> Self {
        self.device = v;
        self
    }

    /// Loads [`BootstrapAgentConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`BootstrapAgentConfig`] as YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_serde_config() -> Result<()> {
        let config = BootstrapAgentConfig::default()
            .model(UncertModel::Base)
            .nb_nets(5)
            .ppo_config(PpoConfig::default().batch_size(64))
            .opt_config(OptimizerConfig::default().learning_rate(3e-4));

        let dir = TempDir::new("bootstrap_agent_config")?;
        let path = dir.path().join("agent.yaml");
        config.save(&path)?;
        assert_eq!(BootstrapAgentConfig::load(&path)?, config);
        Ok(())
    }

    #[test]
    fn test_default_hyperparameters() {
        let config = BootstrapAgentConfig::default();
        assert_eq!(config.nb_nets, 10);
        assert_eq!(config.buffer_capacity, 1000);
        assert_eq!(config.ppo_config.gamma, 0.99);
        assert_eq!(config.ppo_config.ppo_epoch, 20);
        assert_eq!(config.ppo_config.clip_param, 0.1);
        assert_eq!(config.ppo_config.batch_size, 128);
        assert_eq!(config.model, UncertModel::Base);
        assert_eq!(config.model.n_members(config.nb_nets), 1);
        assert_eq!(UncertModel::Bootstrap.n_members(config.nb_nets), 10);
    }
}
