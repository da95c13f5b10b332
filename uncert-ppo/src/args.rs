//! Command line arguments.
use crate::RunConfig;
use anyhow::{anyhow, Result};
use clap::Parser;
use std::path::PathBuf;
use uncert_ppo_candle_agent::{opt::OptimizerConfig, Device, UncertModel};

/// Train a PPO agent with uncertainty estimation on the pendulum.
///
/// Arguments override the values of the configuration file given by `--config`,
/// which in turn override the defaults.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Args {
    /// YAML file of the run configuration
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Repeat each action in N frames
    #[arg(long)]
    pub action_repeat: Option<usize>,

    /// Number of stacked frames in an observation
    #[arg(long)]
    pub state_stack: Option<usize>,

    /// Random seed of the environment for training and of the agent
    #[arg(long)]
    pub train_seed: Option<i64>,

    /// Random seed of the environment for evaluation
    #[arg(long)]
    pub eval_seed: Option<i64>,

    /// Standard deviation of the observation noise, or its bounds separated by comma (ex. "0,0.5")
    #[arg(long)]
    pub noise: Option<String>,

    /// Type of uncertainty model: "base" or "bootstrap"
    #[arg(long)]
    pub model: Option<String>,

    /// Number of networks to estimate uncertainties
    #[arg(long)]
    pub nb_nets: Option<usize>,

    /// Discount factor
    #[arg(long)]
    pub gamma: Option<f64>,

    /// Hidden layer widths of the networks separated by dash (ex. "256-256")
    #[arg(long)]
    pub architecture: Option<String>,

    /// Number of passes over the buffer in each update
    #[arg(long)]
    pub ppo_epoch: Option<usize>,

    /// Clip parameter of the surrogate loss
    #[arg(long)]
    pub clip_param: Option<f64>,

    /// Checkpoint to resume training from
    #[arg(long)]
    pub from_checkpoint: Option<String>,

    /// Number of training episodes
    #[arg(long)]
    pub episodes: Option<usize>,

    /// Device: "cpu" or "cuda"
    #[arg(long)]
    pub device: Option<String>,

    /// Interval between evaluations in episodes
    #[arg(long)]
    pub eval_interval: Option<usize>,

    /// Number of rollouts in each evaluation
    #[arg(long)]
    pub evaluations: Option<usize>,

    /// Debug mode, nothing is written to disk
    #[arg(long, default_value_t = false)]
    pub debug: bool,

    /// Directory of Tensorboard logs
    #[arg(long)]
    pub tensorboard: Option<String>,

    /// Capacity of the transition buffer
    #[arg(long)]
    pub buffer_capacity: Option<usize>,

    /// Size of mini-batches
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Learning rate
    #[arg(long)]
    pub learning_rate: Option<f64>,
}

fn parse_model(s: &str) -> Result<UncertModel> {
    match s {
        "base" => Ok(UncertModel::Base),
        "bootstrap" => Ok(UncertModel::Bootstrap),
        _ => Err(anyhow!("Unknown model {:?}, expected \"base\" or \"bootstrap\"", s)),
    }
}

fn parse_architecture(s: &str) -> Result<Vec<usize>> {
    s.split('-')
        .map(|w| {
            w.trim()
                .parse::<usize>()
                .map_err(|e| anyhow!("Invalid architecture {:?}: {}", s, e))
        })
        .collect()
}

fn parse_device(s: &str) -> Result<Device> {
    match s {
        "cpu" => Ok(Device::Cpu),
        "cuda" => Ok(Device::Cuda(0)),
        _ => Err(anyhow!("Unknown device {:?}, expected \"cpu\" or \"cuda\"", s)),
    }
}

impl Args {
    /// Builds the run configuration.
    pub fn run_config(&self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::load(path)?,
            None => RunConfig::default(),
        };

        // Environment
        let env = &mut config.env;
        if let Some(v) = self.action_repeat {
            env.action_repeat = v;
        }
        if let Some(v) = self.state_stack {
            env.state_stack = v;
        }
        if let Some(v) = &self.noise {
            env.noise = Some(v.parse()?);
        }
        if let Some(v) = self.train_seed {
            config.trainer.seed = v;
            config.agent.seed = v as u64;
        }
        if let Some(v) = self.eval_seed {
            config.eval_seed = v;
        }

        // Agent
        let agent = &mut config.agent;
        if let Some(v) = &self.model {
            agent.model = parse_model(v)?;
        }
        if let Some(v) = self.nb_nets {
            agent.nb_nets = v;
        }
        if let Some(v) = self.gamma {
            agent.ppo_config.gamma = v;
        }
        if let Some(v) = &self.architecture {
            agent.actor_critic_config.architecture = parse_architecture(v)?;
        }
        if let Some(v) = self.ppo_epoch {
            agent.ppo_config.ppo_epoch = v;
        }
        if let Some(v) = self.clip_param {
            agent.ppo_config.clip_param = v;
        }
        if let Some(v) = &self.device {
            agent.device = parse_device(v)?;
        }
        if let Some(v) = self.buffer_capacity {
            agent.buffer_capacity = v;
        }
        if let Some(v) = self.batch_size {
            agent.ppo_config.batch_size = v;
        }
        if let Some(v) = self.learning_rate {
            agent.opt_config = agent.opt_config.clone().learning_rate(v);
        }
        if self.from_checkpoint.is_some() {
            config.from_checkpoint = self.from_checkpoint.clone();
        }

        // Training
        if let Some(v) = self.episodes {
            config.trainer.episodes = v;
        }
        if let Some(v) = self.eval_interval {
            config.trainer.eval_interval = v;
        }
        if let Some(v) = self.evaluations {
            config.nb_evaluations = v;
        }
        if self.debug {
            config.trainer.debug = true;
        }
        if self.tensorboard.is_some() {
            config.tensorboard_dir = self.tensorboard.clone();
        }

        Ok(config.sync())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use uncert_ppo_pendulum_env::NoiseConfig;

    #[test]
    fn test_run_config_from_args() -> Result<()> {
        let args = Args::parse_from([
            "uncert-ppo",
            "--model",
            "bootstrap",
            "--nb-nets",
            "5",
            "--architecture",
            "256-128",
            "--state-stack",
            "2",
            "--noise",
            "0,0.5",
            "--learning-rate",
            "0.0003",
            "--train-seed",
            "7",
            "--debug",
        ]);
        let config = args.run_config()?;

        assert_eq!(config.agent.model, UncertModel::Bootstrap);
        assert_eq!(config.agent.nb_nets, 5);
        assert_eq!(config.agent.actor_critic_config.architecture, vec![256, 128]);
        assert_eq!(config.agent.actor_critic_config.state_dim, 6);
        assert_eq!(config.env.noise, Some(NoiseConfig::Bounds(0.0, 0.5)));
        assert_eq!(
            config.agent.opt_config,
            OptimizerConfig::default().learning_rate(3e-4)
        );
        assert_eq!(config.trainer.model_name, "bootstrap");
        assert_eq!(config.trainer.seed, 7);
        assert_eq!(config.agent.seed, 7);
        assert!(config.trainer.debug);
        Ok(())
    }

    #[test]
    fn test_defaults() -> Result<()> {
        let config = Args::parse_from(["uncert-ppo"]).run_config()?;
        assert_eq!(config.trainer.episodes, 50_000);
        assert_eq!(config.trainer.eval_interval, 20);
        assert_eq!(config.nb_evaluations, 3);
        assert_eq!(config.env.state_stack, 6);
        assert_eq!(config.agent.actor_critic_config.state_dim, 18);
        assert_eq!(config.agent.model, UncertModel::Base);
        assert_eq!(config.trainer.model_name, "base");
        Ok(())
    }

    #[test]
    fn test_invalid_values() {
        assert!(parse_model("dropout").is_err());
        assert!(parse_architecture("256-x").is_err());
        assert!(parse_device("tpu").is_err());
    }
}
