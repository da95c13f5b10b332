//! Configuration of [`PendulumEnv`](crate::PendulumEnv).
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
    str::FromStr,
};

/// Gaussian noise added to observations.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone, Copy)]
pub enum NoiseConfig {
    /// Standard deviation fixed during the whole run.
    Fixed(f32),

    /// A standard deviation is drawn uniformly from `[lower, upper]` at every reset.
    Bounds(f32, f32),
}

impl FromStr for NoiseConfig {
    type Err = anyhow::Error;

    /// Parses `"sigma"` or `"lower,upper"`.
    fn from_str(s: &str) -> Result<Self> {
        let values = s
            .split(',')
            .map(|v| v.trim().parse::<f32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow!("Invalid noise {:?}: {}", s, e))?;
        match values.as_slice() {
            [sigma] => Ok(Self::Fixed(*sigma)),
            [lower, upper] if lower <= upper => Ok(Self::Bounds(*lower, *upper)),
            _ => Err(anyhow!("Invalid noise {:?}, expected \"sigma\" or \"lower,upper\"", s)),
        }
    }
}

/// Configuration of [`PendulumEnv`](crate::PendulumEnv).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
#[serde(default)]
pub struct PendulumConfig {
    /// Number of frames stacked in an observation.
    pub state_stack: usize,

    /// Number of physics steps each action is applied for.
    pub action_repeat: usize,

    /// Observation noise, if any.
    pub noise: Option<NoiseConfig>,

    /// The episode is done when its cumulative reward falls below this value.
    pub done_reward_threshold: f32,

    /// Number of physics steps of an episode.
    pub max_steps: usize,

    /// Running score above which the task is solved.
    ///
    /// Rewards of the pendulum are never positive and the running score starts
    /// from `0`, so the default `0` never stops training early.
    pub reward_threshold: f32,
}

impl Default for PendulumConfig {
    fn default() -> Self {
        Self {
            state_stack: 6,
            action_repeat: 1,
            noise: None,
            done_reward_threshold: -1000.0,
            max_steps: 200,
            reward_threshold: 0.0,
        }
    }
}

impl PendulumConfig {
    /// Sets the number of stacked frames.
    pub fn state_stack(mut self, v: usize) -> Self {
        self.state_stack = v;
        self
    }

    /// Sets the action repeat.
    pub fn action_repeat(mut self, v: usize) -> Self {
        self.action_repeat = v;
        self
    }

    /// Sets the observation noise.
    pub fn noise(mut self, v: Option<NoiseConfig>) -> Self {
        self.noise = v;
        self
    }

    /// Sets the threshold of the cumulative reward ending an episode.
    pub fn done_reward_threshold(mut self, v: f32) -> Self {
        self.done_reward_threshold = v;
        self
    }

    /// Sets the episode length.
    pub fn max_steps(mut self, v: usize) -> Self {
        self.max_steps = v;
        self
    }

    /// Sets the running score solving the task.
    pub fn reward_threshold(mut self, v: f32) -> Self {
        self.reward_threshold = v;
        self
    }

    /// Dimension of stacked observations.
    pub fn obs_dim(&self) -> usize {
        self.state_stack * crate::OBS_DIM
    }

    /// Loads [`PendulumConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`PendulumConfig`] as YAML file.
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
    fn test_parse_noise() -> Result<()> {
        assert_eq!("0.1".parse::<NoiseConfig>()?, NoiseConfig::Fixed(0.1));
        assert_eq!("0, 0.5".parse::<NoiseConfig>()?, NoiseConfig::Bounds(0.0, 0.5));
        assert!("0.5,0".parse::<NoiseConfig>().is_err());
        assert!("a,b".parse::<NoiseConfig>().is_err());
        assert!("0,1,2".parse::<NoiseConfig>().is_err());
        Ok(())
    }

    #[test]
    fn test_serde_config() -> Result<()> {
        let config = PendulumConfig::default()
            .state_stack(4)
            .noise(Some(NoiseConfig::Bounds(0.0, 0.2)));
        assert_eq!(config.obs_dim(), 12);

        let dir = TempDir::new("pendulum_config")?;
        let path = dir.path().join("env.yaml");
        config.save(&path)?;
        assert_eq!(PendulumConfig::load(&path)?, config);
        Ok(())
    }
}
