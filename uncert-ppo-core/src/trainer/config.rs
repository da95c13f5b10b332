//! Configuration of [`Trainer`](super::Trainer).
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::{Path, PathBuf},
};

/// Configuration of [`Trainer`](super::Trainer).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
#[serde(default)]
pub struct TrainerConfig {
    /// Index of the episode after the last training episode.
    pub episodes: usize,

    /// Index of the first episode, non-zero when resuming from a checkpoint.
    pub init_ep: usize,

    /// Interval of evaluation in episodes.
    pub eval_interval: usize,

    /// Interval of saving checkpoints in episodes.
    pub checkpoint_every: usize,

    /// The maximum number of environment steps in a training episode.
    pub max_episode_steps: usize,

    /// Name of the model, used in file names.
    pub model_name: String,

    /// Directory where checkpoints and the best model are saved.
    pub model_dir: String,

    /// Random seed of the environment for training.
    pub seed: i64,

    /// If `true`, nothing is written to disk.
    pub debug: bool,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            episodes: 50_000,
            init_ep: 0,
            eval_interval: 20,
            checkpoint_every: 10,
            max_episode_steps: 1000,
            model_name: "base".to_string(),
            model_dir: "param".to_string(),
            seed: 0,
            debug: false,
        }
    }
}

impl TrainerConfig {
    /// Sets the number of episodes.
    pub fn episodes(mut self, v: usize) -> Self {
        self.episodes = v;
        self
    }

    /// Sets the index of the first episode.
    pub fn init_ep(mut self, v: usize) -> Self {
        self.init_ep = v;
        self
    }

    /// Sets the interval of evaluation in episodes.
    pub fn eval_interval(mut self, v: usize) -> Self {
        self.eval_interval = v;
        self
    }

    /// Sets the interval of saving checkpoints in episodes.
    pub fn checkpoint_every(mut self, v: usize) -> Self {
        self.checkpoint_every = v;
        self
    }

    /// Sets the maximum number of steps in a training episode.
    pub fn max_episode_steps(mut self, v: usize) -> Self {
        self.max_episode_steps = v;
        self
    }

    /// Sets the name of the model.
    pub fn model_name(mut self, v: impl Into<String>) -> Self {
        self.model_name = v.into();
        self
    }

    /// Sets the directory where the model is saved.
    pub fn model_dir(mut self, v: impl Into<String>) -> Self {
        self.model_dir = v.into();
        self
    }

    /// Sets the random seed of the training environment.
    pub fn seed(mut self, v: i64) -> Self {
        self.seed = v;
        self
    }

    /// Sets the debug flag.
    pub fn debug(mut self, v: bool) -> Self {
        self.debug = v;
        self
    }

    /// Path of the best model.
    pub fn best_model_path(&self) -> PathBuf {
        Path::new(&self.model_dir).join(format!("best_{}.safetensors", self.model_name))
    }

    /// Path of the periodic checkpoint.
    pub fn checkpoint_path(&self) -> PathBuf {
        Path::new(&self.model_dir).join(format!("checkpoint_{}.safetensors", self.model_name))
    }

    /// Constructs [`TrainerConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`TrainerConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
