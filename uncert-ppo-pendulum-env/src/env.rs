use crate::{NoiseConfig, Pendulum, PendulumConfig, MAX_TORQUE};
use anyhow::{anyhow, Result};
use log::trace;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use std::collections::VecDeque;
use uncert_ppo_core::{error::UppoError, ActionSpace, Env, EnvStep};

/// Pendulum with stacked, possibly noisy, observations.
///
/// An observation is the concatenation of the last `state_stack` frames,
/// the oldest first. After a reset all the frames are copies of the initial
/// one. Each action is applied for `action_repeat` physics steps and the
/// rewards of those steps are summed.
///
/// A step reports `is_done` when the cumulative reward of the episode falls
/// below `done_reward_threshold` and `is_dead` when the episode reaches
/// `max_steps` physics steps.
pub struct PendulumEnv {
    config: PendulumConfig,
    pendulum: Pendulum,
    frames: VecDeque<[f32; crate::OBS_DIM]>,
    action_space: ActionSpace,
    rng: StdRng,
    sigma: f32,
    steps: usize,
    score: f32,
}

impl PendulumEnv {
    fn draw_sigma(&mut self) -> f32 {
        match self.config.noise {
            None => 0.0,
            Some(NoiseConfig::Fixed(sigma)) => sigma,
            Some(NoiseConfig::Bounds(lower, upper)) if lower < upper => {
                self.rng.gen_range(lower..upper)
            }
            Some(NoiseConfig::Bounds(lower, _)) => lower,
        }
    }

    fn push_frame(&mut self) -> Result<()> {
        let mut frame = self.pendulum.obs();
        if self.sigma > 0.0 {
            let normal = Normal::new(0.0, self.sigma)
                .map_err(|e| anyhow!("Invalid noise sigma {}: {}", self.sigma, e))?;
            for x in frame.iter_mut() {
                *x += normal.sample(&mut self.rng);
            }
        }
        if self.frames.len() == self.config.state_stack {
            self.frames.pop_front();
        }
        self.frames.push_back(frame);
        Ok(())
    }

    fn obs(&self) -> Vec<f32> {
        self.frames.iter().flat_map(|f| f.iter().copied()).collect()
    }

    /// Number of physics steps since the last reset.
    pub fn steps(&self) -> usize {
        self.steps
    }
}

impl Env for PendulumEnv {
    type Config = PendulumConfig;

    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        if config.state_stack == 0 || config.action_repeat == 0 {
            return Err(UppoError::InvalidConfig(
                "state_stack and action_repeat must be positive".to_string(),
            )
            .into());
        }
        Ok(Self {
            config: config.clone(),
            pendulum: Pendulum::default(),
            frames: VecDeque::with_capacity(config.state_stack),
            action_space: ActionSpace::new(vec![-MAX_TORQUE], vec![MAX_TORQUE]),
            rng: StdRng::seed_from_u64(seed as u64),
            sigma: 0.0,
            steps: 0,
            score: 0.0,
        })
    }

    fn reset(&mut self) -> Result<Vec<f32>> {
        self.pendulum.reset(&mut self.rng);
        self.sigma = self.draw_sigma();
        self.steps = 0;
        self.score = 0.0;
        self.frames.clear();
        self.push_frame()?;
        while self.frames.len() < self.config.state_stack {
            let first = self.frames[0];
            self.frames.push_back(first);
        }
        trace!("Reset pendulum, noise sigma {}", self.sigma);
        Ok(self.obs())
    }

    fn step(&mut self, act: &[f32]) -> Result<EnvStep> {
        let torque = *act
            .first()
            .ok_or_else(|| anyhow!("Empty action given to the pendulum"))?;

        let mut reward = 0.0;
        let mut is_dead = false;
        for _ in 0..self.config.action_repeat {
            reward += self.pendulum.step(torque);
            self.steps += 1;
            if self.steps >= self.config.max_steps {
                is_dead = true;
                break;
            }
        }
        self.score += reward;
        self.push_frame()?;

        Ok(EnvStep {
            obs: self.obs(),
            reward,
            is_done: self.score < self.config.done_reward_threshold,
            is_dead,
        })
    }

    fn action_space(&self) -> &ActionSpace {
        &self.action_space
    }

    fn reward_threshold(&self) -> f32 {
        self.config.reward_threshold
    }

    fn random_noise(&self) -> f32 {
        self.sigma
    }
}
