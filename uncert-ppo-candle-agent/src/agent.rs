//! PPO agent with a bootstrap ensemble.
mod config;
use crate::{
    actor_critic::PolicyOutput,
    checkpoint,
    ensemble::Ensemble,
    ppo::{self, PpoConfig},
    uncertainty::decompose,
    util::beta_log_prob,
};
use anyhow::{anyhow, Result};
pub use config::{BootstrapAgentConfig, UncertModel};
use candle_core::{Device, Tensor};
use log::{debug, info};
use rand::{rngs::StdRng, SeedableRng};
use rand_distr::{Beta, Distribution};
use std::path::Path;
use uncert_ppo_core::{
    record::Record, ActionSelection, Mode, Transition, TransitionBuffer, UncertAgent,
    UncertaintyPair,
};

/// PPO agent whose policy is the mean of an ensemble of actor-critic networks.
///
/// The variant is chosen once with [`UncertModel`]: [`UncertModel::Base`]
/// keeps a single network and reports zero uncertainty, while
/// [`UncertModel::Bootstrap`] keeps `nb_nets` networks and reports the spread
/// of their value predictions as the epistemic uncertainty.
pub struct BootstrapAgent {
    model: UncertModel,
    ensemble: Ensemble,
    buffer: TransitionBuffer,
    ppo_config: PpoConfig,
    rng: StdRng,
    train: bool,
    device: Device,
    n_updates: usize,
    n_grad_steps: usize,
}

impl BootstrapAgent {
    /// Constructs the agent.
    pub fn build(config: BootstrapAgentConfig) -> Result<Self> {
        let device = config.device.build()?;
        let nb_nets = config.model.n_members(config.nb_nets);
        let ensemble = Ensemble::build(
            config.actor_critic_config.clone(),
            nb_nets,
            &config.opt_config,
            device.clone(),
        )?;
        info!(
            "Built {:?} agent with {} member(s), buffer capacity {}",
            config.model, nb_nets, config.buffer_capacity
        );

        Ok(Self {
            model: config.model,
            ensemble,
            buffer: TransitionBuffer::new(config.buffer_capacity),
            ppo_config: config.ppo_config,
            rng: StdRng::seed_from_u64(config.seed),
            train: false,
            device,
            n_updates: 0,
            n_grad_steps: 0,
        })
    }

    /// The variant of the agent.
    pub fn model(&self) -> UncertModel {
        self.model
    }

    /// The ensemble.
    pub fn ensemble(&self) -> &Ensemble {
        &self.ensemble
    }

    /// Mutable reference to the ensemble.
    pub fn ensemble_mut(&mut self) -> &mut Ensemble {
        &mut self.ensemble
    }

    /// Number of calls of [`UncertAgent::update`].
    pub fn n_updates(&self) -> usize {
        self.n_updates
    }

    /// Number of gradient steps summed over members.
    pub fn n_grad_steps(&self) -> usize {
        self.n_grad_steps
    }

    /// Number of transitions in the buffer.
    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    fn uncertainty(&self, outputs: &[PolicyOutput]) -> Result<UncertaintyPair> {
        match self.model {
            UncertModel::Base => Ok(UncertaintyPair::default()),
            UncertModel::Bootstrap => decompose(outputs),
        }
    }

    fn sample_beta(&mut self, alpha: &[f32], beta: &[f32]) -> Result<Vec<f32>> {
        let rng = &mut self.rng;
        alpha
            .iter()
            .zip(beta)
            .map(|(&a, &b)| -> Result<f32> {
                let dist = Beta::new(a, b)
                    .map_err(|e| anyhow!("Invalid Beta parameters ({}, {}): {}", a, b, e))?;
                Ok(dist.sample(&mut *rng))
            })
            .collect()
    }
}

impl UncertAgent for BootstrapAgent {
    fn train(&mut self) {
        self.train = true;
    }

    fn eval(&mut self) {
        self.train = false;
    }

    fn is_train(&self) -> bool {
        self.train
    }

    fn select_action(&mut self, state: &[f32], eval: bool) -> Result<ActionSelection> {
        let xs = Tensor::from_slice(state, (1, state.len()), &self.device)?;
        let outputs = self.ensemble.predict(&xs)?;
        let uncertainty = self.uncertainty(&outputs)?;
        let mean = PolicyOutput::mean(&outputs)?;
        let alpha = mean.alpha.flatten_all()?.to_vec1::<f32>()?;
        let beta = mean.beta.flatten_all()?.to_vec1::<f32>()?;

        let action = match eval {
            true => alpha.iter().zip(&beta).map(|(a, b)| a / (a + b)).collect(),
            false => self.sample_beta(&alpha, &beta)?,
        };
        let log_prob = {
            let a = Tensor::from_slice(action.as_slice(), (1, action.len()), &self.device)?;
            beta_log_prob(&a, &mean.alpha, &mean.beta)?
                .sum_all()?
                .to_scalar::<f32>()?
        };

        Ok(ActionSelection {
            action,
            log_prob,
            uncertainty,
        })
    }

    fn store_transition(&mut self, transition: Transition) -> Result<bool> {
        self.buffer.store(transition)
    }

    fn update(&mut self) -> Result<Record> {
        let transitions = self.buffer.drain()?;
        let stats = ppo::update(
            &mut self.ensemble,
            &transitions,
            &self.ppo_config,
            &mut self.rng,
        )?;
        self.n_updates += 1;
        self.n_grad_steps += stats.n_grad_steps;
        debug!("Update {} done", self.n_updates);

        Ok(stats.to_record())
    }

    fn empty_buffer(&mut self) {
        self.buffer.clear();
    }

    fn save(&self, epoch: usize, path: &Path) -> Result<()> {
        checkpoint::save(&self.ensemble, epoch, path)
    }

    fn load(&mut self, path: &Path, mode: Mode) -> Result<usize> {
        let epoch = checkpoint::load(&mut self.ensemble, path)?;
        match mode {
            Mode::Train => self.train(),
            Mode::Eval => self.eval(),
        }
        Ok(epoch)
    }
}
