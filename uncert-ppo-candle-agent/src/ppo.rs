//! PPO update of the ensemble members.
use crate::{
    actor_critic::PolicyOutput,
    ensemble::{Ensemble, Member},
    model::SubModel1,
    util::{beta_entropy, beta_log_prob, CriticLoss},
};
use anyhow::{ensure, Result};
use candle_core::{Device, Tensor, D};
use log::{debug, trace};
use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};
use uncert_ppo_core::{
    error::UppoError,
    record::{Record, RecordValue::Scalar},
    Transition,
};

/// Hyperparameters of the PPO update.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
#[serde(default)]
pub struct PpoConfig {
    /// Discount factor.
    pub gamma: f64,

    /// Number of passes over the drained transitions per update.
    pub ppo_epoch: usize,

    /// Clipping range of the probability ratio.
    pub clip_param: f64,

    /// Size of mini-batches.
    pub batch_size: usize,

    /// Weight of the value loss.
    pub value_loss_coef: f64,

    /// Weight of the entropy bonus.
    pub entropy_coef: f64,

    /// Type of value loss.
    pub critic_loss: CriticLoss,
}

impl Default for PpoConfig {
    fn default() -> Self {
        Self {
            gamma: 0.99,
            ppo_epoch: 20,
            clip_param: 0.1,
            batch_size: 128,
            value_loss_coef: 2.0,
            entropy_coef: 0.0,
            critic_loss: CriticLoss::Mse,
        }
    }
}

impl PpoConfig {
    /// Sets the discount factor.
    pub fn gamma(mut self, v: f64) -> Self {
        self.gamma = v;
        self
    }

    /// Sets the number of passes per update.
    pub fn ppo_epoch(mut self, v: usize) -> Self {
        self.ppo_epoch = v;
        self
    }

    /// Sets the clipping range.
    pub fn clip_param(mut self, v: f64) -> Self {
        self.clip_param = v;
        self
    }

    /// Sets the mini-batch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Sets the weight of the value loss.
    pub fn value_loss_coef(mut self, v: f64) -> Self {
        self.value_loss_coef = v;
        self
    }

    /// Sets the weight of the entropy bonus.
    pub fn entropy_coef(mut self, v: f64) -> Self {
        self.entropy_coef = v;
        self
    }

    /// Sets the type of value loss.
    pub fn critic_loss(mut self, v: CriticLoss) -> Self {
        self.critic_loss = v;
        self
    }
}

/// Transitions of a full buffer as tensors.
pub struct RolloutBatch {
    /// States, `(n, state_dim)`.
    pub state: Tensor,
    /// Raw actions in `[0, 1]`, `(n, action_dim)`.
    pub action: Tensor,
    /// Rewards, `(n,)`.
    pub reward: Tensor,
    /// Next states, `(n, state_dim)`.
    pub next_state: Tensor,
    /// Log probabilities under the behavior policy, `(n,)`.
    pub old_log_prob: Tensor,
}

impl RolloutBatch {
    /// Stacks transitions into tensors.
    ///
    /// Fails if the transitions do not share the same dimensions.
    pub fn from_transitions(transitions: &[Transition], device: &Device) -> Result<Self> {
        ensure!(!transitions.is_empty(), "No transition to learn from");
        let n = transitions.len();
        let stack = |f: fn(&Transition) -> &[f32]| -> Result<Tensor> {
            let data = transitions
                .iter()
                .flat_map(|t| f(t).iter().copied())
                .collect::<Vec<_>>();
            let dim = f(&transitions[0]).len();
            Ok(Tensor::from_vec(data, (n, dim), device)?)
        };
        let scalars = |f: fn(&Transition) -> f32| -> Result<Tensor> {
            let data = transitions.iter().map(f).collect::<Vec<_>>();
            Ok(Tensor::from_vec(data, (n,), device)?)
        };

        Ok(Self {
            state: stack(|t| t.state.as_slice())?,
            action: stack(|t| t.action.as_slice())?,
            reward: scalars(|t| t.reward)?,
            next_state: stack(|t| t.next_state.as_slice())?,
            old_log_prob: scalars(|t| t.action_log_prob)?,
        })
    }

    /// Number of transitions.
    pub fn len(&self) -> usize {
        self.reward.dims()[0]
    }

    /// Returns `true` if the batch has no transition.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Clipped surrogate objective of PPO, negated to be minimized.
///
/// `-mean(min(ratio * adv, clip(ratio, 1 - eps, 1 + eps) * adv))`
pub fn clipped_surrogate_loss(ratio: &Tensor, adv: &Tensor, clip_param: f64) -> Result<Tensor> {
    let surr1 = (ratio * adv)?;
    let surr2 = (ratio.clamp(1.0 - clip_param, 1.0 + clip_param)? * adv)?;
    Ok(surr1.minimum(&surr2)?.mean_all()?.neg()?)
}

/// Statistics of an update, averaged over gradient steps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PpoStats {
    /// Number of gradient steps summed over members.
    pub n_grad_steps: usize,
    /// Clipped surrogate loss.
    pub policy_loss: f32,
    /// Value loss.
    pub value_loss: f32,
    /// Mean entropy of the member policies.
    pub entropy: f32,
}

impl PpoStats {
    fn add(&mut self, policy_loss: f32, value_loss: f32, entropy: f32) {
        self.n_grad_steps += 1;
        self.policy_loss += policy_loss;
        self.value_loss += value_loss;
        self.entropy += entropy;
    }

    fn finish(mut self) -> Self {
        let n = self.n_grad_steps.max(1) as f32;
        self.policy_loss /= n;
        self.value_loss /= n;
        self.entropy /= n;
        self
    }

    /// Converts the statistics into a record.
    pub fn to_record(&self) -> Record {
        Record::from_slice(&[
            ("n_grad_steps", Scalar(self.n_grad_steps as _)),
            ("policy_loss", Scalar(self.policy_loss)),
            ("value_loss", Scalar(self.value_loss)),
            ("entropy", Scalar(self.entropy)),
        ])
    }
}

/// Targets shared by all the members, computed with the mean ensemble.
struct Targets {
    target_v: Tensor,
    adv: Tensor,
}

fn targets<P>(ensemble: &Ensemble<P>, batch: &RolloutBatch, gamma: f64) -> Result<Targets>
where
    P: SubModel1<Input = Tensor, Output = PolicyOutput>,
{
    let next_v = ensemble.act(&batch.next_state)?.value_1d()?;
    let target_v = (&batch.reward + (next_v * gamma)?)?.detach();
    let v = ensemble.act(&batch.state)?.value_1d()?;
    let adv = (&target_v - v)?.detach();
    Ok(Targets { target_v, adv })
}

/// One gradient step of a member on the mini-batch `ix`.
fn train_once<P>(
    member: &mut Member<P>,
    batch: &RolloutBatch,
    targets: &Targets,
    ix: &Tensor,
    config: &PpoConfig,
) -> Result<(f32, f32, f32)>
where
    P: SubModel1<Input = Tensor, Output = PolicyOutput>,
{
    let state = batch.state.index_select(ix, 0)?;
    let action = batch.action.index_select(ix, 0)?;
    let old_log_prob = batch.old_log_prob.index_select(ix, 0)?;
    let target_v = targets.target_v.index_select(ix, 0)?;
    let adv = targets.adv.index_select(ix, 0)?;

    let out = member.forward(&state)?;
    let log_prob = beta_log_prob(&action, &out.alpha, &out.beta)?.sum(D::Minus1)?;
    let ratio = (log_prob - old_log_prob)?.exp()?;

    let policy_loss = clipped_surrogate_loss(&ratio, &adv, config.clip_param)?;
    let value_loss = config.critic_loss.loss(&out.value_1d()?, &target_v)?;
    let entropy = beta_entropy(&out.alpha, &out.beta)?
        .sum(D::Minus1)?
        .mean_all()?;
    let loss = ((&policy_loss + (&value_loss * config.value_loss_coef)?)?
        - (&entropy * config.entropy_coef)?)?;

    member.backward_step(&loss)?;

    Ok((
        policy_loss.to_scalar::<f32>()?,
        value_loss.to_scalar::<f32>()?,
        entropy.to_scalar::<f32>()?,
    ))
}

/// Draws one permutation of `0..n` for each of `n_members` members.
fn draw_permutations<R: Rng>(n_members: usize, n: usize, rng: &mut R) -> Vec<Vec<u32>> {
    (0..n_members)
        .map(|_| {
            let mut perm = (0..n as u32).collect::<Vec<_>>();
            perm.shuffle(&mut *rng);
            perm
        })
        .collect()
}

/// Order of the gradient steps as `(epoch, member, mini-batch)`.
///
/// Every epoch visits the members in turn, and each member walks through the
/// chunks of its own permutation.
fn schedule<'a>(
    perms: &'a [Vec<u32>],
    ppo_epoch: usize,
    batch_size: usize,
) -> impl Iterator<Item = (usize, usize, &'a [u32])> + 'a {
    (0..ppo_epoch).flat_map(move |epoch| {
        perms.iter().enumerate().flat_map(move |(i, perm)| {
            perm.chunks(batch_size).map(move |chunk| (epoch, i, chunk))
        })
    })
}

/// Runs the PPO update on the transitions of a full buffer.
///
/// The targets are computed once with the mean ensemble. Each member then
/// draws its own permutation of the transitions, which is reused in all the
/// `ppo_epoch` passes, and takes one gradient step per mini-batch.
pub fn update<P, R>(
    ensemble: &mut Ensemble<P>,
    transitions: &[Transition],
    config: &PpoConfig,
    rng: &mut R,
) -> Result<PpoStats>
where
    P: SubModel1<Input = Tensor, Output = PolicyOutput>,
    R: Rng,
{
    if config.batch_size == 0 {
        return Err(UppoError::InvalidConfig("batch_size must be positive".to_string()).into());
    }
    let device = ensemble.device().clone();
    let batch = RolloutBatch::from_transitions(transitions, &device)?;
    let targets = targets(ensemble, &batch, config.gamma)?;

    let perms = draw_permutations(ensemble.len(), batch.len(), rng);

    let mut stats = PpoStats::default();
    for (epoch, i, chunk) in schedule(&perms, config.ppo_epoch, config.batch_size) {
        let member = &mut ensemble.members_mut()[i];
        let ix = Tensor::from_slice(chunk, (chunk.len(),), &device)?;
        let (pl, vl, ent) = train_once(member, &batch, &targets, &ix, config)?;
        trace!(
            "epoch {}, member {}: policy_loss = {}, value_loss = {}",
            epoch,
            i,
            pl,
            vl
        );
        stats.add(pl, vl, ent);
    }

    let stats = stats.finish();
    debug!("{:?}", stats);
    Ok(stats)
}
