//! Actor-critic network with a Beta policy head.
use crate::{
    mlp::{Mlp, MlpConfig},
    model::SubModel1,
    util::softplus,
};
use anyhow::{ensure, Result};
use candle_core::{Module, Tensor};
use candle_nn::{linear, Linear, VarBuilder};
use serde::{Deserialize, Serialize};

/// Output of an actor-critic network for a batch of states.
#[derive(Debug, Clone)]
pub struct PolicyOutput {
    /// First shape parameter of the Beta distribution, `(batch, action_dim)`.
    pub alpha: Tensor,

    /// Second shape parameter of the Beta distribution, `(batch, action_dim)`.
    pub beta: Tensor,

    /// State value, `(batch, 1)`.
    pub value: Tensor,
}

impl PolicyOutput {
    /// Element-wise mean of the outputs of ensemble members.
    pub fn mean(outputs: &[PolicyOutput]) -> Result<Self> {
        ensure!(!outputs.is_empty(), "No output to average");
        let mean = |f: fn(&PolicyOutput) -> &Tensor| -> Result<Tensor> {
            let ts = outputs.iter().map(f).collect::<Vec<_>>();
            Ok(Tensor::stack(&ts, 0)?.mean(0)?)
        };

        Ok(Self {
            alpha: mean(|o| &o.alpha)?,
            beta: mean(|o| &o.beta)?,
            value: mean(|o| &o.value)?,
        })
    }

    /// Values as a 1-dimensional tensor of the batch size.
    pub fn value_1d(&self) -> Result<Tensor> {
        Ok(self.value.squeeze(1)?)
    }
}

/// Configuration of [`ActorCritic`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct ActorCriticConfig {
    /// Dimension of the (stacked) state.
    pub state_dim: usize,

    /// Dimension of the action.
    pub action_dim: usize,

    /// Widths of the hidden layers shared by the actor and the critic bodies.
    pub architecture: Vec<usize>,
}

impl Default for ActorCriticConfig {
    fn default() -> Self {
        Self {
            state_dim: 3,
            action_dim: 1,
            architecture: vec![1024],
        }
    }
}

impl ActorCriticConfig {
    /// Creates a configuration.
    pub fn new(state_dim: usize, action_dim: usize, architecture: Vec<usize>) -> Self {
        Self {
            state_dim,
            action_dim,
            architecture,
        }
    }

    fn body_config(&self) -> Result<MlpConfig> {
        ensure!(
            !self.architecture.is_empty(),
            "architecture must have at least one layer"
        );
        let n = self.architecture.len();
        Ok(MlpConfig::new(
            self.state_dim,
            self.architecture[..n - 1].to_vec(),
            self.architecture[n - 1],
            true,
        ))
    }
}

/// Separate actor and critic networks over the same state.
///
/// The actor body is followed by two heads giving `softplus(x) + 1` for the
/// Beta parameters, so both are greater than one. The critic body is
/// followed by a linear head giving the state value.
pub struct ActorCritic {
    actor_body: Mlp,
    alpha_head: Linear,
    beta_head: Linear,
    critic_body: Mlp,
    value_head: Linear,
}

impl SubModel1 for ActorCritic {
    type Config = ActorCriticConfig;
    type Input = Tensor;
    type Output = PolicyOutput;

    fn build(vb: VarBuilder, config: Self::Config) -> Result<Self> {
        let body_config = config.body_config()?;
        let hidden = body_config.out_dim();
        let vb_actor = vb.pp("actor");
        let vb_critic = vb.pp("critic");

        Ok(Self {
            actor_body: Mlp::build(vb_actor.clone(), body_config.clone())?,
            alpha_head: linear(hidden, config.action_dim, vb_actor.pp("alpha"))?,
            beta_head: linear(hidden, config.action_dim, vb_actor.pp("beta"))?,
            critic_body: Mlp::build(vb_critic.clone(), body_config)?,
            value_head: linear(hidden, 1, vb_critic.pp("v"))?,
        })
    }

    fn forward(&self, xs: &Tensor) -> Result<PolicyOutput> {
        let h = self.actor_body.forward(xs)?;
        let alpha = softplus(&self.alpha_head.forward(&h)?)?.affine(1.0, 1.0)?;
        let beta = softplus(&self.beta_head.forward(&h)?)?.affine(1.0, 1.0)?;
        let value = self.value_head.forward(&self.critic_body.forward(xs)?)?;

        Ok(PolicyOutput { alpha, beta, value })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use candle_core::{DType, Device};
    use candle_nn::VarMap;

    #[test]
    fn test_output_shapes_and_bounds() -> Result<()> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let model = ActorCritic::build(vb, ActorCriticConfig::new(6, 2, vec![32, 16]))?;
        let xs = Tensor::randn(0f32, 3f32, (4, 6), &Device::Cpu)?;
        let out = model.forward(&xs)?;

        assert_eq!(out.alpha.dims(), [4, 2]);
        assert_eq!(out.beta.dims(), [4, 2]);
        assert_eq!(out.value.dims(), [4, 1]);
        assert_eq!(out.value_1d()?.dims(), [4]);

        let min_alpha = out.alpha.flatten_all()?.min(0)?.to_scalar::<f32>()?;
        let min_beta = out.beta.flatten_all()?.min(0)?.to_scalar::<f32>()?;
        assert!(min_alpha >= 1.0 && min_beta >= 1.0);
        Ok(())
    }

    #[test]
    fn test_empty_architecture_is_rejected() {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        assert!(ActorCritic::build(vb, ActorCriticConfig::new(3, 1, vec![])).is_err());
    }

    #[test]
    fn test_mean_of_outputs() -> Result<()> {
        let dev = Device::Cpu;
        let output = |v: f32| -> Result<PolicyOutput> {
            Ok(PolicyOutput {
                alpha: Tensor::full(v, (1, 1), &dev)?,
                beta: Tensor::full(2.0 * v, (1, 1), &dev)?,
                value: Tensor::full(-v, (1, 1), &dev)?,
            })
        };
        let mean = PolicyOutput::mean(&[output(1.0)?, output(3.0)?])?;
        assert_eq!(mean.alpha.flatten_all()?.to_vec1::<f32>()?, vec![2.0]);
        assert_eq!(mean.beta.flatten_all()?.to_vec1::<f32>()?, vec![4.0]);
        assert_eq!(mean.value.flatten_all()?.to_vec1::<f32>()?, vec![-2.0]);
        Ok(())
    }
}
