//! Ensemble of independently parameterized actor-critic networks.
use crate::{
    actor_critic::{ActorCritic, PolicyOutput},
    model::SubModel1,
    opt::{Optimizer, OptimizerConfig},
};
use anyhow::{anyhow, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::{VarBuilder, VarMap};
use std::collections::HashMap;

/// A network of the ensemble together with its parameters and optimizer.
pub struct Member<P = ActorCritic> {
    varmap: VarMap,
    model: P,
    opt: Optimizer,
}

impl<P> Member<P>
where
    P: SubModel1<Input = Tensor, Output = PolicyOutput>,
{
    /// Builds a member with freshly initialized parameters.
    pub fn build(config: P::Config, opt_config: &OptimizerConfig, device: &Device) -> Result<Self> {
        let varmap = VarMap::new();
        let model = {
            let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
            P::build(vb, config)?
        };
        let opt = opt_config.build(Self::named_vars(&varmap)?)?;

        Ok(Self { varmap, model, opt })
    }

    /// Variables sorted by name.
    fn named_vars(varmap: &VarMap) -> Result<Vec<(String, candle_core::Var)>> {
        let data = varmap
            .data()
            .lock()
            .map_err(|_| anyhow!("VarMap lock is poisoned"))?;
        let mut vars = data
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect::<Vec<_>>();
        vars.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(vars)
    }

    /// Forward pass on a batch of states.
    pub fn forward(&self, xs: &Tensor) -> Result<PolicyOutput> {
        self.model.forward(xs)
    }

    /// Computes gradients of `loss` and applies an optimizer step.
    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        self.opt.backward_step(loss)
    }

    /// Number of optimizer steps applied to this member.
    pub fn step_count(&self) -> usize {
        self.opt.step_count()
    }

    /// Writes the parameters as `<prefix>model.<name>` and the optimizer
    /// state as `<prefix>opt.<key>` into `dst`.
    pub fn state_dict(&self, prefix: &str, dst: &mut HashMap<String, Tensor>) -> Result<()> {
        for (name, var) in Self::named_vars(&self.varmap)? {
            dst.insert(format!("{}model.{}", prefix, name), var.as_tensor().clone());
        }
        for (key, t) in self.opt.state() {
            dst.insert(format!("{}opt.{}", prefix, key), t);
        }
        dst.insert(
            format!("{}opt.step", prefix),
            Tensor::new(&[self.step_count() as i64], &Device::Cpu)?,
        );
        Ok(())
    }

    /// Restores the state written by [`Member::state_dict`].
    pub fn load_state_dict(&mut self, prefix: &str, src: &HashMap<String, Tensor>) -> Result<()> {
        let get = |key: String| {
            src.get(&key)
                .ok_or_else(|| anyhow!("Tensor {} is missing in the checkpoint", key))
        };

        for (name, var) in Self::named_vars(&self.varmap)? {
            let t = get(format!("{}model.{}", prefix, name))?;
            var.set(&t.to_device(var.device())?.to_dtype(var.dtype())?)?;
        }

        let opt_prefix = format!("{}opt.", prefix);
        let opt_state = src
            .iter()
            .filter_map(|(k, v)| {
                k.strip_prefix(&opt_prefix)
                    .map(|name| (name.to_string(), v.clone()))
            })
            .collect::<HashMap<_, _>>();
        let step = get(format!("{}opt.step", prefix))?.to_vec1::<i64>()?;
        let step = step
            .first()
            .ok_or_else(|| anyhow!("Empty optimizer step in the checkpoint"))?;
        self.opt.load_state(&opt_state, *step as usize)
    }
}

/// Ordered collection of a fixed number of [`Member`]s.
pub struct Ensemble<P = ActorCritic> {
    members: Vec<Member<P>>,
    device: Device,
}

impl<P> Ensemble<P>
where
    P: SubModel1<Input = Tensor, Output = PolicyOutput>,
    P::Config: Clone,
{
    /// Builds `nb_nets` members of the same architecture.
    pub fn build(
        config: P::Config,
        nb_nets: usize,
        opt_config: &OptimizerConfig,
        device: Device,
    ) -> Result<Self> {
        let members = (0..nb_nets)
            .map(|_| Member::build(config.clone(), opt_config, &device))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { members, device })
    }
}

impl<P> Ensemble<P>
where
    P: SubModel1<Input = Tensor, Output = PolicyOutput>,
{
    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` if the ensemble has no member.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Device of the parameters.
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Members.
    pub fn members(&self) -> &[Member<P>] {
        &self.members
    }

    /// Mutable reference to the members.
    pub fn members_mut(&mut self) -> &mut [Member<P>] {
        &mut self.members
    }

    /// Outputs of every member on the same batch of states.
    pub fn predict(&self, xs: &Tensor) -> Result<Vec<PolicyOutput>> {
        self.members.iter().map(|m| m.forward(xs)).collect()
    }

    /// Member mean of the outputs, the policy deployed by the agent.
    pub fn act(&self, xs: &Tensor) -> Result<PolicyOutput> {
        PolicyOutput::mean(&self.predict(xs)?)
    }
}
