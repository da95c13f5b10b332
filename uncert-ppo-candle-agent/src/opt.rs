//! Optimizers.
//!
//! The optimizer keeps its moment estimates per named variable, so that they
//! can be written to and restored from a checkpoint together with the
//! parameters of the model.
use anyhow::{anyhow, Result};
use candle_core::{backprop::GradStore, Tensor, Var};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Configuration of optimizer for training neural networks in an RL agent.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub enum OptimizerConfig {
    /// Adam optimizer.
    Adam {
        /// Learning rate.
        lr: f64,
        #[serde(default = "default_beta1")]
        beta1: f64,
        #[serde(default = "default_beta2")]
        beta2: f64,
        #[serde(default = "default_eps")]
        eps: f64,
    },
}

fn default_beta1() -> f64 {
    0.9
}

fn default_beta2() -> f64 {
    0.999
}

fn default_eps() -> f64 {
    1e-8
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self::Adam {
            lr: 1e-3,
            beta1: default_beta1(),
            beta2: default_beta2(),
            eps: default_eps(),
        }
    }
}

impl OptimizerConfig {
    /// Constructs an optimizer of the given named variables.
    pub fn build(&self, vars: Vec<(String, Var)>) -> Result<Optimizer> {
        match &self {
            OptimizerConfig::Adam {
                lr,
                beta1,
                beta2,
                eps,
            } => {
                let params = ParamsAdam {
                    lr: *lr,
                    beta1: *beta1,
                    beta2: *beta2,
                    eps: *eps,
                };
                Ok(Optimizer::Adam(Adam::new(vars, params)?))
            }
        }
    }

    /// Override learning rate.
    pub fn learning_rate(self, lr: f64) -> Self {
        match self {
            Self::Adam {
                lr: _,
                beta1,
                beta2,
                eps,
            } => Self::Adam {
                lr,
                beta1,
                beta2,
                eps,
            },
        }
    }
}

/// Parameters of [`Adam`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamsAdam {
    /// Learning rate.
    pub lr: f64,
    /// Decay of the first moment.
    pub beta1: f64,
    /// Decay of the second moment.
    pub beta2: f64,
    /// Term added to the denominator.
    pub eps: f64,
}

struct AdamVar {
    name: String,
    var: Var,
    m: Var,
    v: Var,
}

/// Adam optimizer with accessible state.
pub struct Adam {
    vars: Vec<AdamVar>,
    params: ParamsAdam,
    step_t: usize,
}

impl Adam {
    /// Constructs the optimizer with zero moment estimates.
    pub fn new(vars: Vec<(String, Var)>, params: ParamsAdam) -> Result<Self> {
        let vars = vars
            .into_iter()
            .filter(|(_, var)| var.dtype().is_float())
            .map(|(name, var)| -> Result<AdamVar> {
                let m = Var::zeros(var.shape(), var.dtype(), var.device())?;
                let v = Var::zeros(var.shape(), var.dtype(), var.device())?;
                Ok(AdamVar { name, var, m, v })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            vars,
            params,
            step_t: 0,
        })
    }

    /// Updates the variables with the given gradients.
    ///
    /// Variables without gradient are left unchanged.
    pub fn step(&mut self, grads: &GradStore) -> Result<()> {
        self.step_t += 1;
        let ParamsAdam {
            lr,
            beta1,
            beta2,
            eps,
        } = self.params;
        let scale_m = 1.0 / (1.0 - beta1.powi(self.step_t as i32));
        let scale_v = 1.0 / (1.0 - beta2.powi(self.step_t as i32));

        for AdamVar { var, m, v, .. } in self.vars.iter() {
            if let Some(g) = grads.get(var.as_tensor()) {
                let next_m = ((m.as_tensor() * beta1)? + (g * (1.0 - beta1))?)?;
                let next_v = ((v.as_tensor() * beta2)? + (g.sqr()? * (1.0 - beta2))?)?;
                let m_hat = (&next_m * scale_m)?;
                let v_hat = (&next_v * scale_v)?;
                let delta = (m_hat / (v_hat.sqrt()? + eps)?)?;
                var.set(&var.sub(&(delta * lr)?)?)?;
                m.set(&next_m)?;
                v.set(&next_v)?;
            }
        }

        Ok(())
    }

    /// Computes the gradients of the loss and applies a step.
    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        let grads = loss.backward()?;
        self.step(&grads)
    }

    /// Number of steps applied so far.
    pub fn step_count(&self) -> usize {
        self.step_t
    }

    /// Moment estimates keyed by `m.<name>` and `v.<name>`.
    pub fn state(&self) -> HashMap<String, Tensor> {
        let mut state = HashMap::new();
        for AdamVar { name, m, v, .. } in self.vars.iter() {
            state.insert(format!("m.{}", name), m.as_tensor().clone());
            state.insert(format!("v.{}", name), v.as_tensor().clone());
        }
        state
    }

    /// Restores the state written by [`Adam::state`].
    pub fn load_state(&mut self, state: &HashMap<String, Tensor>, step_count: usize) -> Result<()> {
        for AdamVar { name, m, v, .. } in self.vars.iter() {
            for (prefix, dst) in [("m", m), ("v", v)] {
                let key = format!("{}.{}", prefix, name);
                let src = state
                    .get(&key)
                    .ok_or_else(|| anyhow!("Optimizer state {} is missing", key))?;
                dst.set(&src.to_device(dst.device())?)?;
            }
        }
        self.step_t = step_count;
        Ok(())
    }
}

/// Optimizers.
pub enum Optimizer {
    /// Adam optimizer.
    Adam(Adam),
}

impl Optimizer {
    /// Applies a backward step pass.
    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        match self {
            Self::Adam(opt) => opt.backward_step(loss),
        }
    }

    /// Number of steps applied so far.
    pub fn step_count(&self) -> usize {
        match self {
            Self::Adam(opt) => opt.step_count(),
        }
    }

    /// Internal state of the optimizer.
    pub fn state(&self) -> HashMap<String, Tensor> {
        match self {
            Self::Adam(opt) => opt.state(),
        }
    }

    /// Restores the internal state of the optimizer.
    pub fn load_state(&mut self, state: &HashMap<String, Tensor>, step_count: usize) -> Result<()> {
        match self {
            Self::Adam(opt) => opt.load_state(state, step_count),
        }
    }
}
