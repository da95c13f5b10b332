//! Bootstrap ensemble PPO agent implemented with [candle](https://crates.io/crates/candle-core).
//!
//! The agent keeps `nb_nets` actor-critic networks, each with its own
//! parameters and optimizer. Actions are drawn from the Beta distribution
//! whose parameters are the member mean, and the spread of the value
//! predictions across members is reported as the epistemic uncertainty.
pub mod actor_critic;
mod agent;
pub mod checkpoint;
pub mod ensemble;
pub mod mlp;
pub mod model;
pub mod opt;
pub mod ppo;
pub mod uncertainty;
pub mod util;
pub use agent::{BootstrapAgent, BootstrapAgentConfig, UncertModel};
use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Copy, Deserialize, Serialize, PartialEq)]
/// Device for using candle.
///
/// This enum is added because [`candle_core::Device`] does not support serialization.
pub enum Device {
    /// The main CPU device.
    Cpu,

    /// The main GPU device.
    Cuda(usize),
}

impl Default for Device {
    fn default() -> Self {
        Self::Cpu
    }
}

impl Device {
    /// Creates the corresponding [`candle_core::Device`].
    ///
    /// Fails for [`Device::Cuda`] if candle was built without CUDA support.
    pub fn build(self) -> Result<candle_core::Device> {
        match self {
            Self::Cpu => Ok(candle_core::Device::Cpu),
            Self::Cuda(n) => Ok(candle_core::Device::new_cuda(n)?),
        }
    }
}
