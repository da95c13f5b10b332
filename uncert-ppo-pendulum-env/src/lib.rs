//! Pendulum swing-up environment.
//!
//! [`PendulumEnv`] wraps the classic pendulum dynamics ([`Pendulum`]) with
//! observation stacking, action repeat and Gaussian observation noise, and
//! implements [`Env`](uncert_ppo_core::Env).
mod config;
mod env;
mod pendulum;
pub use config::{NoiseConfig, PendulumConfig};
pub use env::PendulumEnv;
pub use pendulum::{Pendulum, MAX_SPEED, MAX_TORQUE, OBS_DIM};
