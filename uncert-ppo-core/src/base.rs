//! Core interfaces.
mod agent;
mod env;
pub use agent::{ActionSelection, Mode, UncertAgent, UncertaintyPair};
pub use env::{ActionSpace, Env, EnvStep};
