#![warn(missing_docs)]
//! Core of the uncertainty-aware PPO trainer.
//!
//! This crate does not depend on a deep learning framework. It provides
//! the environment and agent interfaces, the fixed-capacity
//! [`TransitionBuffer`], the training loop ([`Trainer`]) and the evaluation
//! loop ([`Evaluator`]), together with the record types used for metrics.
pub mod dummy;
pub mod error;
pub mod record;
pub mod util;

mod base;
pub use base::{
    ActionSelection, ActionSpace, Env, EnvStep, Mode, UncertAgent, UncertaintyPair,
};

mod transition_buffer;
pub use transition_buffer::{Transition, TransitionBuffer};

mod trainer;
pub use trainer::{RunningScore, Trainer, TrainerConfig, TrainingContext};

mod evaluator;
pub use evaluator::{DefaultEvaluator, EvalMode, EvalResult, Evaluator, UncertaintyLog};
