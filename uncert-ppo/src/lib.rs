//! PPO with bootstrap ensembles for uncertainty estimation.
//!
//! The workspace consists of the following crates:
//!
//! * [uncert-ppo-core](uncert_ppo_core) provides the environment and agent
//!   interfaces, the transition buffer, the training and evaluation loops and
//!   the record types. It does not depend on a deep learning framework.
//! * [uncert-ppo-candle-agent](uncert_ppo_candle_agent) implements the PPO
//!   agent whose policy is an ensemble of actor-critic networks, based on
//!   [candle](https://crates.io/crates/candle-core).
//! * [uncert-ppo-pendulum-env](uncert_ppo_pendulum_env) is a pendulum
//!   swing-up environment with stacked and noisy observations.
//! * [uncert-ppo-tensorboard](uncert_ppo_tensorboard) writes records which
//!   can be shown in Tensorboard.
//!
//! This crate wires them together in [`run`], which the `uncert-ppo` binary
//! calls with a [`RunConfig`] built from command line arguments.
mod args;
mod run_config;
pub use args::Args;
pub use run_config::RunConfig;

use anyhow::Result;
use log::info;
use std::{fs, path::Path};
use uncert_ppo_candle_agent::BootstrapAgent;
use uncert_ppo_core::{
    record::{LogRecorder, TeeRecorder},
    DefaultEvaluator, Env, EvalMode, Mode, Trainer, TrainingContext, UncertAgent, UncertaintyLog,
};
use uncert_ppo_pendulum_env::{NoiseConfig, PendulumEnv};
use uncert_ppo_tensorboard::TensorboardRecorder;

fn create_recorder(tensorboard_dir: Option<&str>) -> TeeRecorder {
    let recorder = TeeRecorder::new().push(Box::new(LogRecorder::default()));
    match tensorboard_dir {
        Some(dir) => recorder.push(Box::new(TensorboardRecorder::new(dir))),
        None => recorder,
    }
}

fn describe_noise(noise: Option<NoiseConfig>) -> String {
    match noise {
        None => "not using noise".to_string(),
        Some(NoiseConfig::Fixed(sigma)) => format!("using noise with [{}] std", sigma),
        Some(NoiseConfig::Bounds(lower, upper)) => {
            format!("using noise with [{}, {}] std bounds", lower, upper)
        }
    }
}

/// Trains an agent on the pendulum and returns the statistics of the run.
///
/// Unless `config.trainer.debug` is set, the directory of models is created
/// and the uncertainty log of evaluations is initialized in
/// `<uncert_dir>/eval/<model_name>.txt`. When `config.from_checkpoint` is
/// given, training resumes from the epoch stored in the checkpoint. The
/// evaluation environment has no observation noise.
pub fn run(config: &RunConfig) -> Result<TrainingContext> {
    let mut trainer_config = config.trainer.clone();
    let debug = trainer_config.debug;

    info!("Initializing data folders");
    if !debug {
        fs::create_dir_all(&trainer_config.model_dir)?;
    }

    let mut agent = BootstrapAgent::build(config.agent.clone())?;
    if let Some(path) = &config.from_checkpoint {
        let epoch = agent.load(Path::new(path), Mode::Train)?;
        info!("Resuming from epoch {} of {:?}", epoch, path);
        trainer_config = trainer_config.init_ep(epoch);
    }

    let eval_env_config = config.env.clone().noise(None);
    let mut evaluator = DefaultEvaluator::<PendulumEnv>::new(
        &eval_env_config,
        config.eval_seed,
        config.nb_evaluations,
    )?
    .mode(EvalMode::Eval);
    if !debug {
        let log = UncertaintyLog::init(
            &config.uncert_dir,
            EvalMode::Eval,
            &trainer_config.model_name,
        )?;
        evaluator = evaluator.uncertainty_log(log);
    }
    let mut recorder = create_recorder(config.tensorboard_dir.as_deref());

    info!(
        "Training {} agent during {} episodes and {}",
        agent.model().name(),
        trainer_config.episodes,
        describe_noise(config.env.noise)
    );
    for line in serde_yaml::to_string(config)?.lines() {
        info!("{}", line);
    }

    let mut trainer = Trainer::<PendulumEnv>::build(trainer_config, &config.env)?;
    trainer.train(&mut agent, &mut recorder, &mut evaluator)?;

    let context = trainer.context().clone();
    trainer.close()?;
    evaluator.env_mut().close()?;
    Ok(context)
}
