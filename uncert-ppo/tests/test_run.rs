use anyhow::Result;
use tempdir::TempDir;
use uncert_ppo::{run, RunConfig};
use uncert_ppo_candle_agent::{actor_critic::ActorCriticConfig, ppo::PpoConfig, UncertModel};
use uncert_ppo_core::{EvalMode, TrainerConfig, UncertaintyLog};
use uncert_ppo_pendulum_env::{NoiseConfig, PendulumConfig};

fn config(dir: &TempDir, model: UncertModel) -> RunConfig {
    let mut config = RunConfig {
        trainer: TrainerConfig::default()
            .episodes(4)
            .eval_interval(2)
            .checkpoint_every(2)
            .model_dir(dir.path().join("param").to_string_lossy()),
        env: PendulumConfig::default()
            .state_stack(2)
            .max_steps(10)
            .noise(Some(NoiseConfig::Bounds(0.0, 0.1))),
        nb_evaluations: 2,
        uncert_dir: dir.path().join("uncertainties").to_string_lossy().to_string(),
        ..RunConfig::default()
    };
    config.agent = config
        .agent
        .model(model)
        .nb_nets(2)
        .buffer_capacity(8)
        .actor_critic_config(ActorCriticConfig::new(0, 0, vec![8]))
        .ppo_config(PpoConfig::default().batch_size(4).ppo_epoch(1));
    config.sync()
}

#[test]
fn test_train_bootstrap() -> Result<()> {
    let dir = TempDir::new("uncert_ppo_run")?;
    let config = config(&dir, UncertModel::Bootstrap);
    let context = run(&config)?;

    assert_eq!(context.last_episode, Some(3));
    assert_eq!(context.eval_nb, 2);
    assert!(!context.solved);
    assert!(config.trainer.checkpoint_path().exists());

    let log = UncertaintyLog::open(UncertaintyLog::path_for(
        &config.uncert_dir,
        EvalMode::Eval,
        "bootstrap",
    ));
    let entries = log.read()?;
    assert_eq!(entries.len(), 2 * 2);
    assert!(entries.iter().all(|e| e.uncertainties.len() == 10));
    Ok(())
}

#[test]
fn test_evaluation_without_noise() -> Result<()> {
    let dir = TempDir::new("uncert_ppo_eval_noise")?;
    let mut config = config(&dir, UncertModel::Bootstrap);
    config.env = config.env.noise(Some(NoiseConfig::Bounds(0.3, 0.5)));
    run(&config)?;

    let log = UncertaintyLog::open(UncertaintyLog::path_for(
        &config.uncert_dir,
        EvalMode::Eval,
        "bootstrap",
    ));
    let entries = log.read()?;
    assert_eq!(entries.len(), 2 * 2);
    assert!(entries.iter().all(|e| e.sigma == 0.0));
    Ok(())
}

#[test]
fn test_resume_from_checkpoint() -> Result<()> {
    let dir = TempDir::new("uncert_ppo_resume")?;
    let config = config(&dir, UncertModel::Base);
    run(&config)?;

    let config = RunConfig {
        from_checkpoint: Some(
            config
                .trainer
                .checkpoint_path()
                .to_string_lossy()
                .to_string(),
        ),
        trainer: config.trainer.clone().episodes(6),
        ..config
    };
    let context = run(&config)?;

    // The last checkpoint was saved after episode 3, which runs again
    assert_eq!(context.last_episode, Some(5));
    assert_eq!(context.eval_nb, 2);
    Ok(())
}

#[test]
fn test_debug_writes_nothing() -> Result<()> {
    let dir = TempDir::new("uncert_ppo_debug")?;
    let mut config = config(&dir, UncertModel::Bootstrap);
    config.trainer = config.trainer.debug(true);
    run(&config)?;

    assert!(!dir.path().join("param").exists());
    assert!(!dir.path().join("uncertainties").exists());
    Ok(())
}
