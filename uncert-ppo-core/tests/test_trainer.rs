use anyhow::Result;
use tempdir::TempDir;
use uncert_ppo_core::{
    dummy::{DummyAgent, DummyEnv, DummyEnvConfig},
    error::UppoError,
    record::{BufferedRecorder, RecordValue},
    DefaultEvaluator, EvalMode, Evaluator, Trainer, TrainerConfig, UncertaintyLog,
    UncertAgent, UncertaintyPair,
};

fn trainer_config() -> TrainerConfig {
    TrainerConfig::default()
        .episodes(2)
        .eval_interval(100)
        .checkpoint_every(100)
        .model_name("dummy")
}

fn evaluator(config: &DummyEnvConfig, n_episodes: usize) -> Result<DefaultEvaluator<DummyEnv>> {
    DefaultEvaluator::new(config, 10, n_episodes)
}

#[test]
fn test_update_when_buffer_is_full() -> Result<()> {
    let env_config = DummyEnvConfig::default();
    let mut trainer = Trainer::<DummyEnv>::build(trainer_config().debug(true), &env_config)?;
    let mut agent = DummyAgent::new(4);
    let mut recorder = BufferedRecorder::new();
    let mut evaluator = evaluator(&env_config, 1)?;

    trainer.train(&mut agent, &mut recorder, &mut evaluator)?;

    // 2 episodes of 5 steps, updates at the 4th and 8th steps
    assert_eq!(agent.n_updates, 2);
    assert_eq!(agent.buffer_len(), 2);

    // Actions are rescaled from [0, 1] to [-2, 2]
    assert!(trainer.env().actions.iter().all(|a| a == &vec![1.0]));

    let records = recorder.with_key("Train Episode").collect::<Vec<_>>();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].get_scalar("n_transitions")?, 4.0);
    assert_eq!(records[1].get_scalar("n_transitions")?, 4.0);
    assert!(records
        .iter()
        .all(|r| matches!(r.get("Datetime"), Some(RecordValue::DateTime(_)))));
    Ok(())
}

#[test]
fn test_episode_step_cap() -> Result<()> {
    let env_config = DummyEnvConfig {
        episode_len: 10_000,
        ..Default::default()
    };
    let config = trainer_config().episodes(1).max_episode_steps(3).debug(true);
    let mut trainer = Trainer::<DummyEnv>::build(config, &env_config)?;
    let mut agent = DummyAgent::new(100);
    let mut recorder = BufferedRecorder::new();
    let mut evaluator = evaluator(&env_config, 1)?;

    trainer.train(&mut agent, &mut recorder, &mut evaluator)?;

    let record = recorder.with_key("Train Episode").next().unwrap();
    assert_eq!(record.get_scalar("Episode Steps")?, 3.0);
    assert_eq!(record.get_scalar("Episode Score")?, 3.0);
    Ok(())
}

#[test]
fn test_running_score_per_episode() -> Result<()> {
    let env_config = DummyEnvConfig {
        rewards: vec![2.0],
        ..Default::default()
    };
    let config = trainer_config().episodes(1).debug(true);
    let mut trainer = Trainer::<DummyEnv>::build(config, &env_config)?;
    let mut agent = DummyAgent::new(100);
    let mut recorder = BufferedRecorder::new();
    let mut evaluator = evaluator(&env_config, 1)?;

    trainer.train(&mut agent, &mut recorder, &mut evaluator)?;

    let record = recorder.with_key("Train Episode").next().unwrap();
    assert_eq!(record.get_scalar("Episode Score")?, 10.0);
    assert_eq!(record.get_scalar("Episode Running Score")?, 0.01 * 10.0);
    assert_eq!(record.get_scalar("Max Episode Running Score")?, 0.01 * 10.0);
    assert_eq!(trainer.context().running_score.score(), 0.01 * 10.0);
    Ok(())
}

fn solved_setting(
    debug: bool,
) -> Result<(Trainer<DummyEnv>, DefaultEvaluator<DummyEnv>, TrainerConfig)> {
    // Running scores 0.1, 0.199, 1.197; solved at the third episode
    let env_config = DummyEnvConfig {
        episode_len: 1,
        rewards: vec![10.0, 10.0, 100.0],
        reward_threshold: 1.0,
        ..Default::default()
    };
    // Evaluation scores 5, 1, 1
    let eval_env_config = DummyEnvConfig {
        episode_len: 1,
        rewards: vec![5.0, 1.0, 1.0],
        ..Default::default()
    };
    let config = trainer_config()
        .episodes(100)
        .eval_interval(1)
        .debug(debug);
    let trainer = Trainer::<DummyEnv>::build(config.clone(), &env_config)?;
    let evaluator = evaluator(&eval_env_config, 1)?;
    Ok((trainer, evaluator, config))
}

#[test]
fn test_solved_saves_best_model_and_stops() -> Result<()> {
    let (mut trainer, mut evaluator, config) = solved_setting(false)?;
    let mut agent = DummyAgent::new(100);
    let mut recorder = BufferedRecorder::new();

    trainer.train(&mut agent, &mut recorder, &mut evaluator)?;

    assert!(trainer.context().solved);
    assert_eq!(trainer.context().last_episode, Some(2));
    assert_eq!(recorder.with_key("Train Episode").count(), 3);

    // The last evaluation (1.0) is below the best (5.0), the model is saved anyway
    assert_eq!(trainer.context().best_score, 5.0);
    assert_eq!(agent.saved_epochs(&config.best_model_path()), vec![0, 2]);
    Ok(())
}

#[test]
fn test_debug_mode_does_not_save() -> Result<()> {
    let (mut trainer, mut evaluator, _) = solved_setting(true)?;
    let mut agent = DummyAgent::new(100);
    let mut recorder = BufferedRecorder::new();

    trainer.train(&mut agent, &mut recorder, &mut evaluator)?;

    assert!(trainer.context().solved);
    assert!(agent.saved.borrow().is_empty());
    // Metrics are emitted as usual
    assert_eq!(recorder.with_key("Eval Mean Score").count(), 3);
    Ok(())
}

#[test]
fn test_eval_and_checkpoint_cadence() -> Result<()> {
    let env_config = DummyEnvConfig::default();
    let config = trainer_config()
        .episodes(6)
        .eval_interval(2)
        .checkpoint_every(3);
    let mut trainer = Trainer::<DummyEnv>::build(config.clone(), &env_config)?;
    let mut agent = DummyAgent::new(100);
    let mut recorder = BufferedRecorder::new();
    let mut evaluator = evaluator(&env_config, 2)?;

    trainer.train(&mut agent, &mut recorder, &mut evaluator)?;

    let evals = recorder.with_key("Eval Episode").collect::<Vec<_>>();
    assert_eq!(evals.len(), 3);
    assert_eq!(evals[2].get_scalar("Eval Episode")?, 2.0);
    assert_eq!(trainer.context().eval_nb, 3);

    assert_eq!(agent.saved_epochs(&config.checkpoint_path()), vec![2, 5]);

    // Equal evaluation scores do not overwrite the best model
    assert_eq!(agent.saved_epochs(&config.best_model_path()), vec![1]);

    // Agent is back in training mode after evaluation
    assert!(agent.is_train());
    Ok(())
}

#[test]
fn test_evaluation_aggregates_and_logs() -> Result<()> {
    let dir = TempDir::new("evaluation")?;
    let env_config = DummyEnvConfig {
        episode_len: 3,
        rewards: vec![1.0, 3.0],
        noise: 0.2,
        ..Default::default()
    };
    let log = UncertaintyLog::init(dir.path(), EvalMode::Eval, "dummy")?;
    let mut evaluator = evaluator(&env_config, 2)?.uncertainty_log(log.clone());
    let mut agent = DummyAgent::new(100).uncertainty(0.5, 0.0);

    let result = evaluator.evaluate(&mut agent, 7)?;

    assert_eq!(result.mean_score, 6.0);
    assert_eq!(result.mean_steps, 3.0);
    assert_eq!(result.mean_uncertainty, UncertaintyPair::new(0.5, 0.0));
    assert!(agent.eval_flags.iter().all(|e| *e));

    let entries = log.read()?;
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].episode, 7);
    assert_eq!(entries[1].index, 1);
    assert_eq!(entries[1].score, 9.0);
    assert_eq!(entries[1].sigma, 0.2);
    assert_eq!(entries[1].uncertainties.len(), 3);

    let record = result.to_record(0);
    assert_eq!(record.get_scalar("Eval Mean Epist Uncert")?, 0.5);
    assert_eq!(record.get_scalar("Eval Mean Aleat Uncert")?, 0.0);
    Ok(())
}

#[test]
fn test_environment_failure_propagates() -> Result<()> {
    let env_config = DummyEnvConfig {
        fail_at_step: Some(2),
        ..Default::default()
    };
    let mut trainer = Trainer::<DummyEnv>::build(trainer_config().debug(true), &env_config)?;
    let mut agent = DummyAgent::new(100);
    let mut recorder = BufferedRecorder::new();
    let mut evaluator = evaluator(&DummyEnvConfig::default(), 1)?;

    let err = trainer
        .train(&mut agent, &mut recorder, &mut evaluator)
        .unwrap_err();
    assert_eq!(err.to_string(), "DummyEnv failed at step 2");
    Ok(())
}

#[test]
fn test_zero_eval_interval_is_rejected() -> Result<()> {
    let env_config = DummyEnvConfig::default();
    let config = trainer_config().eval_interval(0);
    let mut trainer = Trainer::<DummyEnv>::build(config, &env_config)?;
    let mut agent = DummyAgent::new(100);
    let mut recorder = BufferedRecorder::new();
    let mut evaluator = evaluator(&env_config, 1)?;

    let err = trainer
        .train(&mut agent, &mut recorder, &mut evaluator)
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<UppoError>(),
        Some(UppoError::InvalidConfig(_))
    ));
    Ok(())
}
