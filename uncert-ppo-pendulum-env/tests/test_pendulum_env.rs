use anyhow::Result;
use uncert_ppo_core::{error::UppoError, Env};
use uncert_ppo_pendulum_env::{NoiseConfig, PendulumConfig, PendulumEnv, MAX_TORQUE, OBS_DIM};

#[test]
fn test_stacked_observation() -> Result<()> {
    let config = PendulumConfig::default().state_stack(4);
    let mut env = PendulumEnv::build(&config, 0)?;

    let obs = env.reset()?;
    assert_eq!(obs.len(), 4 * OBS_DIM);
    for frame in obs.chunks(OBS_DIM) {
        assert_eq!(frame, &obs[..OBS_DIM]);
    }

    // The newest frame comes last
    let step = env.step(&[1.0])?;
    assert_eq!(step.obs.len(), 4 * OBS_DIM);
    assert_eq!(&step.obs[..3 * OBS_DIM], &obs[OBS_DIM..]);
    assert_ne!(&step.obs[3 * OBS_DIM..], &obs[..OBS_DIM]);
    Ok(())
}

#[test]
fn test_same_seed_same_episode() -> Result<()> {
    let config = PendulumConfig::default().noise(Some(NoiseConfig::Bounds(0.0, 0.3)));
    let mut env1 = PendulumEnv::build(&config, 7)?;
    let mut env2 = PendulumEnv::build(&config, 7)?;

    assert_eq!(env1.reset()?, env2.reset()?);
    assert_eq!(env1.random_noise(), env2.random_noise());
    for _ in 0..10 {
        assert_eq!(env1.step(&[0.5])?, env2.step(&[0.5])?);
    }
    Ok(())
}

#[test]
fn test_noise() -> Result<()> {
    let mut env = PendulumEnv::build(&PendulumConfig::default(), 0)?;
    env.reset()?;
    assert_eq!(env.random_noise(), 0.0);

    let config = PendulumConfig::default().noise(Some(NoiseConfig::Fixed(0.1)));
    let mut env = PendulumEnv::build(&config, 0)?;
    env.reset()?;
    assert_eq!(env.random_noise(), 0.1);

    let config = PendulumConfig::default().noise(Some(NoiseConfig::Bounds(0.2, 0.4)));
    let mut env = PendulumEnv::build(&config, 0)?;
    for _ in 0..5 {
        env.reset()?;
        let sigma = env.random_noise();
        assert!(sigma >= 0.2 && sigma < 0.4);
    }
    Ok(())
}

#[test]
fn test_episode_ends_at_max_steps() -> Result<()> {
    let config = PendulumConfig::default()
        .max_steps(10)
        .action_repeat(3)
        .done_reward_threshold(f32::MIN);
    let mut env = PendulumEnv::build(&config, 0)?;
    env.reset()?;

    let dead = (0..4)
        .map(|_| -> Result<bool> { Ok(env.step(&[0.0])?.is_dead) })
        .collect::<Result<Vec<_>>>()?;
    assert_eq!(dead, vec![false, false, false, true]);
    assert_eq!(env.steps(), 10);
    Ok(())
}

#[test]
fn test_done_below_reward_threshold() -> Result<()> {
    let config = PendulumConfig::default().done_reward_threshold(0.0);
    let mut env = PendulumEnv::build(&config, 3)?;
    env.reset()?;

    let step = env.step(&[MAX_TORQUE])?;
    assert!(step.reward < 0.0);
    assert!(step.is_done);
    assert!(!step.is_dead);
    Ok(())
}

#[test]
fn test_invalid_config() {
    let config = PendulumConfig::default().state_stack(0);
    let err = PendulumEnv::build(&config, 0).err().unwrap();
    assert!(matches!(
        err.downcast_ref::<UppoError>(),
        Some(UppoError::InvalidConfig(_))
    ));
}
