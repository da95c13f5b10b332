//! Default implementation of the [`Evaluator`] trait.
use super::{EvalMode, EvalResult, Evaluator, UncertaintyLog};
use crate::{util::adjust_range, Env, UncertAgent, UncertaintyPair};
use anyhow::Result;
use log::debug;

/// Runs a fixed number of rollouts with the mean-ensemble policy.
///
/// Each rollout lasts until the environment reports a terminal state
/// ([`EnvStep::is_dead`](crate::EnvStep::is_dead)); the step cap of training
/// episodes does not apply. Uncertainties of every step are appended to the
/// [`UncertaintyLog`] when one is attached.
///
/// ```ignore
/// let mut evaluator = DefaultEvaluator::<Pendulum>::new(&config, 10, 3)?
///     .uncertainty_log(UncertaintyLog::init("uncertainties", EvalMode::Eval, "bootstrap")?);
/// let result = evaluator.evaluate(&mut agent, 19)?;
/// ```
pub struct DefaultEvaluator<E: Env> {
    n_episodes: usize,
    env: E,
    mode: EvalMode,
    uncertainty_log: Option<UncertaintyLog>,
}

impl<E: Env> DefaultEvaluator<E> {
    /// Constructs a new [`DefaultEvaluator`] building its own environment.
    ///
    /// * `config` - Configuration for the environment
    /// * `seed` - Random seed for environment initialization
    /// * `n_episodes` - Number of rollouts per evaluation
    pub fn new(config: &E::Config, seed: i64, n_episodes: usize) -> Result<Self> {
        Ok(Self::from_env(E::build(config, seed)?, n_episodes))
    }

    /// Constructs a new [`DefaultEvaluator`] with the given environment.
    pub fn from_env(env: E, n_episodes: usize) -> Self {
        Self {
            n_episodes,
            env,
            mode: EvalMode::Eval,
            uncertainty_log: None,
        }
    }

    /// Sets the mode.
    pub fn mode(mut self, mode: EvalMode) -> Self {
        self.mode = mode;
        self
    }

    /// Attaches an uncertainty log.
    pub fn uncertainty_log(mut self, log: UncertaintyLog) -> Self {
        self.uncertainty_log = Some(log);
        self
    }

    /// The environment used for evaluation.
    pub fn env(&self) -> &E {
        &self.env
    }

    /// Mutable reference to the environment used for evaluation.
    pub fn env_mut(&mut self) -> &mut E {
        &mut self.env
    }

    /// Runs a single rollout and returns its score, steps and per-step uncertainty.
    fn rollout<A: UncertAgent>(
        &mut self,
        agent: &mut A,
    ) -> Result<(f32, usize, Vec<UncertaintyPair>)> {
        let mut state = self.env.reset()?;
        let mut score = 0f32;
        let mut steps = 0usize;
        let mut uncert = Vec::new();

        loop {
            let sel = agent.select_action(&state, true)?;
            uncert.push(sel.uncertainty);
            let act = adjust_range(&sel.action, self.env.action_space());
            let step = self.env.step(&act)?;
            score += step.reward;
            steps += 1;
            if step.is_dead {
                break;
            }
            state = step.obs;
        }

        Ok((score, steps, uncert))
    }
}

fn mean_uncertainty(uncert: &[UncertaintyPair]) -> UncertaintyPair {
    let n = uncert.len().max(1) as f32;
    let (e, a) = uncert
        .iter()
        .fold((0f32, 0f32), |(e, a), u| (e + u.epistemic, a + u.aleatoric));
    UncertaintyPair::new(e / n, a / n)
}

impl<E: Env> Evaluator for DefaultEvaluator<E> {
    fn evaluate<A: UncertAgent>(&mut self, agent: &mut A, episode: usize) -> Result<EvalResult> {
        let n = self.n_episodes as f32;
        let mut mean_score = 0f32;
        let mut mean_steps = 0f32;
        let mut mean_uncert = UncertaintyPair::default();

        for ix in 0..self.n_episodes {
            let (score, steps, uncert) = self.rollout(agent)?;
            debug!(
                "{} rollout {} after episode {}: score = {}, steps = {}",
                self.mode.title(),
                ix,
                episode,
                score,
                steps
            );

            if let Some(log) = self.uncertainty_log.as_mut() {
                log.append(episode, ix, score, &uncert, self.env.random_noise())?;
            }

            let u = mean_uncertainty(&uncert);
            mean_uncert.epistemic += u.epistemic / n;
            mean_uncert.aleatoric += u.aleatoric / n;
            mean_score += score / n;
            mean_steps += steps as f32 / n;
        }

        Ok(EvalResult {
            mode: self.mode,
            mean_score,
            mean_steps,
            mean_uncertainty: mean_uncert,
        })
    }
}
