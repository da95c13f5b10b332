//! Train [`UncertAgent`].
mod config;
mod context;
use crate::{
    error::UppoError,
    record::{
        Record,
        RecordValue::{DateTime, Scalar},
        Recorder,
    },
    util::adjust_range,
    Env, Evaluator, Transition, UncertAgent,
};
use anyhow::Result;
use chrono::Local;
pub use config::TrainerConfig;
pub use context::{RunningScore, TrainingContext};
use log::{info, warn};
use std::path::Path;

/// Manages training loop and related objects.
///
/// # Training loop
///
/// For each episode `i_ep` in `init_ep..episodes`:
///
/// 1. Reset [`Env`] and run at most `max_episode_steps` environment steps.
///    Each step selects an action with the agent, rescales it into the range of
///    the environment, applies it and stores the transition in the agent.
///    When the agent reports that its buffer is full, an optimization step
///    runs and the buffer is emptied. The episode ends early when the
///    environment returns `is_done` or `is_dead`.
/// 2. Update the running score and write a record with
///    `"Train Episode"`, `"Episode Score"`, `"Episode Steps"`,
///    `"Episode Running Score"`, `"Max Episode Running Score"` and the
///    `"Datetime"` of the end of the episode.
/// 3. If `(i_ep + 1) % eval_interval == 0`, evaluate the agent. The model is
///    saved as the best model if the evaluation score is strictly higher than
///    the best one so far.
/// 4. If `(i_ep + 1) % checkpoint_every == 0`, save a checkpoint.
/// 5. If the running score exceeds [`Env::reward_threshold`], save the best
///    model regardless of its evaluation score and stop.
///
/// Nothing is written to disk in debug mode.
pub struct Trainer<E: Env> {
    env: E,
    config: TrainerConfig,
    context: TrainingContext,
}

impl<E: Env> Trainer<E> {
    /// Constructs a trainer, building the environment for training.
    pub fn build(config: TrainerConfig, env_config: &E::Config) -> Result<Self> {
        let env = E::build(env_config, config.seed)?;
        Ok(Self::from_env(config, env))
    }

    /// Constructs a trainer with the given environment.
    pub fn from_env(config: TrainerConfig, env: E) -> Self {
        Self {
            env,
            config,
            context: TrainingContext::default(),
        }
    }

    /// Statistics of the run.
    pub fn context(&self) -> &TrainingContext {
        &self.context
    }

    /// The environment for training.
    pub fn env(&self) -> &E {
        &self.env
    }

    /// Releases the environment.
    pub fn close(mut self) -> Result<()> {
        self.env.close()
    }

    fn save_model<A: UncertAgent>(agent: &A, epoch: usize, path: &Path) {
        match agent.save(epoch, path) {
            Ok(()) => info!("Saved the model in {:?}.", path),
            Err(e) => warn!("Failed to save model in {:?}: {}", path, e),
        }
    }

    /// Runs a training episode.
    ///
    /// Returns the score, the number of steps and the record of the last
    /// optimization step in the episode, if any.
    fn run_episode<A: UncertAgent>(
        &mut self,
        agent: &mut A,
    ) -> Result<(f32, usize, Option<Record>)> {
        let mut state = self.env.reset()?;
        let mut score = 0f32;
        let mut steps = 0usize;
        let mut record_opt = None;

        for _ in 0..self.config.max_episode_steps {
            let sel = agent.select_action(&state, false)?;
            let act = adjust_range(&sel.action, self.env.action_space());
            let step = self.env.step(&act)?;
            let transition = Transition::new(
                state,
                sel.action,
                step.reward,
                step.obs.clone(),
                sel.log_prob,
            );

            if agent.store_transition(transition)? {
                record_opt = Some(agent.update()?);
                agent.empty_buffer();
            }

            score += step.reward;
            steps += 1;
            state = step.obs;

            if step.is_done || step.is_dead {
                break;
            }
        }

        Ok((score, steps, record_opt))
    }

    /// Train the agent.
    pub fn train<A, R, D>(
        &mut self,
        agent: &mut A,
        recorder: &mut R,
        evaluator: &mut D,
    ) -> Result<()>
    where
        A: UncertAgent,
        R: Recorder,
        D: Evaluator,
    {
        if self.config.eval_interval == 0 || self.config.checkpoint_every == 0 {
            return Err(UppoError::InvalidConfig(
                "eval_interval and checkpoint_every must be positive".to_string(),
            )
            .into());
        }
        let debug = self.config.debug;
        let best_model_path = self.config.best_model_path();
        let checkpoint_path = self.config.checkpoint_path();
        agent.train();

        for i_ep in self.config.init_ep..self.config.episodes {
            let (score, steps, record_opt) = self.run_episode(agent)?;
            let running_score = self.context.running_score.update(score);
            self.context.last_episode = Some(i_ep);

            let mut record = Record::from_slice(&[
                ("Train Episode", Scalar(i_ep as _)),
                ("Episode Score", Scalar(score)),
                ("Episode Steps", Scalar(steps as _)),
                ("Episode Running Score", Scalar(running_score)),
                (
                    "Max Episode Running Score",
                    Scalar(self.context.running_score.max()),
                ),
                ("Datetime", DateTime(Local::now())),
            ]);
            if let Some(record_opt) = record_opt {
                record.merge_inplace(record_opt);
            }
            recorder.write(record);

            // Evaluation
            if (i_ep + 1) % self.config.eval_interval == 0 {
                info!("Starts evaluation of the trained model");
                agent.eval();
                let result = evaluator.evaluate(agent, i_ep)?;
                agent.train();
                recorder.write(result.to_record(self.context.eval_nb));
                self.context.eval_nb += 1;

                if result.mean_score > self.context.best_score && !debug {
                    Self::save_model(agent, i_ep, &best_model_path);
                    self.context.best_score = result.mean_score;
                }
            }

            // Checkpoint
            if (i_ep + 1) % self.config.checkpoint_every == 0 && !debug {
                Self::save_model(agent, i_ep, &checkpoint_path);
            }

            // Stop training
            if running_score > self.env.reward_threshold() {
                info!(
                    "Solved! Running reward is now {} and the last episode runs to {}!",
                    running_score, score
                );
                self.context.solved = true;
                if !debug {
                    Self::save_model(agent, i_ep, &best_model_path);
                }
                break;
            }
        }

        recorder.flush();
        Ok(())
    }
}
