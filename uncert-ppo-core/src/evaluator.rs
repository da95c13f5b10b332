//! Evaluate [`UncertAgent`].
use crate::{
    record::{Record, RecordValue},
    UncertAgent, UncertaintyPair,
};
use anyhow::Result;
use serde::{Deserialize, Serialize};
mod default_evaluator;
mod uncertainty_log;
pub use default_evaluator::DefaultEvaluator;
pub use uncertainty_log::{UncertaintyEntry, UncertaintyLog};

/// Kind of run an evaluation belongs to.
///
/// It selects the prefix of metric keys and the directory of the uncertainty log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum EvalMode {
    /// Evaluation on the training environment.
    Train,

    /// Periodic evaluation during training.
    Eval,

    /// Test without observation noise.
    Test0,

    /// Test.
    Test,
}

impl EvalMode {
    /// Name used for directories, e.g. `"eval"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Eval => "eval",
            Self::Test0 => "test0",
            Self::Test => "test",
        }
    }

    /// Prefix of metric keys, e.g. `"Eval"`.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Train => "Train",
            Self::Eval => "Eval",
            Self::Test0 => "Test0",
            Self::Test => "Test",
        }
    }
}

/// Aggregated result of a batch of evaluation rollouts.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalResult {
    /// Mode of the evaluation.
    pub mode: EvalMode,

    /// Mean of the total rewards of the rollouts.
    pub mean_score: f32,

    /// Mean of the number of steps of the rollouts.
    pub mean_steps: f32,

    /// Per-step uncertainty averaged within each rollout, then across rollouts.
    pub mean_uncertainty: UncertaintyPair,
}

impl EvalResult {
    /// Converts the result into a record, `eval_nb` being the index of the evaluation.
    pub fn to_record(&self, eval_nb: usize) -> Record {
        let t = self.mode.title();
        Record::from_slice(&[
            (format!("{} Episode", t), RecordValue::Scalar(eval_nb as _)),
            (format!("{} Mean Score", t), RecordValue::Scalar(self.mean_score)),
            (format!("{} Mean Steps", t), RecordValue::Scalar(self.mean_steps)),
            (
                format!("{} Mean Epist Uncert", t),
                RecordValue::Scalar(self.mean_uncertainty.epistemic),
            ),
            (
                format!("{} Mean Aleat Uncert", t),
                RecordValue::Scalar(self.mean_uncertainty.aleatoric),
            ),
        ])
    }
}

/// Evaluate [`UncertAgent`].
pub trait Evaluator {
    /// Evaluate [`UncertAgent`] after the training episode `episode`.
    ///
    /// The caller of this method needs to handle the internal state of `agent`,
    /// like training/evaluation mode.
    fn evaluate<A: UncertAgent>(&mut self, agent: &mut A, episode: usize) -> Result<EvalResult>;
}
