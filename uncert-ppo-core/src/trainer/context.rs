//! Statistics kept by the training loop over a run.

/// Exponentially-weighted moving average of episode scores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunningScore {
    score: f32,
    max: f32,
}

impl Default for RunningScore {
    fn default() -> Self {
        Self {
            score: 0.0,
            max: 0.0,
        }
    }
}

impl RunningScore {
    /// Updates the running score with the score of a completed episode.
    ///
    /// `score <- score * 0.99 + episode_score * 0.01`
    pub fn update(&mut self, episode_score: f32) -> f32 {
        self.score = self.score * 0.99 + episode_score * 0.01;
        if self.score > self.max {
            self.max = self.score;
        }
        self.score
    }

    /// Current value.
    pub fn score(&self) -> f32 {
        self.score
    }

    /// The maximum value observed so far, starting from `0`.
    pub fn max(&self) -> f32 {
        self.max
    }
}

/// Mutable state of a training run.
///
/// Created once when [`Trainer`](crate::Trainer) is constructed. It is not
/// part of the checkpoint, so resuming from a checkpoint starts again from
/// a zero running score and the initial best score.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingContext {
    /// Running score of training episodes.
    pub running_score: RunningScore,

    /// The best evaluation score a saved model achieved.
    pub best_score: f32,

    /// The number of evaluations done so far.
    pub eval_nb: usize,

    /// Index of the last completed episode.
    pub last_episode: Option<usize>,

    /// `true` if the running score exceeded the reward threshold.
    pub solved: bool,
}

impl Default for TrainingContext {
    fn default() -> Self {
        Self {
            running_score: RunningScore::default(),
            best_score: -100.0,
            eval_nb: 0,
            last_episode: None,
            solved: false,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_running_score_first_episode() {
        let mut rs = RunningScore::default();
        let x = -123.4f32;
        assert_eq!(rs.update(x), 0.01 * x);
        assert_eq!(rs.max(), 0.0);

        let mut rs = RunningScore::default();
        assert_eq!(rs.update(50.0), 0.01 * 50.0);
        assert_eq!(rs.max(), rs.score());
    }

    #[test]
    fn test_running_score_max_is_monotone() {
        let mut rs = RunningScore::default();
        rs.update(100.0);
        let max = rs.max();
        rs.update(-100.0);
        assert!(rs.score() < max);
        assert_eq!(rs.max(), max);
    }
}
