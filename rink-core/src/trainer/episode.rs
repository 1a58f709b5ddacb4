//! Per-episode and evaluation statistics.
use crate::{
    record::{Record, RecordValue::Scalar},
    Env, Info, Step,
};
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Outcome of a game from the viewpoint of the learning player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum Outcome {
    /// The player scored.
    Won,

    /// The opponent scored.
    Lost,

    /// No goal within the episode.
    Draw,
}

impl Outcome {
    /// Converts the `winner` field of the hockey environment (1, -1 or 0).
    pub fn from_winner(winner: i32) -> Self {
        match winner {
            1 => Self::Won,
            -1 => Self::Lost,
            _ => Self::Draw,
        }
    }

    /// Inverse of [`Outcome::from_winner`].
    pub fn winner(&self) -> i32 {
        match self {
            Self::Won => 1,
            Self::Lost => -1,
            Self::Draw => 0,
        }
    }
}

/// Statistics of an episode.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeStats {
    /// Index of the episode, starting from 1.
    pub episode: usize,

    /// Sum of rewards.
    pub reward: f32,

    /// Number of environment steps.
    pub steps: usize,

    /// If the player touched the puck in the episode.
    pub touched: bool,

    /// Outcome of the episode.
    pub outcome: Outcome,
}

impl EpisodeStats {
    /// Statistics at the start of an episode.
    pub fn new(episode: usize) -> Self {
        Self {
            episode,
            reward: 0.0,
            steps: 0,
            touched: false,
            outcome: Outcome::Draw,
        }
    }

    /// Accumulates a step.
    pub fn update<E: Env>(&mut self, step: &Step<E>) {
        self.reward += step.reward;
        self.steps += 1;
        self.touched |= step.info.touched_puck();
        if let Some(outcome) = step.info.outcome() {
            self.outcome = outcome;
        }
    }

    /// Converts into a record with keys
    /// `episode`, `reward`, `steps`, `touch` and `winner`.
    pub fn to_record(&self) -> Record {
        Record::from_slice(&[
            ("episode", Scalar(self.episode as f32)),
            ("reward", Scalar(self.reward)),
            ("steps", Scalar(self.steps as f32)),
            ("touch", Scalar(self.touched as i32 as f32)),
            ("winner", Scalar(self.outcome.winner() as f32)),
        ])
    }

    /// Inverse of [`EpisodeStats::to_record`].
    pub fn from_record(record: &Record) -> Result<Self> {
        Ok(Self {
            episode: record.get_scalar("episode")? as usize,
            reward: record.get_scalar("reward")?,
            steps: record.get_scalar("steps")? as usize,
            touched: record.get_scalar("touch")? > 0.0,
            outcome: Outcome::from_winner(record.get_scalar("winner")? as i32),
        })
    }
}

/// Means of episode statistics over evaluation episodes.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalStats {
    /// Mean of the sums of rewards.
    pub reward: f32,

    /// Fraction of episodes in which the player touched the puck.
    pub touch: f32,

    /// Fraction of won episodes.
    pub won: f32,

    /// Fraction of lost episodes.
    pub lost: f32,
}

impl EvalStats {
    /// Computes the means. All values are zero for an empty slice.
    pub fn from_episodes(episodes: &[EpisodeStats]) -> Self {
        if episodes.is_empty() {
            return Self {
                reward: 0.0,
                touch: 0.0,
                won: 0.0,
                lost: 0.0,
            };
        }

        let n = episodes.len() as f32;
        let frac = |f: &dyn Fn(&EpisodeStats) -> bool| {
            episodes.iter().filter(|e| f(e)).count() as f32 / n
        };

        Self {
            reward: episodes.iter().map(|e| e.reward).sum::<f32>() / n,
            touch: frac(&|e| e.touched),
            won: frac(&|e| e.outcome == Outcome::Won),
            lost: frac(&|e| e.outcome == Outcome::Lost),
        }
    }

    /// Converts into a record with keys
    /// `eval_reward`, `eval_touch`, `eval_won` and `eval_lost`.
    pub fn to_record(&self) -> Record {
        Record::from_slice(&[
            ("eval_reward", Scalar(self.reward)),
            ("eval_touch", Scalar(self.touch)),
            ("eval_won", Scalar(self.won)),
            ("eval_lost", Scalar(self.lost)),
        ])
    }

    /// Inverse of [`EvalStats::to_record`].
    pub fn from_record(record: &Record) -> Result<Self> {
        Ok(Self {
            reward: record.get_scalar("eval_reward")?,
            touch: record.get_scalar("eval_touch")?,
            won: record.get_scalar("eval_won")?,
            lost: record.get_scalar("eval_lost")?,
        })
    }
}
