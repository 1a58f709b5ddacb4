//! Default implementation of the [`Evaluator`] trait.
use super::Evaluator;
use crate::{record::Record, Env, EpisodeStats, EvalStats, Policy};
use anyhow::Result;
use log::info;

/// Runs a fixed number of episodes and returns the means of [`EpisodeStats`].
///
/// Episode `i` starts with [`Env::reset_with_index`]`(i)` and lasts at most
/// `max_steps` steps. The returned record is [`EvalStats::to_record`], with keys
/// `eval_reward`, `eval_touch`, `eval_won` and `eval_lost`.
///
/// ```rust
/// use rink_core::{
///     dummy::{DummyAgent, DummyEnv, DummyEnvConfig},
///     DefaultEvaluator, Evaluator,
/// };
///
/// let config = DummyEnvConfig { episode_len: Some(3) };
/// let mut evaluator = DefaultEvaluator::<DummyEnv>::new(&config, 42, 4, 10).unwrap();
/// let record = evaluator.evaluate(&mut DummyAgent::new(1)).unwrap();
/// assert_eq!(record.get_scalar("eval_reward").unwrap(), 3.0);
/// assert_eq!(record.get_scalar("eval_won").unwrap(), 1.0);
/// ```
pub struct DefaultEvaluator<E: Env> {
    n_episodes: usize,
    max_steps: usize,
    env: E,
}

impl<E: Env> Evaluator<E> for DefaultEvaluator<E> {
    fn evaluate<P: Policy<E>>(&mut self, policy: &mut P) -> Result<Record> {
        let mut episodes = Vec::with_capacity(self.n_episodes);

        for ix in 0..self.n_episodes {
            let mut stats = EpisodeStats::new(ix + 1);
            let mut prev_obs = self.env.reset_with_index(ix)?;

            for _ in 0..self.max_steps {
                let act = policy.sample(&prev_obs)?;
                let (step, _) = self.env.step(&act)?;
                stats.update(&step);
                if step.is_done() {
                    break;
                }
                prev_obs = step.obs;
            }
            episodes.push(stats);
        }

        let stats = EvalStats::from_episodes(&episodes);
        info!(
            "Evaluation over {} episodes: reward {:.3}, won {:.3}, lost {:.3}",
            self.n_episodes, stats.reward, stats.won, stats.lost
        );
        Ok(stats.to_record())
    }
}

impl<E: Env> DefaultEvaluator<E> {
    /// Constructs a new [`DefaultEvaluator`] with its own environment.
    pub fn new(config: &E::Config, seed: i64, n_episodes: usize, max_steps: usize) -> Result<Self> {
        Ok(Self {
            n_episodes,
            max_steps,
            env: E::build(config, seed)?,
        })
    }
}
