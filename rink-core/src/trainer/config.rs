//! Configuration of [`Trainer`](super::Trainer).
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Number of episodes run in a dry run.
pub const DRY_RUN_EPISODES: usize = 10;

/// Configuration of [`Trainer`](super::Trainer).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct TrainerConfig {
    /// The number of training episodes.
    pub max_episodes: usize,

    /// The maximum number of environment steps in an episode.
    pub max_steps: usize,

    /// The number of optimization steps after each episode.
    pub iter_fit: usize,

    /// Optimization starts when the replay buffer holds this number of transitions.
    pub warmup_period: usize,

    /// Interval of evaluation in episodes. Zero disables evaluation.
    pub eval_interval: usize,

    /// The number of episodes in an evaluation.
    pub eval_episodes: usize,

    /// Interval of saving model parameters in episodes. Zero disables it.
    pub save_interval: usize,

    /// Interval of flushing records in episodes.
    pub flush_record_interval: usize,

    /// If `true`, training stops after [`DRY_RUN_EPISODES`] episodes.
    pub dry_run: bool,

    /// Where to save the trained model.
    pub model_dir: Option<String>,

    /// Random seed of the training environment.
    pub seed: i64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            max_episodes: 5000,
            max_steps: 160,
            iter_fit: 16,
            warmup_period: 64,
            eval_interval: 100,
            eval_episodes: 30,
            save_interval: 0,
            flush_record_interval: 10,
            dry_run: false,
            model_dir: None,
            seed: 42,
        }
    }
}

impl TrainerConfig {
    /// Sets the number of training episodes.
    pub fn max_episodes(mut self, v: usize) -> Self {
        self.max_episodes = v;
        self
    }

    /// Sets the maximum number of steps in an episode.
    pub fn max_steps(mut self, v: usize) -> Self {
        self.max_steps = v;
        self
    }

    /// Sets the number of optimization steps per episode.
    pub fn iter_fit(mut self, v: usize) -> Self {
        self.iter_fit = v;
        self
    }

    /// Sets warmup period in transitions.
    pub fn warmup_period(mut self, warmup_period: usize) -> Self {
        self.warmup_period = warmup_period;
        self
    }

    /// Sets the interval of evaluation in episodes.
    pub fn eval_interval(mut self, v: usize) -> Self {
        self.eval_interval = v;
        self
    }

    /// Sets the number of evaluation episodes.
    pub fn eval_episodes(mut self, v: usize) -> Self {
        self.eval_episodes = v;
        self
    }

    /// Sets the interval of saving in episodes.
    pub fn save_interval(mut self, save_interval: usize) -> Self {
        self.save_interval = save_interval;
        self
    }

    /// Sets the interval of flushing records in episodes.
    pub fn flush_record_interval(mut self, flush_record_interval: usize) -> Self {
        self.flush_record_interval = flush_record_interval;
        self
    }

    /// Enables or disables dry run.
    pub fn dry_run(mut self, v: bool) -> Self {
        self.dry_run = v;
        self
    }

    /// Sets the directory where the model is saved.
    pub fn model_dir(mut self, model_dir: impl Into<String>) -> Self {
        self.model_dir = Some(model_dir.into());
        self
    }

    /// Sets the random seed.
    pub fn seed(mut self, seed: i64) -> Self {
        self.seed = seed;
        self
    }

    /// The number of episodes actually run.
    pub fn episode_limit(&self) -> usize {
        match self.dry_run {
            true => self.max_episodes.min(DRY_RUN_EPISODES),
            false => self.max_episodes,
        }
    }

    /// Constructs [`TrainerConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`TrainerConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_serde_trainer_config() -> Result<()> {
        let config = TrainerConfig::default()
            .max_episodes(100)
            .eval_interval(10)
            .eval_episodes(5)
            .model_dir("some/directory");

        let dir = TempDir::new("trainer_config")?;
        let path = dir.path().join("trainer_config.yaml");
        config.save(&path)?;
        let config_ = TrainerConfig::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }

    #[test]
    fn test_episode_limit() {
        let config = TrainerConfig::default().max_episodes(5000);
        assert_eq!(config.episode_limit(), 5000);
        assert_eq!(config.clone().dry_run(true).episode_limit(), DRY_RUN_EPISODES);
        assert_eq!(config.max_episodes(3).dry_run(true).episode_limit(), 3);
    }
}
