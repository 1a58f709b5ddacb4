//! Command line arguments shared by `train_sac` and `train_dqn`.
use anyhow::Result;
use clap::Parser;
use rink_core::{
    generic_replay_buffer::{PerConfig, SimpleReplayBufferConfig},
    TrainerConfig,
};
use rink_py_hockey_env::{ActionTable, HockeyEnvConfig, Mode, Opponent};
use std::path::{Path, PathBuf};

/// Train an agent in the laser-hockey environment
#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub struct Args {
    /// Stop after 10 episodes
    #[arg(long = "dry-run", default_value_t = false)]
    pub dry_run: bool,

    /// Use CUDA if available
    #[arg(long, default_value_t = false)]
    pub cuda: bool,

    /// Render every step of the game
    #[arg(long, default_value_t = false)]
    pub show: bool,

    /// Suppress episode reports and statistics tables
    #[arg(long = "q", default_value_t = false)]
    pub quiet: bool,

    /// Evaluate the agent after training
    #[arg(long, default_value_t = false)]
    pub evaluate: bool,

    /// Game mode: normal, shooting or defense
    #[arg(long, default_value = "defense")]
    pub mode: Mode,

    /// Number of training episodes
    #[arg(long = "max_episodes", default_value_t = 5000)]
    pub max_episodes: usize,

    /// Maximum number of steps in an episode
    #[arg(long = "max_steps", default_value_t = 160)]
    pub max_steps: usize,

    /// Number of optimization steps after every episode
    #[arg(long = "iter_fit", default_value_t = 16)]
    pub iter_fit: usize,

    /// Number of episodes in an evaluation
    #[arg(long = "eval_episodes", default_value_t = 30)]
    pub eval_episodes: usize,

    /// Evaluate the agent every this number of episodes (0 disables evaluation)
    #[arg(long = "eval_interval", default_value_t = 100)]
    pub eval_interval: usize,

    /// Learning rate of all optimizers
    #[arg(long = "learning_rate", default_value_t = 3e-4)]
    pub learning_rate: f64,

    /// Update target networks every this number of optimization steps
    #[arg(long = "update_target_every", default_value_t = 1)]
    pub update_target_every: usize,

    /// Discount factor
    #[arg(long, default_value_t = 0.99)]
    pub gamma: f64,

    /// Batch size
    #[arg(long = "batch_size", default_value_t = 64)]
    pub batch_size: usize,

    /// Entropy coefficient of SAC
    #[arg(long, default_value_t = 0.2)]
    pub alpha: f64,

    /// Tune the entropy coefficient of SAC automatically
    #[arg(long = "automatic_entropy_tuning", default_value_t = false)]
    pub automatic_entropy_tuning: bool,

    /// Soft update coefficient of target networks
    #[arg(long = "soft_tau", default_value_t = 0.005)]
    pub soft_tau: f64,

    /// Use prioritized experience replay
    #[arg(long, default_value_t = false)]
    pub per: bool,

    /// Prioritization exponent of prioritized experience replay
    #[arg(long = "per_alpha", default_value_t = 0.6)]
    pub per_alpha: f32,

    /// Capacity of the replay buffer
    #[arg(long = "buffer_size", default_value_t = 1_000_000)]
    pub buffer_size: usize,

    /// Standardize observations with the fixed statistics of the game
    #[arg(long = "normalize_obs", default_value_t = false)]
    pub normalize_obs: bool,

    /// Discrete action table of DQN: default or custom
    #[arg(long = "action_table", default_value = "custom")]
    pub action_table: ActionTable,

    /// Number of actions over which epsilon of DQN decays
    #[arg(long = "eps_final_step", default_value_t = 100_000)]
    pub eps_final_step: usize,

    /// Directory of checkpoints and plots
    #[arg(long, default_value = "logs")]
    pub logdir: PathBuf,

    /// Checkpoint directory loaded before training
    #[arg(long)]
    pub filename: Option<PathBuf>,

    /// Remove checkpoints and plots in the log directory first
    #[arg(long, default_value_t = false)]
    pub cleanup: bool,

    /// Random seed
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// YAML file of trainer settings, overriding the corresponding arguments
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Args {
    /// Configuration of the trainer saving checkpoints in `model_dir`.
    ///
    /// `--dry-run` applies to configurations loaded with `--config` as well.
    pub fn trainer_config(&self, model_dir: &Path) -> Result<TrainerConfig> {
        let config = match &self.config {
            Some(path) => TrainerConfig::load(path)?,
            None => TrainerConfig::default()
                .max_episodes(self.max_episodes)
                .max_steps(self.max_steps)
                .iter_fit(self.iter_fit)
                .warmup_period(self.batch_size)
                .eval_interval(self.eval_interval)
                .eval_episodes(self.eval_episodes)
                .seed(self.seed as i64),
        };

        let dry_run = self.dry_run || config.dry_run;
        Ok(config.dry_run(dry_run).model_dir(model_dir.to_string_lossy()))
    }

    pub fn replay_buffer_config(&self) -> SimpleReplayBufferConfig {
        let per_config = match self.per {
            true => Some(PerConfig::default().alpha(self.per_alpha)),
            false => None,
        };
        SimpleReplayBufferConfig::default()
            .capacity(self.buffer_size)
            .seed(self.seed)
            .per_config(per_config)
    }

    /// Configuration of the environment against the strong basic opponent.
    pub fn env_config(&self, action_table: Option<ActionTable>) -> HockeyEnvConfig {
        HockeyEnvConfig::default()
            .mode(self.mode)
            .opponents(vec![Opponent::Basic { weak: false }])
            .action_table(action_table)
            .normalize_obs(self.normalize_obs)
            .render(self.show)
            .quiet(self.quiet)
    }

    /// Device of the agent.
    pub fn device(&self) -> Result<candle_core::Device> {
        match self.cuda {
            true => Ok(candle_core::Device::cuda_if_available(0)?),
            false => Ok(candle_core::Device::Cpu),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_args() {
        let args = Args::try_parse_from(["train_sac"]).unwrap();
        assert_eq!(args.mode, Mode::Defense);
        assert_eq!(args.max_episodes, 5000);
        assert_eq!(args.max_steps, 160);
        assert_eq!(args.iter_fit, 16);
        assert_eq!(args.batch_size, 64);
        assert_eq!(args.action_table, ActionTable::Custom);
        assert!(!args.per);
        assert!(args.filename.is_none());
    }

    #[test]
    fn test_unknown_mode_fails_at_parse() {
        assert!(Args::try_parse_from(["train_sac", "--mode", "attack"]).is_err());
        let args = Args::try_parse_from(["train_sac", "--mode", "shooting"]).unwrap();
        assert_eq!(args.mode, Mode::Shooting);
    }

    #[test]
    fn test_trainer_config() -> Result<()> {
        let args = Args::try_parse_from([
            "train_dqn",
            "--dry-run",
            "--max_episodes",
            "100",
            "--batch_size",
            "32",
            "--q",
        ])?;
        assert!(args.quiet);

        let config = args.trainer_config(Path::new("logs/agents"))?;
        assert_eq!(config.max_episodes, 100);
        assert_eq!(config.episode_limit(), 10);
        assert_eq!(config.warmup_period, 32);
        assert_eq!(config.model_dir.as_deref(), Some("logs/agents"));
        Ok(())
    }

    #[test]
    fn test_replay_buffer_config() {
        let args = Args::try_parse_from(["train_sac", "--per", "--per_alpha", "0.7"]).unwrap();
        let config = args.replay_buffer_config();
        assert_eq!(config.capacity, 1_000_000);
        assert_eq!(config.per_config.map(|c| c.alpha), Some(0.7));
    }

    #[test]
    fn test_env_config() -> Result<()> {
        let args = Args::try_parse_from(["train_dqn", "--mode", "normal", "--normalize_obs"])?;
        let config = args.env_config(Some(args.action_table));
        assert!(config.normalize_obs);
        assert_eq!(config.mode, Mode::Normal);
        assert_eq!(config.action_table, Some(ActionTable::Custom));
        assert_eq!(config.opponents, vec![Opponent::Basic { weak: false }]);

        let args = Args::try_parse_from(["train_sac"])?;
        assert!(!args.env_config(None).normalize_obs);
        Ok(())
    }
}
