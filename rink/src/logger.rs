//! Console reports, checkpoints and plots of a training run.
use crate::plot::{line_chart, Series};
use anyhow::Result;
use log::{info, trace, warn};
use plotters::style::{BLUE, RED};
use rink_core::{
    record::{AggregateRecorder, Record, RecordStorage, RecordValue, Recorder},
    util::running_mean,
    Agent, Env, EpisodeStats, EvalStats, Outcome, ReplayBufferBase,
};
use rink_py_hockey_env::Mode;
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

/// Window of the running mean of episode rewards in plots.
pub const RUNNING_MEAN_WINDOW: usize = 50;

const AGENTS_DIR: &str = "agents";
const PLOTS_DIR: &str = "plots";
const DEFAULT_MODEL_NAME: &str = "agent";

fn round(x: f32, digits: i32) -> f32 {
    let s = 10f32.powi(digits);
    (x * s).round() / s
}

/// One line reporting the end of an episode.
///
/// Episodes without a winner are indented by 8 spaces.
pub fn episode_line(
    outcome: Outcome,
    episode: usize,
    steps: usize,
    reward: f32,
    touched: Option<bool>,
    epsilon: Option<f32>,
) -> String {
    let padding = match outcome {
        Outcome::Draw => 8,
        _ => 0,
    };
    let mut line = format!(
        "{} {:>4}: Done after {:>3} steps. \tReward: {:<15}",
        " ".repeat(padding),
        episode,
        steps,
        round(reward, 4)
    );
    if let Some(touched) = touched {
        line += &format!("Touched: {:<15}", touched as i32);
    }
    if let Some(epsilon) = epsilon {
        line += &format!("Epsilon: {:<5}", round(epsilon, 2));
    }
    line
}

/// A grid table of the means of evaluation statistics.
pub fn stats_table(stats: &EvalStats) -> String {
    let rows = [
        ("Mean reward", stats.reward),
        ("Mean touch", stats.touch),
        ("Mean won", stats.won),
        ("Mean lost", stats.lost),
    ];
    let cells: Vec<(&str, String)> = rows
        .iter()
        .map(|(k, v)| (*k, round(*v, 3).to_string()))
        .collect();
    let w0 = cells.iter().map(|c| c.0.len()).max().unwrap_or(0);
    let w1 = cells.iter().map(|c| c.1.len()).max().unwrap_or(0);
    let sep = format!("+{}+{}+", "-".repeat(w0 + 2), "-".repeat(w1 + 2));

    let mut lines = vec![sep.clone()];
    for (k, v) in cells.iter() {
        lines.push(format!("| {:<w0$} | {:>w1$} |", k, v, w0 = w0, w1 = w1));
        lines.push(sep.clone());
    }
    lines.join("\n")
}

/// Reports the progress of training and keeps its artifacts under a prefix directory.
///
/// * Checkpoints are saved in `<prefix>/agents/<name>`.
/// * Plots are written in `<prefix>/plots`.
///
/// As a [`Recorder`], it prints a line for every episode record and a table for every
/// evaluation record, and keeps the values for [`HockeyLogger::plot_all`]. Records of
/// optimization steps are aggregated on [`AggregateRecorder::flush`].
pub struct HockeyLogger {
    prefix: PathBuf,
    quiet: bool,
    rewards: Vec<f32>,
    touches: Vec<(f32, f32)>,
    eval: BTreeMap<String, Vec<(f32, f32)>>,
    opt: BTreeMap<String, Vec<(f32, f32)>>,
    storage: RecordStorage,
}

impl HockeyLogger {
    /// Creates the directories of checkpoints and plots.
    ///
    /// If `cleanup` is `true`, existing checkpoints and plots are removed first.
    pub fn new(prefix: impl AsRef<Path>, mode: Mode, cleanup: bool, quiet: bool) -> Result<Self> {
        let prefix = prefix.as_ref().to_path_buf();
        let logger = Self {
            prefix,
            quiet,
            rewards: vec![],
            touches: vec![],
            eval: BTreeMap::new(),
            opt: BTreeMap::new(),
            storage: RecordStorage::new(),
        };

        if cleanup {
            for dir in [logger.agents_dir(), logger.plots_dir()] {
                if dir.exists() {
                    fs::remove_dir_all(&dir)?;
                }
            }
        }
        fs::create_dir_all(logger.agents_dir())?;
        fs::create_dir_all(logger.plots_dir())?;

        logger.info(&format!("Running in mode: {}", mode));
        Ok(logger)
    }

    pub fn agents_dir(&self) -> PathBuf {
        self.prefix.join(AGENTS_DIR)
    }

    pub fn plots_dir(&self) -> PathBuf {
        self.prefix.join(PLOTS_DIR)
    }

    /// Logs a message unless quiet.
    pub fn info(&self, message: &str) {
        if !self.quiet {
            info!("{}", message);
        }
    }

    pub fn print_episode_info(&self, stats: &EpisodeStats, epsilon: Option<f32>) {
        let line = episode_line(
            stats.outcome,
            stats.episode,
            stats.steps,
            stats.reward,
            Some(stats.touched),
            epsilon,
        );
        self.info(&line);
    }

    pub fn print_stats(&self, stats: &EvalStats) {
        self.info(&format!("\n{}", stats_table(stats)));
    }

    /// Saves the parameters of the agent in `<prefix>/agents/<name>`.
    pub fn save_model<E, R, A>(&self, agent: &A, name: &str) -> Result<Vec<PathBuf>>
    where
        E: Env,
        R: ReplayBufferBase,
        A: Agent<E, R>,
    {
        let path = self.agents_dir().join(name);
        let files = agent.save_params(&path)?;
        info!("Saved the model in {:?}", path);
        Ok(files)
    }

    /// Loads the parameters of the agent from `path`, or from `<prefix>/agents/agent` if
    /// `path` is `None`.
    pub fn load_model<E, R, A>(&self, agent: &mut A, path: Option<&Path>) -> Result<()>
    where
        E: Env,
        R: ReplayBufferBase,
        A: Agent<E, R>,
    {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => self.agents_dir().join(DEFAULT_MODEL_NAME),
        };
        agent.load_params(&path)?;
        info!("Loaded the model from {:?}", path);
        Ok(())
    }

    fn plot(&self, name: &str, series: &[Series], y_range: Option<(f32, f32)>) {
        let path = self.plots_dir().join(format!("{}.png", name));
        match line_chart(&path, name, series, y_range) {
            Ok(()) => trace!("Wrote {:?}", path),
            Err(e) => warn!("Failed to write {:?}: {}", path, e),
        }
    }

    /// Writes a plot for every tracked metric in `<prefix>/plots`.
    ///
    /// Failures are logged and do not stop the other plots.
    pub fn plot_all(&self) {
        if !self.rewards.is_empty() {
            let n = RUNNING_MEAN_WINDOW.min(self.rewards.len());
            let points: Vec<_> = running_mean(&self.rewards, n)
                .into_iter()
                .enumerate()
                .map(|(i, v)| ((i + n) as f32, v))
                .collect();
            self.plot("reward", &[Series::new("reward", &points, BLUE)], None);
        }
        if !self.touches.is_empty() {
            self.plot("touch", &[Series::new("touch", &self.touches, BLUE)], None);
        }

        if let (Some(won), Some(lost)) = (self.eval.get("won"), self.eval.get("lost")) {
            let series = [Series::new("Won", won, BLUE), Series::new("Lost", lost, RED)];
            self.plot("evaluation-won-loss", &series, Some((0.0, 1.0)));
        }
        for (key, points) in self.eval.iter() {
            if key != "won" && key != "lost" {
                let name = format!("evaluation-{}", key);
                self.plot(&name, &[Series::new(key, points, BLUE)], None);
            }
        }

        for (key, points) in self.opt.iter() {
            self.plot(key, &[Series::new(key, points, BLUE)], None);
        }
    }

    fn push_eval(&mut self, record: &Record) -> Result<()> {
        let stats = EvalStats::from_record(record)?;
        self.print_stats(&stats);

        let episode = record.get_scalar("episode").unwrap_or(self.rewards.len() as f32);
        for (key, v) in [
            ("reward", stats.reward),
            ("touch", stats.touch),
            ("won", stats.won),
            ("lost", stats.lost),
        ] {
            self.eval.entry(key.to_string()).or_default().push((episode, v));
        }
        Ok(())
    }

    fn push_episode(&mut self, record: &Record) -> Result<()> {
        let stats = EpisodeStats::from_record(record)?;
        self.print_episode_info(&stats, record.get_scalar("epsilon").ok());

        self.rewards.push(stats.reward);
        let touch = stats.touched as i32 as f32;
        self.touches.push((stats.episode as f32, touch));
        Ok(())
    }
}

impl Recorder for HockeyLogger {
    /// Reports an episode record or an evaluation record.
    fn write(&mut self, record: Record) {
        let result = if record.get("eval_reward").is_some() {
            self.push_eval(&record)
        } else {
            self.push_episode(&record)
        };
        if let Err(e) = result {
            warn!("Unexpected record {:?}: {}", record.keys().collect::<Vec<_>>(), e);
        }
    }
}

impl AggregateRecorder for HockeyLogger {
    fn store(&mut self, record: Record) {
        self.storage.store(record);
    }

    fn flush(&mut self, step: i64) {
        let record = self.storage.aggregate();
        let mut msg = vec![];
        for (key, value) in record.iter() {
            if let RecordValue::Scalar(v) = value {
                self.opt.entry(key.clone()).or_default().push((step as f32, *v));
                if key.ends_with("_mean") {
                    msg.push(format!("{} = {:.4}", key, v));
                }
            }
        }
        if !msg.is_empty() {
            self.info(&format!("Episode {}: {}", step, msg.join(", ")));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rink_core::{
        dummy::{DummyAgent, DummyEnv, DummyReplayBuffer},
        error::RinkError,
    };
    use tempdir::TempDir;

    #[test]
    fn test_episode_line() {
        let line = episode_line(Outcome::Won, 12, 34, -1.234_56, Some(true), None);
        assert_eq!(
            line,
            "   12: Done after  34 steps. \tReward: -1.2346        Touched: 1              "
        );

        let line = episode_line(Outcome::Draw, 7, 160, 0.5, Some(false), Some(0.456));
        assert!(line.starts_with("            7: Done after 160 steps."));
        assert!(line.ends_with("Touched: 0              Epsilon: 0.46 "));
    }

    #[test]
    fn test_stats_table() {
        let stats = EvalStats {
            reward: -3.45678,
            touch: 0.5,
            won: 0.25,
            lost: 0.125,
        };
        let table = stats_table(&stats);
        let lines: Vec<_> = table.lines().collect();
        assert_eq!(lines.len(), 9);
        assert_eq!(lines[0], "+-------------+--------+");
        assert_eq!(lines[1], "| Mean reward | -3.457 |");
        assert_eq!(lines[3], "| Mean touch  |    0.5 |");
        assert_eq!(lines[7], "| Mean lost   |  0.125 |");
    }

    #[test]
    fn test_new_creates_directories() -> Result<()> {
        let dir = TempDir::new("logger")?;
        let logger = HockeyLogger::new(dir.path(), Mode::Defense, false, true)?;
        assert!(logger.agents_dir().is_dir());
        assert!(logger.plots_dir().is_dir());

        let stale = logger.agents_dir().join("stale");
        fs::create_dir_all(&stale)?;
        let logger = HockeyLogger::new(dir.path(), Mode::Defense, false, true)?;
        assert!(stale.is_dir());

        HockeyLogger::new(dir.path(), Mode::Defense, true, true)?;
        assert!(!stale.exists());
        assert!(logger.agents_dir().is_dir());
        Ok(())
    }

    #[test]
    fn test_records_are_tracked() -> Result<()> {
        let dir = TempDir::new("logger")?;
        let mut logger = HockeyLogger::new(dir.path(), Mode::Normal, false, true)?;

        for episode in 1..=3 {
            let mut stats = EpisodeStats::new(episode);
            stats.reward = episode as f32;
            stats.touched = episode == 2;
            logger.write(stats.to_record());
        }
        let mut record = EvalStats {
            reward: 1.0,
            touch: 0.5,
            won: 0.5,
            lost: 0.0,
        }
        .to_record();
        record.insert("episode", RecordValue::Scalar(3.0));
        logger.write(record);

        logger.store(Record::from_scalar("loss_critic", 1.0));
        logger.store(Record::from_scalar("loss_critic", 3.0));
        logger.flush(3);

        assert_eq!(logger.rewards, vec![1.0, 2.0, 3.0]);
        assert_eq!(logger.touches, vec![(1.0, 0.0), (2.0, 1.0), (3.0, 0.0)]);
        assert_eq!(logger.eval["won"], vec![(3.0, 0.5)]);
        assert_eq!(logger.opt["loss_critic_mean"], vec![(3.0, 2.0)]);
        Ok(())
    }

    #[test]
    fn test_save_and_load_model() -> Result<()> {
        let dir = TempDir::new("logger")?;
        let logger = HockeyLogger::new(dir.path(), Mode::Shooting, false, true)?;
        let mut agent = DummyAgent::new(4);

        let err = logger
            .load_model::<DummyEnv, DummyReplayBuffer, _>(&mut agent, None)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RinkError>(),
            Some(RinkError::CheckpointNotFound(_))
        ));

        logger.save_model::<DummyEnv, DummyReplayBuffer, _>(&agent, "agent")?;
        assert!(logger.agents_dir().join("agent").is_dir());
        logger.load_model::<DummyEnv, DummyReplayBuffer, _>(&mut agent, None)?;

        let missing = dir.path().join("missing");
        assert!(logger
            .load_model::<DummyEnv, DummyReplayBuffer, _>(&mut agent, Some(&missing))
            .is_err());
        Ok(())
    }
}
