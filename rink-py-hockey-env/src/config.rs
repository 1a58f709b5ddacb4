//! Configuration of the hockey environment.
use crate::{ActionTable, Mode};
use anyhow::Result;
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Opponent playing the second player.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum Opponent {
    /// `BasicOpponent` of the Python package.
    Basic {
        /// Weak variant of the opponent.
        weak: bool,
    },
}

/// Configuration of [`HockeyEnv`](crate::HockeyEnv).
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct HockeyEnvConfig {
    /// Game mode.
    pub mode: Mode,

    /// Opponents. One of them is chosen at random at every reset.
    ///
    /// If empty, the second player does nothing.
    pub opponents: Vec<Opponent>,

    /// Action table for discrete actions, `None` for continuous actions.
    pub action_table: Option<ActionTable>,

    /// If `true`, observations are standardized.
    pub normalize_obs: bool,

    /// If `true`, the game is rendered at every step.
    pub render: bool,

    /// Suppresses messages of the Python environment.
    pub quiet: bool,
}

impl Default for HockeyEnvConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Defense,
            opponents: vec![Opponent::Basic { weak: false }],
            action_table: None,
            normalize_obs: false,
            render: false,
            quiet: false,
        }
    }
}

impl HockeyEnvConfig {
    /// Sets the game mode.
    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the opponents.
    pub fn opponents(mut self, opponents: Vec<Opponent>) -> Self {
        self.opponents = opponents;
        self
    }

    /// Sets the action table.
    pub fn action_table(mut self, action_table: Option<ActionTable>) -> Self {
        self.action_table = action_table;
        self
    }

    pub fn normalize_obs(mut self, v: bool) -> Self {
        self.normalize_obs = v;
        self
    }

    pub fn render(mut self, v: bool) -> Self {
        self.render = v;
        self
    }

    pub fn quiet(mut self, v: bool) -> Self {
        self.quiet = v;
        self
    }

    /// Loads [`HockeyEnvConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        info!("Load config of hockey environment from {:?}", path.as_ref());
        Ok(b)
    }

    /// Saves [`HockeyEnvConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path.as_ref())?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        info!("Save config of hockey environment into {:?}", path.as_ref());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_serde_hockey_env_config() -> Result<()> {
        let config = HockeyEnvConfig::default()
            .mode(Mode::Shooting)
            .opponents(vec![
                Opponent::Basic { weak: true },
                Opponent::Basic { weak: false },
            ])
            .action_table(Some(ActionTable::Custom))
            .normalize_obs(true);

        let dir = TempDir::new("hockey_env_config")?;
        let path = dir.path().join("env.yaml");
        config.save(&path)?;
        assert_eq!(config, HockeyEnvConfig::load(&path)?);

        let yaml = std::fs::read_to_string(&path)?;
        assert!(yaml.contains("shooting"));
        assert!(yaml.contains("custom"));
        Ok(())
    }
}
