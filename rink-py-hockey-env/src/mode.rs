use crate::HockeyEnvError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Game mode of the hockey environment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Full game against an opponent.
    Normal,

    /// The puck starts on the side of the player, the opponent does not move.
    Shooting,

    /// The opponent shoots at the goal of the player.
    Defense,
}

impl Mode {
    /// Name of the mode in `HockeyEnv_BasicOpponent` of the Python package.
    pub(crate) fn py_attr(&self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Shooting => "TRAIN_SHOOTING",
            Self::Defense => "TRAIN_DEFENSE",
        }
    }
}

impl Default for Mode {
    fn default() -> Self {
        Self::Defense
    }
}

impl FromStr for Mode {
    type Err = HockeyEnvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(Self::Normal),
            "shooting" => Ok(Self::Shooting),
            "defense" => Ok(Self::Defense),
            _ => Err(HockeyEnvError::UnknownMode(s.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Normal => "normal",
            Self::Shooting => "shooting",
            Self::Defense => "defense",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mode() {
        for mode in [Mode::Normal, Mode::Shooting, Mode::Defense] {
            assert_eq!(mode.to_string().parse::<Mode>().unwrap(), mode);
        }
        for s in ["Normal", "defence", "", "train_shooting"] {
            assert!(matches!(
                s.parse::<Mode>(),
                Err(HockeyEnvError::UnknownMode(_))
            ));
        }
    }
}
