//! Actions of the player.
//!
//! An action of the hockey environment is a vector of four values: horizontal and
//! vertical movement, rotation and shooting. [`ContinuousAct`] holds the vector itself,
//! [`DiscreteAct`] is an index into an [`ActionTable`].
use crate::HockeyEnvError;
use anyhow::Result;
use itertools::iproduct;
use rink_core::Act;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Number of elements of an action vector.
pub const ACT_DIM: usize = 4;

const DEFAULT_ACTIONS: [[f32; ACT_DIM]; 8] = [
    [0., 0., 0., 0.],  // stand
    [-1., 0., 0., 0.], // left
    [1., 0., 0., 0.],  // right
    [0., -1., 0., 0.], // down
    [0., 1., 0., 0.],  // up
    [0., 0., -1., 0.], // clockwise
    [0., 0., 1., 0.],  // counter-clockwise
    [0., 0., 0., 1.],  // shoot
];

/// Table of discrete actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionTable {
    /// Standing, one of the six elementary moves, or shooting (8 entries).
    Default,

    /// Every combination of `{-1, 0, 1}` for the three movement axes without shooting,
    /// followed by shooting (28 entries).
    Custom,
}

impl ActionTable {
    /// Returns the action vectors of the table.
    pub fn actions(&self) -> Vec<[f32; ACT_DIM]> {
        match self {
            Self::Default => DEFAULT_ACTIONS.to_vec(),
            Self::Custom => {
                let v = [-1f32, 0., 1.];
                iproduct!(v, v, v)
                    .map(|(x, y, r)| [x, y, r, 0.])
                    .chain(std::iter::once([0., 0., 0., 1.]))
                    .collect()
            }
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        match self {
            Self::Default => DEFAULT_ACTIONS.len(),
            Self::Custom => 28,
        }
    }

    /// Looks up the action vector of the given index.
    pub fn get(&self, index: i64) -> Result<[f32; ACT_DIM]> {
        let len = self.len();
        if index < 0 || index as usize >= len {
            return Err(HockeyEnvError::ActionIndex { index, len }.into());
        }
        Ok(self.actions()[index as usize])
    }
}

impl FromStr for ActionTable {
    type Err = HockeyEnvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(Self::Default),
            "custom" => Ok(Self::Custom),
            _ => Err(HockeyEnvError::UnknownActionTable(s.to_string())),
        }
    }
}

/// Action of the player accepted by [`HockeyEnv`](crate::HockeyEnv).
pub trait HockeyAct: Act {
    /// Returns the action vector sent to the Python environment.
    fn to_vec(&self, table: Option<&ActionTable>) -> Result<[f32; ACT_DIM]>;
}

/// Continuous action, four values in `[-1, 1]`.
#[derive(Clone, Debug, PartialEq)]
pub struct ContinuousAct(pub Vec<f32>);

impl Act for ContinuousAct {}

impl HockeyAct for ContinuousAct {
    /// Values are clipped to `[-1, 1]`, missing ones are zero.
    fn to_vec(&self, _table: Option<&ActionTable>) -> Result<[f32; ACT_DIM]> {
        let mut a = [0f32; ACT_DIM];
        for (dst, src) in a.iter_mut().zip(self.0.iter()) {
            *dst = src.clamp(-1., 1.);
        }
        Ok(a)
    }
}

/// Index into an [`ActionTable`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiscreteAct(pub i64);

impl Act for DiscreteAct {}

impl HockeyAct for DiscreteAct {
    fn to_vec(&self, table: Option<&ActionTable>) -> Result<[f32; ACT_DIM]> {
        table.ok_or(HockeyEnvError::NoActionTable)?.get(self.0)
    }
}
