//! A wrapper of the laser-hockey environment in Python.
//!
//! [`HockeyEnv`] calls `laserhockey.hockey_env.HockeyEnv` through
//! [`PyO3`](https://github.com/PyO3/pyo3). The agent controls the first player. The
//! second player is controlled by a built-in opponent ([`Opponent`]), chosen at random
//! at the start of every episode.
//!
//! ## Observation
//!
//! [`HockeyObs`] is a vector of 18 values. If [`HockeyEnvConfig::normalize_obs`] is set,
//! it is standardized with the fixed statistics [`OBS_MEAN`] and [`OBS_STD`].
//!
//! ## Action
//!
//! [`ContinuousAct`] holds the four values sent to the environment. [`DiscreteAct`] is an
//! index into an [`ActionTable`], which must then be set in
//! [`HockeyEnvConfig::action_table`].
//!
//! ## Tensors
//!
//! With the `candle` feature, observations and actions convert to and from
//! `candle_core::Tensor` and `rink_candle_agent::TensorBatch`, so the agents of
//! `rink-candle-agent` can be trained on this environment.
mod act;
mod base;
#[cfg(feature = "candle")]
mod candle;
mod config;
mod error;
mod mode;
mod obs;
pub use act::{ActionTable, ContinuousAct, DiscreteAct, HockeyAct, ACT_DIM};
pub use base::{HockeyEnv, HockeyInfo};
pub use config::{HockeyEnvConfig, Opponent};
pub use error::HockeyEnvError;
pub use mode::Mode;
pub use obs::{HockeyObs, OBS_DIM, OBS_MEAN, OBS_STD};
