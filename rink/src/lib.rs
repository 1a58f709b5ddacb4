//! Training programs of SAC and DQN agents for the laser-hockey game.
//!
//! The binaries `train_sac` and `train_dqn` parse [`args::Args`], build an agent and call
//! [`train::run`]. Progress is reported by [`logger::HockeyLogger`], which also keeps
//! checkpoints under `<logdir>/agents` and plots under `<logdir>/plots`.
pub mod args;
pub mod dqn;
pub mod logger;
mod plot;
pub mod sac;
pub mod train;
pub use args::Args;
pub use logger::HockeyLogger;
