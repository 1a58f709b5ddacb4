#![warn(missing_docs)]
//! Core components of rink, a trainer of reinforcement learning agents for the
//! laser-hockey game.
//!
//! This crate does not depend on any tensor backend. It provides
//!
//! * traits describing environments, agents and replay buffers ([`Env`], [`Agent`],
//!   [`ReplayBufferBase`] and so on),
//! * a generic replay buffer with optional prioritized experience replay
//!   ([`generic_replay_buffer`]),
//! * records and recorders for reporting ([`record`]),
//! * the episodic training loop ([`Trainer`]) and evaluation ([`Evaluator`]),
//! * a versioned checkpoint manifest ([`checkpoint`]).
//!
//! Agents implemented with a tensor backend live in `rink-candle-agent` and the
//! environment wrapper lives in `rink-py-hockey-env`.
pub mod checkpoint;
pub mod dummy;
pub mod error;
pub mod generic_replay_buffer;
pub mod record;
pub mod util;

mod base;
pub use base::{
    Act, Agent, Configurable, Env, ExperienceBufferBase, Info, Obs, Policy, ReplayBufferBase,
    Step, StepProcessor, TransitionBatch,
};

mod evaluator;
pub use evaluator::{DefaultEvaluator, Evaluator};

mod trainer;
pub use trainer::{EpisodeStats, EvalStats, Outcome, Trainer, TrainerConfig, DRY_RUN_EPISODES};
