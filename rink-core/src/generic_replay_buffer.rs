//! Generic implementation of replay buffers.
//!
//! - [`SimpleReplayBuffer`]: A ring buffer of transitions with optional prioritized
//!   experience replay (PER)
//! - [`GenericTransitionBatch`]: A batch of transitions
//! - [`SimpleStepProcessor`]: Converts environment steps to transitions
//! - [`PerConfig`]: Configuration for prioritized experience replay
//!
//! ```rust
//! use rink_core::generic_replay_buffer::{
//!     PerConfig, SimpleReplayBuffer, SimpleReplayBufferConfig, WeightNormalizer,
//! };
//! use rink_core::{dummy::VecBatch, ReplayBufferBase};
//!
//! let config = SimpleReplayBufferConfig::default()
//!     .capacity(10000)
//!     .seed(42)
//!     .per_config(Some(
//!         PerConfig::default()
//!             .alpha(0.6)
//!             .beta_0(0.4)
//!             .normalize(WeightNormalizer::All),
//!     ));
//! let buffer = SimpleReplayBuffer::<VecBatch, VecBatch>::build(&config);
//! assert!(!buffer.is_ready(1));
//! ```
mod base;
mod batch;
mod config;
mod step_proc;
pub use base::{IwScheduler, SimpleReplayBuffer, WeightNormalizer};
pub use batch::{BatchBase, GenericTransitionBatch};
pub use config::{PerConfig, SimpleReplayBufferConfig};
pub use step_proc::{SimpleStepProcessor, SimpleStepProcessorConfig};
