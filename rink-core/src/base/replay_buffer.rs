//! Replay buffer.
use anyhow::Result;

/// Interface of buffers of experiences from environments.
///
/// Items pushed to the buffer are produced by a
/// [`StepProcessor`](crate::StepProcessor) in the training loop.
pub trait ExperienceBufferBase {
    /// Items pushed into the buffer.
    type Item;

    /// Pushes a transition into the buffer.
    fn push(&mut self, tr: Self::Item) -> Result<()>;

    /// The number of samples in the buffer.
    fn len(&self) -> usize;

    /// If the buffer is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A batch of transitions sampled from a replay buffer.
pub trait TransitionBatch {
    /// A set of observations in a batch.
    type ObsBatch;

    /// A set of actions in a batch.
    type ActBatch;

    /// Unpack the data `(o_t, a_t, o_t+n, r_t, is_terminated_t, is_truncated_t)`.
    ///
    /// Optionally, the return value has sample indices in the replay buffer and
    /// importance weights, both of which are used with prioritized experience replay.
    #[allow(clippy::type_complexity)]
    fn unpack(
        self,
    ) -> (
        Self::ObsBatch,
        Self::ActBatch,
        Self::ObsBatch,
        Vec<f32>,
        Vec<i8>,
        Vec<i8>,
        Option<Vec<usize>>,
        Option<Vec<f32>>,
    );

    /// Returns the number of samples in the batch.
    fn len(&self) -> usize;

    /// If the batch is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `o_t`.
    fn obs(&self) -> &Self::ObsBatch;

    /// Returns `a_t`.
    fn act(&self) -> &Self::ActBatch;
}

/// Interface of replay buffers.
///
/// Replay buffers hold transitions pushed through [`ExperienceBufferBase`] and
/// produce batches used in optimization steps of agents.
pub trait ReplayBufferBase {
    /// Configuration of the replay buffer.
    type Config: Clone;

    /// Batch generated from the buffer.
    type Batch: TransitionBatch;

    /// Build a replay buffer from [Self::Config].
    fn build(config: &Self::Config) -> Self;

    /// Constructs a batch of `size` distinct transitions.
    ///
    /// Fails with [`RinkError::ReplayBufferUnderflow`] when the buffer holds fewer
    /// than `size` transitions.
    ///
    /// [`RinkError::ReplayBufferUnderflow`]: crate::error::RinkError::ReplayBufferUnderflow
    fn batch(&mut self, size: usize) -> Result<Self::Batch>;

    /// Updates priority of samples in the buffer.
    ///
    /// `td_err` is an absolute TD error of each sample. This method does nothing
    /// if the buffer does not use prioritized sampling.
    fn update_priority(&mut self, ixs: &Option<Vec<usize>>, td_err: &Option<Vec<f32>>)
        -> Result<()>;

    /// Returns `true` if [`ReplayBufferBase::batch`] succeeds with the given size.
    fn is_ready(&self, batch_size: usize) -> bool;
}
