//! Ring buffer of transitions with optional prioritized experience replay.
mod iw_scheduler;
mod sum_tree;
use super::{config::PerConfig, BatchBase, GenericTransitionBatch, SimpleReplayBufferConfig};
use crate::{error::RinkError, ExperienceBufferBase, ReplayBufferBase, TransitionBatch};
use anyhow::Result;
pub use iw_scheduler::IwScheduler;
use rand::{rngs::StdRng, SeedableRng};
use sum_tree::SumTree;
pub use sum_tree::WeightNormalizer;

struct PerState {
    sum_tree: SumTree,
    iw_scheduler: IwScheduler,
}

impl PerState {
    fn new(capacity: usize, per_config: &PerConfig) -> Self {
        Self {
            sum_tree: SumTree::new(capacity, per_config.alpha, per_config.normalize),
            iw_scheduler: IwScheduler::new(
                per_config.beta_0,
                per_config.beta_final,
                per_config.n_opts_final,
            ),
        }
    }
}

/// A replay buffer of transitions with arbitrary observation and action types.
///
/// Transitions are written at a cursor that wraps around at the capacity, so the
/// oldest transitions are evicted once the buffer is full. Batches consist of
/// distinct transitions, sampled uniformly or, with [`PerConfig`], in proportion
/// to their priorities.
pub struct SimpleReplayBuffer<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    capacity: usize,

    /// Write cursor.
    i: usize,

    /// Number of stored transitions, at most `capacity`.
    size: usize,

    obs: O,
    act: A,
    next_obs: O,
    reward: Vec<f32>,
    is_terminated: Vec<i8>,
    is_truncated: Vec<i8>,
    rng: StdRng,
    per_state: Option<PerState>,
}

impl<O, A> SimpleReplayBuffer<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    #[inline]
    fn push_slice<T: Copy>(buf: &mut [T], i: usize, b: &[T]) {
        let capacity = buf.len();
        for (j, v) in b.iter().enumerate() {
            buf[(i + j) % capacity] = *v;
        }
    }

    fn sample_slice<T: Copy>(buf: &[T], ixs: &[usize]) -> Vec<T> {
        ixs.iter().map(|ix| buf[*ix]).collect()
    }

    /// Gives the current maximum priority to `len` transitions at the cursor.
    fn set_priority(&mut self, len: usize) {
        if let Some(per_state) = self.per_state.as_mut() {
            let sum_tree = &mut per_state.sum_tree;
            let max_p = sum_tree.max();
            for j in 0..len {
                sum_tree.add((self.i + j) % self.capacity, max_p);
            }
        }
    }

    /// Returns the number of terminal transitions in the buffer.
    pub fn num_terminated_flags(&self) -> usize {
        self.is_terminated[..self.size]
            .iter()
            .map(|is_terminated| *is_terminated as usize)
            .sum()
    }

    /// Returns the sum of rewards in the buffer.
    pub fn sum_rewards(&self) -> f32 {
        self.reward[..self.size].iter().sum()
    }

    /// Returns the transitions at the given indices, without importance weights.
    ///
    /// Indices are positions in the underlying storage, not ages.
    pub fn get(&self, ixs: &[usize]) -> Result<GenericTransitionBatch<O, A>> {
        if let Some(ix) = ixs.iter().find(|&&ix| ix >= self.size) {
            return Err(RinkError::ReplayBufferUnderflow {
                requested: ix + 1,
                stored: self.size,
            }
            .into());
        }

        Ok(GenericTransitionBatch {
            obs: self.obs.sample(ixs)?,
            act: self.act.sample(ixs)?,
            next_obs: self.next_obs.sample(ixs)?,
            reward: Self::sample_slice(&self.reward, ixs),
            is_terminated: Self::sample_slice(&self.is_terminated, ixs),
            is_truncated: Self::sample_slice(&self.is_truncated, ixs),
            ix_sample: Some(ixs.to_vec()),
            weight: None,
        })
    }
}

impl<O, A> ExperienceBufferBase for SimpleReplayBuffer<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    type Item = GenericTransitionBatch<O, A>;

    fn len(&self) -> usize {
        self.size
    }

    fn push(&mut self, tr: Self::Item) -> Result<()> {
        let len = tr.len();
        let (obs, act, next_obs, reward, is_terminated, is_truncated, _, _) = tr.unpack();
        self.obs.push(self.i, obs)?;
        self.act.push(self.i, act)?;
        self.next_obs.push(self.i, next_obs)?;
        Self::push_slice(&mut self.reward, self.i, &reward);
        Self::push_slice(&mut self.is_terminated, self.i, &is_terminated);
        Self::push_slice(&mut self.is_truncated, self.i, &is_truncated);
        self.set_priority(len);

        self.i = (self.i + len) % self.capacity;
        self.size = (self.size + len).min(self.capacity);

        Ok(())
    }
}

impl<O, A> ReplayBufferBase for SimpleReplayBuffer<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    type Config = SimpleReplayBufferConfig;
    type Batch = GenericTransitionBatch<O, A>;

    fn build(config: &Self::Config) -> Self {
        let capacity = config.capacity;
        let per_state = config
            .per_config
            .as_ref()
            .map(|per_config| PerState::new(capacity, per_config));

        Self {
            capacity,
            i: 0,
            size: 0,
            obs: O::new(capacity),
            act: A::new(capacity),
            next_obs: O::new(capacity),
            reward: vec![0.; capacity],
            is_terminated: vec![0; capacity],
            is_truncated: vec![0; capacity],
            rng: StdRng::seed_from_u64(config.seed),
            per_state,
        }
    }

    fn batch(&mut self, size: usize) -> Result<Self::Batch> {
        if size > self.size {
            return Err(RinkError::ReplayBufferUnderflow {
                requested: size,
                stored: self.size,
            }
            .into());
        }

        let (ixs, weight) = match &self.per_state {
            Some(per_state) => {
                let beta = per_state.iw_scheduler.beta();
                let (ixs, weight) = per_state.sum_tree.sample(size, beta, &mut self.rng);
                (ixs, Some(weight))
            }
            None => {
                let ixs = rand::seq::index::sample(&mut self.rng, self.size, size).into_vec();
                (ixs, None)
            }
        };

        let mut batch = self.get(&ixs)?;
        batch.weight = weight;
        Ok(batch)
    }

    fn update_priority(&mut self, ixs: &Option<Vec<usize>>, td_errs: &Option<Vec<f32>>) -> Result<()> {
        if let Some(per_state) = &mut self.per_state {
            let (ixs, td_errs) = match (ixs, td_errs) {
                (Some(ixs), Some(td_errs)) => (ixs, td_errs),
                _ => {
                    return Err(RinkError::InvalidConfig(
                        "update_priority() requires sample indices and TD errors".to_string(),
                    )
                    .into())
                }
            };
            for (&ix, &td_err) in ixs.iter().zip(td_errs.iter()) {
                per_state.sum_tree.update(ix, td_err);
            }
            per_state.iw_scheduler.add_n_opts();
        }
        Ok(())
    }

    fn is_ready(&self, batch_size: usize) -> bool {
        batch_size <= self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dummy::VecBatch;
    use std::collections::HashSet;

    type Buffer = SimpleReplayBuffer<VecBatch, VecBatch>;

    fn transition(v: f32) -> GenericTransitionBatch<VecBatch, VecBatch> {
        GenericTransitionBatch {
            obs: VecBatch::from(vec![v]),
            act: VecBatch::from(vec![-v]),
            next_obs: VecBatch::from(vec![v + 1.0]),
            reward: vec![v],
            is_terminated: vec![0],
            is_truncated: vec![0],
            weight: None,
            ix_sample: None,
        }
    }

    fn build(capacity: usize, per: bool) -> Buffer {
        let per_config = if per { Some(PerConfig::default()) } else { None };
        let config = SimpleReplayBufferConfig::default()
            .capacity(capacity)
            .per_config(per_config);
        Buffer::build(&config)
    }

    #[test]
    fn test_ring_eviction() -> Result<()> {
        let mut buffer = build(3, false);
        for v in 0..5 {
            buffer.push(transition(v as f32))?;
        }
        assert_eq!(buffer.len(), 3);

        let batch = buffer.batch(3)?;
        let mut rewards = batch.reward.clone();
        rewards.sort_by(|a, b| a.total_cmp(b));
        assert_eq!(rewards, vec![2.0, 3.0, 4.0]);

        // Items in a transition stay aligned after wrap-around
        let (obs, act, next_obs, reward, ..) = batch.unpack();
        for j in 0..3 {
            assert_eq!(obs.data()[j], reward[j]);
            assert_eq!(act.data()[j], -reward[j]);
            assert_eq!(next_obs.data()[j], reward[j] + 1.0);
        }
        Ok(())
    }

    #[test]
    fn test_underflow() -> Result<()> {
        let mut buffer = build(10, false);
        for v in 0..3 {
            buffer.push(transition(v as f32))?;
        }
        assert!(!buffer.is_ready(4));
        assert!(buffer.is_ready(3));

        let err = buffer.batch(4).err().unwrap();
        assert!(matches!(
            err.downcast_ref::<RinkError>(),
            Some(RinkError::ReplayBufferUnderflow {
                requested: 4,
                stored: 3
            })
        ));
        Ok(())
    }

    #[test]
    fn test_sample_without_replacement() -> Result<()> {
        for per in [false, true] {
            let mut buffer = build(100, per);
            for v in 0..20 {
                buffer.push(transition(v as f32))?;
            }
            for _ in 0..50 {
                let batch = buffer.batch(20)?;
                let ixs: HashSet<_> = batch.ix_sample.as_ref().unwrap().iter().collect();
                assert_eq!(ixs.len(), 20);
                assert_eq!(batch.weight.is_some(), per);
            }
        }
        Ok(())
    }

    #[test]
    fn test_priority_update() -> Result<()> {
        let mut buffer = build(8, true);
        for v in 0..8 {
            buffer.push(transition(v as f32))?;
        }
        let ixs: Vec<usize> = (0..8).collect();
        let mut td_errs = vec![0.01f32; 8];
        td_errs[5] = 100.0;
        buffer.update_priority(&Some(ixs), &Some(td_errs))?;

        let n_hits = (0..200)
            .filter(|_| buffer.batch(1).unwrap().ix_sample.unwrap()[0] == 5)
            .count();
        assert!(n_hits > 180);

        let batch = buffer.batch(4)?;
        let ws = batch.weight.unwrap();
        assert!(ws.iter().all(|&w| w > 0.0 && w <= 1.0 + 1e-6));
        Ok(())
    }

    #[test]
    fn test_batch_normalized_weights() -> Result<()> {
        let per_config = PerConfig::default().normalize(WeightNormalizer::Batch);
        let config = SimpleReplayBufferConfig::default()
            .capacity(16)
            .seed(7)
            .per_config(Some(per_config));
        let mut buffer = Buffer::build(&config);
        for v in 0..16 {
            buffer.push(transition(v as f32))?;
        }
        let ixs: Vec<usize> = (0..16).collect();
        let td_errs: Vec<f32> = (0..16).map(|i| 0.1 * (i + 1) as f32).collect();
        buffer.update_priority(&Some(ixs), &Some(td_errs))?;

        for _ in 0..20 {
            let ws = buffer.batch(4)?.weight.unwrap();
            assert_eq!(ws.len(), 4);
            assert!(ws.iter().all(|&w| w > 0.0 && w <= 1.0));
            let w_max = ws.iter().fold(0f32, |m, &w| m.max(w));
            assert_eq!(w_max, 1.0);
        }
        Ok(())
    }
}
