//! Sum tree for prioritized sampling.
use rand::Rng;
use segment_tree::{ops::MinIgnoreNaN, SegmentPoint};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Redraws over the whole priority mass when a stratified draw hits an index
/// already in the batch.
const MAX_REDRAWS: usize = 32;

/// Normalization of importance sampling weights.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone, Copy)]
pub enum WeightNormalizer {
    /// Normalize by the maximum weight over all transitions in the buffer.
    All,

    /// Normalize by the maximum weight in the sampled batch.
    Batch,
}

#[derive(Debug)]
pub struct SumTree {
    eps: f32,
    alpha: f32,
    capacity: usize,
    n_samples: usize,
    tree: Vec<f32>,
    min_tree: SegmentPoint<f32, MinIgnoreNaN>,
    max_p: f32,
    normalize: WeightNormalizer,
}

impl SumTree {
    pub fn new(capacity: usize, alpha: f32, normalize: WeightNormalizer) -> Self {
        Self {
            eps: 1e-8,
            alpha,
            capacity,
            n_samples: 0,
            tree: vec![0f32; 2 * capacity - 1],
            min_tree: SegmentPoint::build(vec![f32::MAX; capacity], MinIgnoreNaN),
            max_p: 1.0,
            normalize,
        }
    }

    fn propagate(&mut self, ix: usize, change: f32) {
        let mut ix = ix;
        while ix != 0 {
            ix = (ix - 1) / 2;
            self.tree[ix] += change;
        }
    }

    fn retrieve(&self, s: f32) -> usize {
        let mut ix = 0;
        let mut s = s;
        loop {
            let left = 2 * ix + 1;
            let right = left + 1;
            if left >= self.tree.len() {
                return ix;
            }
            if s <= self.tree[left] || self.tree[right] == 0f32 {
                ix = left;
            } else {
                s -= self.tree[left];
                ix = right;
            }
        }
    }

    pub fn total(&self) -> f32 {
        self.tree[0]
    }

    /// The largest raw priority seen so far, given to new transitions.
    pub fn max(&self) -> f32 {
        self.max_p
    }

    /// Sets priority `p` at the `ix`-th element, counting it as a new sample
    /// until the tree is full.
    pub fn add(&mut self, ix: usize, p: f32) {
        debug_assert!(ix <= self.n_samples || self.n_samples == self.capacity);
        self.update(ix, p);
        if self.n_samples < self.capacity {
            self.n_samples += 1;
        }
    }

    /// Updates the priority of the `ix`-th element.
    ///
    /// The value stored in the tree is $(p + \epsilon)^\alpha$.
    pub fn update(&mut self, ix: usize, p: f32) {
        debug_assert!(ix < self.capacity);
        let p = p.abs();
        if p > self.max_p {
            self.max_p = p;
        }

        let p = (p + self.eps).powf(self.alpha);
        self.min_tree.modify(ix, p);
        let ix = ix + self.capacity - 1;
        let change = p - self.tree[ix];
        self.tree[ix] = p;
        self.propagate(ix, change);
    }

    /// Returns the index of the element in which the cumulative priority reaches `s`.
    pub fn get(&self, s: f32) -> usize {
        let ix = self.retrieve(s);
        debug_assert!(ix >= (self.capacity - 1));
        (ix + 1 - self.capacity).min(self.n_samples.saturating_sub(1))
    }

    /// Samples `batch_size` distinct indices and returns them with importance weights.
    ///
    /// Draws are stratified over the cumulative priority. A draw hitting an index
    /// already in the batch is redrawn over the whole mass; indices still missing
    /// after [`MAX_REDRAWS`] attempts are filled uniformly from the unselected ones.
    ///
    /// The weight is $w_i=\left(N P(i)\right)^{-\beta}$, divided by the maximum
    /// weight according to [`WeightNormalizer`].
    ///
    /// `batch_size` must not exceed the number of samples in the tree.
    pub fn sample(&self, batch_size: usize, beta: f32, rng: &mut impl Rng) -> (Vec<usize>, Vec<f32>) {
        debug_assert!(batch_size <= self.n_samples);
        let p_sum = self.total();
        let segment = p_sum / batch_size as f32;
        let mut selected = HashSet::with_capacity(batch_size);
        let mut ixs = Vec::with_capacity(batch_size);

        for i in 0..batch_size {
            let mut ix = self.get(segment * (i as f32 + rng.gen::<f32>()));
            let mut n_redraws = 0;
            while selected.contains(&ix) && n_redraws < MAX_REDRAWS {
                ix = self.get(p_sum * rng.gen::<f32>());
                n_redraws += 1;
            }
            if selected.insert(ix) {
                ixs.push(ix);
            }
        }

        if ixs.len() < batch_size {
            let rest: Vec<usize> = (0..self.n_samples)
                .filter(|ix| !selected.contains(ix))
                .collect();
            let n = batch_size - ixs.len();
            for j in rand::seq::index::sample(rng, rest.len(), n).into_iter() {
                ixs.push(rest[j]);
            }
        }

        let n = self.n_samples as f32 / p_sum;
        let ws: Vec<f32> = ixs
            .iter()
            .map(|ix| (n * self.tree[ix + self.capacity - 1]).powf(-beta))
            .collect();
        let w_max = match self.normalize {
            WeightNormalizer::All => {
                let p_min = self.min_tree.query(0, self.n_samples);
                (n * p_min).powf(-beta)
            }
            WeightNormalizer::Batch => ws.iter().fold(f32::MIN_POSITIVE, |m, w| w.max(m)),
        };
        let ws = ws.iter().map(|w| w / w_max).collect();

        (ixs, ws)
    }
}

#[cfg(test)]
mod tests {
    use super::{SumTree, WeightNormalizer};
    use rand::{rngs::StdRng, SeedableRng};
    use std::collections::HashSet;

    fn build(data: &[f32]) -> SumTree {
        let mut sum_tree = SumTree::new(8, 1.0, WeightNormalizer::All);
        for (ix, p) in data.iter().enumerate() {
            sum_tree.add(ix, *p);
        }
        sum_tree
    }

    #[test]
    fn test_sum_tree_get() {
        let sum_tree = build(&[0.5f32, 0.2, 0.8, 0.3, 1.1, 2.5, 3.9]);

        assert_eq!(sum_tree.get(0.0), 0);
        assert_eq!(sum_tree.get(0.4), 0);
        assert_eq!(sum_tree.get(0.5), 0);
        assert_eq!(sum_tree.get(0.6), 1);
        assert_eq!(sum_tree.get(1.2), 2);
        assert_eq!(sum_tree.get(1.6), 3);
        assert_eq!(sum_tree.get(2.0), 4);
        assert_eq!(sum_tree.get(2.8), 4);
        assert!((sum_tree.total() - 9.3).abs() < 1e-4);
        assert_eq!(sum_tree.max(), 3.9);
    }

    #[test]
    fn test_sample_distinct_with_bounded_weights() {
        let sum_tree = build(&[0.5f32, 0.2, 0.8, 0.3, 1.1, 2.5, 3.9]);
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..100 {
            let (ixs, ws) = sum_tree.sample(7, 0.5, &mut rng);
            let set: HashSet<_> = ixs.iter().collect();
            assert_eq!(set.len(), 7);
            assert!(ixs.iter().all(|&ix| ix < 7));
            assert!(ws.iter().all(|&w| w > 0.0 && w <= 1.0 + 1e-6));
        }
    }

    #[test]
    fn test_update_shifts_mass() {
        let mut sum_tree = build(&[1.0f32; 4]);
        sum_tree.update(2, 1000.0);
        let mut rng = StdRng::seed_from_u64(0);

        let n_hits = (0..1000)
            .filter(|_| sum_tree.sample(1, 1.0, &mut rng).0[0] == 2)
            .count();
        assert!(n_hits > 950);
    }
}
