//! Exploration strategy of DQN.
use anyhow::Result;
use candle_core::{shape::D, DType, Tensor};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Epsilon-greedy explorer for DQN.
///
/// Epsilon decays linearly from `eps_start` to `eps_final` over `final_step` calls of
/// [`EpsilonGreedy::action`] and stays at `eps_final` afterwards.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct EpsilonGreedy {
    /// The number of actions taken so far.
    pub n_steps: usize,

    /// Epsilon at the first step.
    pub eps_start: f64,

    /// Epsilon after `final_step` steps.
    pub eps_final: f64,

    /// The number of steps until epsilon reaches `eps_final`.
    pub final_step: usize,
}

impl Default for EpsilonGreedy {
    fn default() -> Self {
        Self {
            n_steps: 0,
            eps_start: 1.0,
            eps_final: 0.02,
            final_step: 100_000,
        }
    }
}

impl EpsilonGreedy {
    /// Constructs epsilon-greedy explorer with the given final step.
    pub fn with_final_step(final_step: usize) -> Self {
        Self {
            final_step,
            ..Default::default()
        }
    }

    /// Set the epsilon value at the final step.
    pub fn eps_final(mut self, v: f64) -> Self {
        self.eps_final = v;
        self
    }

    /// Set the epsilon value at the start.
    pub fn eps_start(mut self, v: f64) -> Self {
        self.eps_start = v;
        self
    }

    /// Returns the current epsilon.
    pub fn eps(&self) -> f64 {
        if self.final_step == 0 {
            return self.eps_final;
        }
        let d = (self.eps_start - self.eps_final) / (self.final_step as f64);
        (self.eps_start - d * self.n_steps as f64).max(self.eps_final)
    }

    /// Takes actions based on action values of shape `[batch_size, n_actions]`.
    ///
    /// Returns an `i64` tensor of shape `[batch_size]`.
    pub fn action(&mut self, qvals: &Tensor, rng: &mut impl Rng) -> Result<Tensor> {
        let is_random = rng.gen::<f64>() < self.eps();
        self.n_steps += 1;

        if is_random {
            let (n_samples, n_actions) = qvals.dims2()?;
            let act: Vec<i64> = (0..n_samples)
                .map(|_| rng.gen_range(0..n_actions) as i64)
                .collect();
            Ok(Tensor::from_vec(act, (n_samples,), qvals.device())?)
        } else {
            Ok(qvals.argmax(D::Minus1)?.to_dtype(DType::I64)?)
        }
    }
}
