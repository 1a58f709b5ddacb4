//! Optimizers.
use anyhow::Result;
use candle_core::{Tensor, Var};
use candle_nn::Optimizer as _;
use candle_optimisers::adam::{Adam, ParamsAdam};
use serde::{Deserialize, Serialize};

/// Configuration of the Adam optimizer of a model.
///
/// The actor, the critics, the entropy coefficient and the Q-network of DQN each own an
/// optimizer built from this configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct OptimizerConfig {
    /// Learning rate.
    pub lr: f64,
}

impl OptimizerConfig {
    /// Constructs an optimizer of the given variables.
    pub fn build(&self, vars: Vec<Var>) -> Result<Optimizer> {
        let params = ParamsAdam {
            lr: self.lr,
            ..ParamsAdam::default()
        };
        Ok(Optimizer(Adam::new(vars, params)?))
    }

    /// Sets the learning rate.
    pub fn learning_rate(mut self, lr: f64) -> Self {
        self.lr = lr;
        self
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self { lr: 3e-4 }
    }
}

/// Adam optimizer over a fixed set of variables.
pub struct Optimizer(Adam);

impl Optimizer {
    /// Computes the gradients of `loss` and updates the variables.
    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        Ok(self.0.backward_step(loss)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;

    #[test]
    fn test_backward_step_descends() -> Result<()> {
        let x = Var::new(&[2f32, -1.0], &Device::Cpu)?;
        let mut opt = OptimizerConfig::default()
            .learning_rate(0.1)
            .build(vec![x.clone()])?;

        for _ in 0..5 {
            let loss = x.as_tensor().sqr()?.sum_all()?;
            opt.backward_step(&loss)?;
        }
        let v = x.as_tensor().to_vec1::<f32>()?;
        assert!(v[0] < 2.0 && v[0] > 0.0);
        assert!(v[1] > -1.0 && v[1] < 0.0);
        Ok(())
    }
}
