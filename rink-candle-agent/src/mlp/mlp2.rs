use super::{create_linear_layers, mlp_forward, MlpConfig};
use crate::model::SubModel1;
use anyhow::{Context, Result};
use candle_core::{Device, Module, Tensor};
use candle_nn::{linear, Linear, VarBuilder};

/// Multilayer perceptron that outputs two tensors of the same size.
///
/// The hidden layers are followed by ReLU. The heads `mean` and `log_std` give the
/// mean and the log standard deviation of a Gaussian policy.
pub struct Mlp2 {
    device: Device,
    head1: Linear,
    head2: Linear,
    layers: Vec<Linear>,
}

impl SubModel1 for Mlp2 {
    type Config = MlpConfig;
    type Input = Tensor;
    type Output = (Tensor, Tensor);

    fn forward(&self, xs: &Self::Input) -> Result<Self::Output> {
        let xs = xs.to_device(&self.device)?;
        let xs = mlp_forward(xs, &self.layers)?.relu()?;
        let mean = self.head1.forward(&xs)?;
        let log_std = self.head2.forward(&xs)?;
        Ok((mean, log_std))
    }

    fn build(vb: VarBuilder, config: Self::Config) -> Result<Self> {
        let device = vb.device().clone();
        let mut dims = vec![config.in_dim];
        dims.extend(config.units.iter());
        let in_out_pairs: Vec<_> = dims.windows(2).map(|w| (w[0], w[1])).collect();
        let layers = create_linear_layers("mlp", &vb, &in_out_pairs)?;
        let in_dim = *config.units.last().context("Mlp2 needs a hidden layer")?;
        let head1 = linear(in_dim, config.out_dim, vb.pp("mean"))?;
        let head2 = linear(in_dim, config.out_dim, vb.pp("log_std"))?;

        Ok(Self {
            device,
            head1,
            head2,
            layers,
        })
    }
}
