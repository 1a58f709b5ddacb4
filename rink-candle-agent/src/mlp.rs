//! Multilayer perceptron.
mod base;
mod config;
mod mlp2;
use anyhow::Result;
pub use base::Mlp;
use candle_core::Tensor;
use candle_nn::{linear, Linear, Module, VarBuilder};
pub use config::MlpConfig;
pub use mlp2::Mlp2;

/// Returns linear layers `ln0, ln1, ...` under `prefix` for the given `(in, out)` pairs.
fn create_linear_layers(
    prefix: &str,
    vb: &VarBuilder,
    in_out_pairs: &[(usize, usize)],
) -> Result<Vec<Linear>> {
    let vb = vb.pp(prefix);
    in_out_pairs
        .iter()
        .enumerate()
        .map(|(i, &(in_dim, out_dim))| Ok(linear(in_dim, out_dim, vb.pp(format!("ln{}", i)))?))
        .collect()
}

/// Applies the layers with ReLU between them. The last layer is linear.
fn mlp_forward(xs: Tensor, layers: &[Linear]) -> Result<Tensor> {
    let mut xs = xs;
    for (i, layer) in layers.iter().enumerate() {
        xs = layer.forward(&xs)?;
        if i + 1 < layers.len() {
            xs = xs.relu()?;
        }
    }
    Ok(xs)
}
