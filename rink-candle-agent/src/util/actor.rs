//! Actor with Gaussian policy.
use crate::{
    model::SubModel1,
    opt::{Optimizer, OptimizerConfig},
    util::{load_varmap, save_varmap, OutDim},
};
use anyhow::{Context, Result};
use candle_core::{DType, Device, Tensor, D};
use candle_nn::{VarBuilder, VarMap};
use rink_core::checkpoint::CheckpointManifest;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::{Path, PathBuf},
};

const ACTOR_FILE: &str = "actor.safetensors";

/// Sum of the log densities of the standard normal over the last dimension.
fn normal_logp(z: &Tensor) -> Result<Tensor> {
    let c = -0.5 * (2.0 * std::f64::consts::PI).ln();
    Ok(z.sqr()?.affine(-0.5, c)?.sum(D::Minus1)?)
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`GaussianActor`].
pub struct GaussianActorConfig<P: OutDim> {
    /// Configuration of the policy network.
    pub policy_config: Option<P>,

    /// Configuration of the optimizer.
    pub opt_config: OptimizerConfig,

    /// Lower bound of the log standard deviation.
    pub min_log_std: f64,

    /// Upper bound of the log standard deviation.
    pub max_log_std: f64,
}

impl<P: OutDim> Default for GaussianActorConfig<P> {
    fn default() -> Self {
        Self {
            policy_config: None,
            opt_config: OptimizerConfig::default(),
            min_log_std: -20.0,
            max_log_std: 2.0,
        }
    }
}

impl<P> GaussianActorConfig<P>
where
    P: DeserializeOwned + Serialize + OutDim,
{
    /// Sets the minimum value of log std.
    pub fn min_log_std(mut self, v: f64) -> Self {
        self.min_log_std = v;
        self
    }

    /// Sets the maximum value of log std.
    pub fn max_log_std(mut self, v: f64) -> Self {
        self.max_log_std = v;
        self
    }

    /// Sets configurations for policy function.
    pub fn policy_config(mut self, v: P) -> Self {
        self.policy_config = Some(v);
        self
    }

    /// Sets output dimension of the model.
    pub fn out_dim(mut self, v: usize) -> Self {
        if let Some(pi_config) = &mut self.policy_config {
            pi_config.set_out_dim(v);
        }
        self
    }

    /// Sets optimizer configuration.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.opt_config = v;
        self
    }

    /// Loads [`GaussianActorConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`GaussianActorConfig`] as YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// Actor with tanh-squashed Gaussian policy.
pub struct GaussianActor<P>
where
    P: SubModel1<Input = Tensor, Output = (Tensor, Tensor)>,
    P::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    device: Device,
    varmap: VarMap,

    // Dimension of the action vector.
    out_dim: usize,

    policy: P,
    opt: Optimizer,

    // Min/max log std
    min_log_std: f64,
    max_log_std: f64,
}

impl<P> GaussianActor<P>
where
    P: SubModel1<Input = Tensor, Output = (Tensor, Tensor)>,
    P::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    /// Constructs [`GaussianActor`].
    pub fn build(config: GaussianActorConfig<P::Config>, device: Device) -> Result<Self> {
        let policy_config = config.policy_config.context("policy_config is not set.")?;
        let out_dim = policy_config.get_out_dim();
        let varmap = VarMap::new();
        let policy = {
            let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device).set_prefix("actor");
            P::build(vb, policy_config)?
        };
        let opt = config.opt_config.build(varmap.all_vars())?;

        Ok(Self {
            device,
            out_dim,
            varmap,
            opt,
            policy,
            min_log_std: config.min_log_std,
            max_log_std: config.max_log_std,
        })
    }

    /// Returns the mean and the standard deviation of the Gaussian distribution.
    ///
    /// The shape of the both tensors is `(batch_size, action_dimension)`.
    pub fn forward(&self, obs: &Tensor) -> Result<(Tensor, Tensor)> {
        let (mean, log_std) = self.policy.forward(&obs.to_device(&self.device)?)?;
        debug_assert_eq!(mean.dims().len(), 2);
        debug_assert_eq!(mean.dims()[1], self.out_dim);
        let std = log_std.clamp(self.min_log_std, self.max_log_std)?.exp()?;
        Ok((mean, std))
    }

    /// Samples actions with the reparameterization trick and returns them with their
    /// log probabilities.
    ///
    /// Actions have shape `(batch_size, action_dimension)` and log probabilities
    /// `(batch_size,)`. The log probability includes the correction of the tanh
    /// squashing.
    pub fn sample_with_logp(&self, obs: &Tensor) -> Result<(Tensor, Tensor)> {
        let (mean, std) = self.forward(obs)?;
        let z = mean.randn_like(0., 1.)?;
        let u = (&mean + (&std * &z)?)?;
        let act = u.tanh()?;

        let log_det_std = std.log()?.sum(D::Minus1)?;
        let log_jacobian = act.sqr()?.affine(-1.0, 1.0 + 1e-6)?.log()?.sum(D::Minus1)?;
        let logp = ((normal_logp(&z)? - log_det_std)? - log_jacobian)?;

        Ok((act, logp))
    }

    /// Returns the deterministic action `tanh(mean)`.
    pub fn greedy(&self, obs: &Tensor) -> Result<Tensor> {
        let (mean, _) = self.forward(obs)?;
        Ok(mean.tanh()?)
    }

    /// Does an optimization step given a loss.
    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        self.opt.backward_step(loss)
    }

    /// Returns the variables of the policy network.
    pub fn varmap(&self) -> &VarMap {
        &self.varmap
    }

    /// Saves the parameters in `dir` and registers them in `manifest`.
    pub fn save(&self, dir: &Path, manifest: &mut CheckpointManifest) -> Result<PathBuf> {
        save_varmap(&self.varmap, dir, ACTOR_FILE, manifest)
    }

    /// Loads the parameters from `dir`.
    pub fn load(&mut self, dir: &Path, manifest: &CheckpointManifest) -> Result<()> {
        load_varmap(&mut self.varmap, dir, ACTOR_FILE, manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mlp::{Mlp2, MlpConfig};

    fn actor() -> Result<GaussianActor<Mlp2>> {
        let config = GaussianActorConfig::default().policy_config(MlpConfig::new(3, vec![8], 2, false));
        GaussianActor::<Mlp2>::build(config, Device::Cpu)
    }

    #[test]
    fn test_sample_shapes_and_bounds() -> Result<()> {
        let actor = actor()?;
        let obs = Tensor::randn(0f32, 1., (5, 3), &Device::Cpu)?;
        let (act, logp) = actor.sample_with_logp(&obs)?;
        assert_eq!(act.dims(), &[5, 2]);
        assert_eq!(logp.dims(), &[5]);

        let act: Vec<Vec<f32>> = act.to_vec2()?;
        assert!(act.iter().flatten().all(|a| a.abs() <= 1.0));
        let logp: Vec<f32> = logp.to_vec1()?;
        assert!(logp.iter().all(|v| v.is_finite()));

        let greedy = actor.greedy(&obs)?;
        assert_eq!(greedy.dims(), &[5, 2]);
        Ok(())
    }

    #[test]
    fn test_logp_of_unit_gaussian() -> Result<()> {
        let z = Tensor::from_slice(&[0f32, 0.], (1, 2), &Device::Cpu)?;
        let logp: Vec<f32> = normal_logp(&z)?.to_vec1()?;
        let expected = -(2.0 * std::f32::consts::PI).ln();
        assert!((logp[0] - expected).abs() < 1e-5);
        Ok(())
    }
}
