//! Critic for agents with continuous action.
use crate::{
    model::SubModel2,
    opt::{Optimizer, OptimizerConfig},
    util::{load_varmap, save_varmap, track_with_replace_substring},
};
use anyhow::{Context, Result};
use candle_core::{DType::F32, Device, Tensor, D};
use candle_nn::{VarBuilder, VarMap};
use rink_core::checkpoint::CheckpointManifest;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::{Path, PathBuf},
};

const CRITIC_FILE: &str = "critic.safetensors";
const CRITIC_TGT_FILE: &str = "critic_tgt.safetensors";

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`MultiCritic`].
pub struct MultiCriticConfig<Q> {
    /// The number of critic networks.
    pub n_nets: usize,

    /// Configuration of critic networks.
    pub q_config: Option<Q>,

    /// Configuration of the optimizer.
    pub opt_config: OptimizerConfig,

    /// Soft update coefficient.
    pub tau: f64,
}

impl<Q> Default for MultiCriticConfig<Q> {
    fn default() -> Self {
        Self {
            n_nets: 2,
            q_config: None,
            opt_config: OptimizerConfig::default(),
            tau: 0.005,
        }
    }
}

impl<Q> MultiCriticConfig<Q>
where
    Q: DeserializeOwned + Serialize,
{
    /// Sets the numver of critic networks.
    pub fn n_nets(mut self, v: usize) -> Self {
        self.n_nets = v;
        self
    }

    /// Sets configurations for action-value function.
    pub fn q_config(mut self, v: Q) -> Self {
        self.q_config = Some(v);
        self
    }

    /// Sets optimizer configuration.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.opt_config = v;
        self
    }

    /// Sets soft update parameter tau.
    pub fn tau(mut self, v: f64) -> Self {
        self.tau = v;
        self
    }

    /// Constructs [`MultiCriticConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`MultiCriticConfig`] as YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// Critic for agents with continuous action.
///
/// It takes observations and actions as inputs and outputs action values.
///
/// This struct has multiple q functions and corresponding target networks.
/// Variables of the `i`-th network are named `critic{i}.*` and those of its target
/// network `critic_tgt{i}.*`. Target networks are copies of the critics when
/// constructed and change only with [`MultiCritic::soft_update`].
pub struct MultiCritic<Q>
where
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + Clone,
{
    tau: f64,
    varmap: VarMap,
    varmap_tgt: VarMap,
    qs: Vec<Q>,
    qs_tgt: Vec<Q>,
    opt: Optimizer,
}

impl<Q> MultiCritic<Q>
where
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + Clone,
{
    /// Constructs [`MultiCritic`].
    pub fn build(config: MultiCriticConfig<Q::Config>, device: Device) -> Result<MultiCritic<Q>> {
        let n_nets = config.n_nets;
        let q_config = config.q_config.context("q_config is not set.")?;

        // Critic networks
        let (varmap, qs) = Self::build_critic_networks(&q_config, &device, n_nets, "critic")?;

        // Target networks
        let (varmap_tgt, qs_tgt) =
            Self::build_critic_networks(&q_config, &device, n_nets, "critic_tgt")?;

        // Optimizer, shared with critic networks
        let opt = config.opt_config.build(varmap.all_vars())?;

        // Hard update
        track_with_replace_substring(&varmap_tgt, &varmap, 1.0, ("critic", "critic_tgt"))?;

        Ok(Self {
            tau: config.tau,
            varmap,
            varmap_tgt,
            qs,
            qs_tgt,
            opt,
        })
    }

    fn build_critic_networks(
        q_config: &Q::Config,
        device: &Device,
        n_nets: usize,
        prefix: &str,
    ) -> Result<(VarMap, Vec<Q>)> {
        let varmap = VarMap::new();
        let qs = (0..n_nets)
            .map(|ix| {
                let vb = VarBuilder::from_varmap(&varmap, F32, device)
                    .set_prefix(format!("{}{}", prefix, ix));
                Q::build(vb, q_config.clone())
            })
            .collect::<Result<Vec<_>>>()?;

        Ok((varmap, qs))
    }

    /// Applies soft update to the target networks with coefficient `tau`.
    pub fn soft_update(&mut self) -> Result<()> {
        track_with_replace_substring(
            &self.varmap_tgt,
            &self.varmap,
            self.tau,
            ("critic", "critic_tgt"),
        )
    }

    fn forward_all(qs: &[Q], obs: &Tensor, act: &Tensor) -> Result<Vec<Tensor>> {
        // [batch_size, 1] -> [batch_size]
        qs.iter()
            .map(|q| Ok(q.forward(obs, act)?.squeeze(D::Minus1)?))
            .collect()
    }

    /// Returns action values of all critics, each of shape `[batch_size]`.
    pub fn qvals(&self, obs: &Tensor, act: &Tensor) -> Result<Vec<Tensor>> {
        Self::forward_all(&self.qs, obs, act)
    }

    /// Returns minimum action values of all critics.
    pub fn qvals_min(&self, obs: &Tensor, act: &Tensor) -> Result<Tensor> {
        let qvals = Tensor::stack(&self.qvals(obs, act)?, 0)?; // [n_nets, batch_size]
        Ok(qvals.min(0)?)
    }

    /// Returns minimum action values of all target critics.
    pub fn qvals_min_tgt(&self, obs: &Tensor, act: &Tensor) -> Result<Tensor> {
        let qvals = Tensor::stack(&Self::forward_all(&self.qs_tgt, obs, act)?, 0)?;
        Ok(qvals.min(0)?)
    }

    /// Backward step for all variables in critic networks.
    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        self.opt.backward_step(loss)
    }

    /// Returns the variables of the critics.
    pub fn varmap(&self) -> &VarMap {
        &self.varmap
    }

    /// Returns the variables of the target critics.
    pub fn varmap_tgt(&self) -> &VarMap {
        &self.varmap_tgt
    }

    /// Saves the critics and the target critics in `dir`.
    pub fn save(&self, dir: &Path, manifest: &mut CheckpointManifest) -> Result<(PathBuf, PathBuf)> {
        let path = save_varmap(&self.varmap, dir, CRITIC_FILE, manifest)?;
        let path_tgt = save_varmap(&self.varmap_tgt, dir, CRITIC_TGT_FILE, manifest)?;
        Ok((path, path_tgt))
    }

    /// Loads the critics and the target critics from `dir`.
    pub fn load(&mut self, dir: &Path, manifest: &CheckpointManifest) -> Result<()> {
        load_varmap(&mut self.varmap, dir, CRITIC_FILE, manifest)?;
        load_varmap(&mut self.varmap_tgt, dir, CRITIC_TGT_FILE, manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{mlp::Mlp, mlp::MlpConfig, util::lock};

    fn critic(tau: f64) -> Result<MultiCritic<Mlp>> {
        let config = MultiCriticConfig::default()
            .q_config(MlpConfig::new(5, vec![8, 8], 1, false))
            .tau(tau);
        MultiCritic::<Mlp>::build(config, Device::Cpu)
    }

    /// Max absolute difference between each critic variable and its target.
    fn max_diff(critic: &MultiCritic<Mlp>) -> Result<f32> {
        let src = lock(critic.varmap())?;
        let tgt = lock(critic.varmap_tgt())?;
        assert_eq!(src.len(), tgt.len());
        let mut d = 0f32;
        for (k, v) in tgt.iter() {
            let v_src = src.get(&k.replace("critic_tgt", "critic")).unwrap();
            let diff: f32 = (v.as_tensor() - v_src.as_tensor())?
                .abs()?
                .flatten_all()?
                .max(0)?
                .to_scalar()?;
            d = d.max(diff);
        }
        Ok(d)
    }

    #[test]
    fn test_targets_equal_critics_at_build() -> Result<()> {
        let critic = critic(0.005)?;
        assert_eq!(max_diff(&critic)?, 0.0);
        Ok(())
    }

    #[test]
    fn test_soft_update_follows_critics() -> Result<()> {
        let obs = Tensor::randn(0f32, 1., (4, 3), &Device::Cpu)?;
        let act = Tensor::randn(0f32, 1., (4, 2), &Device::Cpu)?;

        // tau = 0 keeps targets, tau = 1 copies critics.
        for (tau, moved) in [(0.0, false), (1.0, true)] {
            let mut critic = critic(tau)?;
            let loss = Tensor::stack(&critic.qvals(&obs, &act)?, 0)?.sum_all()?;
            critic.backward_step(&loss)?;
            assert!(max_diff(&critic)? > 0.0);
            critic.soft_update()?;
            assert_eq!(max_diff(&critic)? == 0.0, moved);
        }
        Ok(())
    }

    #[test]
    fn test_qvals_shapes() -> Result<()> {
        let critic = critic(0.005)?;
        let obs = Tensor::randn(0f32, 1., (1, 3), &Device::Cpu)?;
        let act = Tensor::randn(0f32, 1., (1, 2), &Device::Cpu)?;
        let qs = critic.qvals(&obs, &act)?;
        assert_eq!(qs.len(), 2);
        assert_eq!(qs[0].dims(), &[1]);
        assert_eq!(critic.qvals_min(&obs, &act)?.dims(), &[1]);
        assert_eq!(critic.qvals_min_tgt(&obs, &act)?.dims(), &[1]);
        Ok(())
    }
}
