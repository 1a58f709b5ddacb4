use crate::{
    model::SubModel1,
    opt::{Optimizer, OptimizerConfig},
    util::{load_varmap, save_varmap, OutDim},
};
use anyhow::{Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::{VarBuilder, VarMap};
use rink_core::checkpoint::CheckpointManifest;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::{Path, PathBuf},
};

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`DqnModel`].
pub struct DqnModelConfig<Q>
where
    Q: OutDim,
{
    pub(super) q_config: Option<Q>,
    pub(super) opt_config: OptimizerConfig,
}

impl<Q> Default for DqnModelConfig<Q>
where
    Q: OutDim,
{
    fn default() -> Self {
        Self {
            q_config: None,
            opt_config: OptimizerConfig::default(),
        }
    }
}

impl<Q> DqnModelConfig<Q>
where
    Q: DeserializeOwned + Serialize + OutDim,
{
    /// Sets configurations for action-value function.
    pub fn q_config(mut self, v: Q) -> Self {
        self.q_config = Some(v);
        self
    }

    /// Sets output dimension of the model.
    pub fn out_dim(mut self, v: usize) -> Self {
        if let Some(q_config) = &mut self.q_config {
            q_config.set_out_dim(v);
        }
        self
    }

    /// Sets optimizer configuration.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.opt_config = v;
        self
    }

    /// Constructs [`DqnModelConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`DqnModelConfig`] to as a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// Action-value function with its optimizer.
///
/// Variables are named with the prefix given at construction, e.g., `qnet.mlp.ln0.weight`.
pub struct DqnModel<Q>
where
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim,
{
    varmap: VarMap,
    prefix: String,

    // Dimension of the output vector (equal to the number of actions).
    out_dim: usize,

    q: Q,
    opt: Optimizer,
}

impl<Q> DqnModel<Q>
where
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    /// Constructs [`DqnModel`] whose variables are prefixed with `prefix`.
    pub fn build(
        config: DqnModelConfig<Q::Config>,
        device: &Device,
        prefix: impl Into<String>,
    ) -> Result<Self> {
        let prefix = prefix.into();
        let q_config = config.q_config.context("q_config is not set.")?;
        let out_dim = q_config.get_out_dim();
        let varmap = VarMap::new();
        let q = {
            let vb = VarBuilder::from_varmap(&varmap, DType::F32, device).set_prefix(&prefix);
            Q::build(vb, q_config)?
        };
        let opt = config.opt_config.build(varmap.all_vars())?;

        Ok(Self {
            varmap,
            prefix,
            out_dim,
            q,
            opt,
        })
    }

    /// Outputs the action values of shape `[batch_size, n_actions]`.
    pub fn forward(&self, obs: &Tensor) -> Result<Tensor> {
        self.q.forward(obs)
    }

    /// The number of actions.
    pub fn out_dim(&self) -> usize {
        self.out_dim
    }

    /// Does an optimization step given a loss.
    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        self.opt.backward_step(loss)
    }

    /// Returns the variables of the model.
    pub fn varmap(&self) -> &VarMap {
        &self.varmap
    }

    /// Prefix of the variable names.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn file_name(&self) -> String {
        format!("{}.safetensors", self.prefix)
    }

    /// Saves the parameters in `dir` as `(prefix).safetensors`.
    pub fn save(&self, dir: &Path, manifest: &mut CheckpointManifest) -> Result<PathBuf> {
        save_varmap(&self.varmap, dir, &self.file_name(), manifest)
    }

    /// Loads the parameters from `dir`.
    pub fn load(&mut self, dir: &Path, manifest: &CheckpointManifest) -> Result<()> {
        let file = self.file_name();
        load_varmap(&mut self.varmap, dir, &file, manifest)
    }
}
