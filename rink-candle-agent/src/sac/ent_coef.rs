//! Entropy coefficient of SAC.
use crate::{
    opt::{Optimizer, OptimizerConfig},
    util::{load_varmap, save_varmap},
};
use anyhow::Result;
use candle_core::{DType, Device, Tensor};
use candle_nn::{init::Init, VarBuilder, VarMap};
use rink_core::checkpoint::CheckpointManifest;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const ENT_COEF_FILE: &str = "ent_coef.safetensors";

/// Mode of the entropy coefficient of SAC.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub enum EntCoefMode {
    /// Use a constant as alpha.
    Fix(f64),
    /// Automatic tuning given `(target_entropy, learning_rate)`.
    Auto(f64, f64),
}

/// The entropy coefficient of SAC.
pub struct EntCoef {
    varmap: VarMap,
    log_alpha: Tensor,
    target_entropy: Option<f64>,
    opt: Option<Optimizer>,
}

impl EntCoef {
    /// Constructs an instance of `EntCoef`.
    pub fn new(mode: EntCoefMode, device: Device) -> Result<Self> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let (log_alpha, target_entropy, opt) = match mode {
            EntCoefMode::Fix(alpha) => {
                let init = Init::Const(alpha.ln());
                let log_alpha = vb.get_with_hints(1, "log_alpha", init)?;
                (log_alpha, None, None)
            }
            EntCoefMode::Auto(target_entropy, learning_rate) => {
                let init = Init::Const(0.0);
                let log_alpha = vb.get_with_hints(1, "log_alpha", init)?;
                let opt = OptimizerConfig::default()
                    .learning_rate(learning_rate)
                    .build(varmap.all_vars())?;
                (log_alpha, Some(target_entropy), Some(opt))
            }
        };

        Ok(Self {
            varmap,
            log_alpha,
            opt,
            target_entropy,
        })
    }

    /// Returns the entropy coefficient as a tensor of shape `[1]`.
    pub fn alpha(&self) -> Result<Tensor> {
        Ok(self.log_alpha.detach().exp()?)
    }

    /// Returns the entropy coefficient.
    pub fn alpha_scalar(&self) -> Result<f32> {
        Ok(self.alpha()?.sum_all()?.to_scalar::<f32>()?)
    }

    /// Updates `log(alpha)` given log probabilities of sampled actions.
    ///
    /// The loss is `-log(alpha) * (logp + target_entropy)`. It does nothing with
    /// [`EntCoefMode::Fix`].
    pub fn update(&mut self, logp: &Tensor) -> Result<()> {
        if let (Some(target_entropy), Some(opt)) = (self.target_entropy, self.opt.as_mut()) {
            let loss = {
                let tmp = (logp.detach() + target_entropy)?;
                self.log_alpha.broadcast_mul(&tmp)?.mean_all()?.neg()?
            };
            opt.backward_step(&loss)?;
        }
        Ok(())
    }

    /// Saves the parameter in `dir`.
    pub fn save(&self, dir: &Path, manifest: &mut CheckpointManifest) -> Result<PathBuf> {
        save_varmap(&self.varmap, dir, ENT_COEF_FILE, manifest)
    }

    /// Loads the parameter from `dir`.
    pub fn load(&mut self, dir: &Path, manifest: &CheckpointManifest) -> Result<()> {
        load_varmap(&mut self.varmap, dir, ENT_COEF_FILE, manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_alpha() -> Result<()> {
        let mut ent_coef = EntCoef::new(EntCoefMode::Fix(0.2), Device::Cpu)?;
        let logp = Tensor::from_slice(&[-1f32, 3.0], (2,), &Device::Cpu)?;
        ent_coef.update(&logp)?;
        assert!((ent_coef.alpha_scalar()? - 0.2).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn test_auto_alpha_moves_toward_target_entropy() -> Result<()> {
        // Entropy -5 below the target -2 increases alpha
        let mut ent_coef = EntCoef::new(EntCoefMode::Auto(-2.0, 0.01), Device::Cpu)?;
        let logp = Tensor::from_slice(&[5f32, 5.0], (2,), &Device::Cpu)?;
        ent_coef.update(&logp)?;
        assert!(ent_coef.alpha_scalar()? > 1.0);
        Ok(())
    }
}
