//! Utilities.
use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor, Var};
use candle_nn::VarMap;
use log::trace;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::MutexGuard};
pub mod actor;
mod checkpoint;
pub mod critic;
pub use checkpoint::{load_varmap, save_varmap};

/// Critic loss type.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub enum CriticLoss {
    /// Mean squared error.
    Mse,

    /// Smooth L1 loss.
    SmoothL1,
}

impl CriticLoss {
    /// Returns the loss of each sample, not reduced.
    pub fn elementwise(&self, pred: &Tensor, tgt: &Tensor) -> Result<Tensor> {
        let d = (pred - tgt)?;
        match self {
            Self::Mse => Ok(d.sqr()?),
            Self::SmoothL1 => {
                let a = d.abs()?;
                let quad = (a.sqr()? * 0.5)?;
                let lin = (&a - 0.5)?;
                Ok(a.lt(1.0)?.where_cond(&quad, &lin)?)
            }
        }
    }

    /// Returns the mean loss, weighted by `weight` if given.
    ///
    /// `weight` holds importance weights of prioritized experience replay.
    pub fn loss(&self, pred: &Tensor, tgt: &Tensor, weight: Option<&Tensor>) -> Result<Tensor> {
        let elems = self.elementwise(pred, tgt)?;
        match weight {
            None => Ok(elems.mean_all()?),
            Some(w) => Ok((elems * w)?.mean_all()?),
        }
    }
}

pub(crate) fn lock(varmap: &VarMap) -> Result<MutexGuard<'_, HashMap<String, Var>>> {
    varmap
        .data()
        .lock()
        .map_err(|_| anyhow!("VarMap mutex is poisoned"))
}

/// Apply soft update on variables.
///
/// Variables are identified by their names.
///
/// dest = tau * src + (1.0 - tau) * dest
pub fn track(dest: &VarMap, src: &VarMap, tau: f64) -> Result<()> {
    track_with_replace_substring(dest, src, tau, ("", ""))
}

/// Apply soft update on variables whose names differ by a substring.
///
/// The variable `k` in `dest` is updated with the variable in `src` whose name is
/// `k` with `ss_dest` replaced by `ss_src`.
pub fn track_with_replace_substring(
    dest: &VarMap,
    src: &VarMap,
    tau: f64,
    (ss_src, ss_dest): (&str, &str),
) -> Result<()> {
    trace!("track with tau = {}", tau);
    let dest = lock(dest)?;
    let src = lock(src)?;

    for (k_dest, v_dest) in dest.iter() {
        let k_src = match ss_dest.is_empty() {
            true => k_dest.clone(),
            false => k_dest.replace(ss_dest, ss_src),
        };
        let v_src = src
            .get(&k_src)
            .ok_or_else(|| anyhow!("No variable {} in the source", k_src))?;
        let t_src = v_src.as_tensor();
        let t_dest = v_dest.as_tensor();
        let t_dest = ((tau * t_src)? + ((1.0 - tau) * t_dest)?)?;
        v_dest.set(&t_dest)?;
    }

    Ok(())
}

/// Interface for handling output dimensions.
pub trait OutDim {
    /// Returns the output dimension.
    fn get_out_dim(&self) -> usize;

    /// Sets the  output dimension.
    fn set_out_dim(&mut self, v: usize);
}

/// Returns `gamma * (1 - is_terminated)` as a tensor of shape `[batch_size]`.
///
/// Truncated transitions are bootstrapped, so the truncation flags are not used here.
pub fn gamma_not_terminated(gamma: f64, is_terminated: &[i8], device: &Device) -> Result<Tensor> {
    let v: Vec<f32> = is_terminated
        .iter()
        .map(|t| (gamma * (1 - *t) as f64) as f32)
        .collect();
    Ok(Tensor::from_slice(&v[..], (v.len(),), device)?)
}

/// Returns a tensor of shape `[batch_size]` from a vector.
pub fn vec_to_tensor(v: &[f32], device: &Device) -> Result<Tensor> {
    Ok(Tensor::from_slice(v, (v.len(),), device)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::DType;
    use candle_nn::Init;

    fn varmap(name: &str, value: &[f32]) -> Result<VarMap> {
        let vm = VarMap::new();
        let init = Init::Randn {
            mean: 0.0,
            stdev: 1.0,
        };
        vm.get((3,), name, init, DType::F32, &Device::Cpu)?;
        let t = Tensor::from_slice(value, (3,), &Device::Cpu)?;
        lock(&vm)?.get(name).unwrap().set(&t)?;
        Ok(vm)
    }

    fn values(vm: &VarMap, name: &str) -> Vec<f32> {
        lock(vm)
            .unwrap()
            .get(name)
            .unwrap()
            .as_tensor()
            .to_vec1::<f32>()
            .unwrap()
    }

    #[test]
    fn test_track() -> Result<()> {
        let vm_src = varmap("var1", &[1.0, 2.0, 3.0])?;
        let vm_dest = varmap("var1", &[4.0, 5.0, 6.0])?;
        track(&vm_dest, &vm_src, 0.5)?;
        assert_eq!(values(&vm_dest, "var1"), vec![2.5, 3.5, 4.5]);
        Ok(())
    }

    #[test]
    fn test_track_bounds() -> Result<()> {
        let vm_src = varmap("critic0.w", &[1.0, 2.0, 3.0])?;
        let vm_dest = varmap("critic_tgt0.w", &[4.0, 5.0, 6.0])?;

        track_with_replace_substring(&vm_dest, &vm_src, 0.0, ("critic", "critic_tgt"))?;
        assert_eq!(values(&vm_dest, "critic_tgt0.w"), vec![4.0, 5.0, 6.0]);

        track_with_replace_substring(&vm_dest, &vm_src, 1.0, ("critic", "critic_tgt"))?;
        assert_eq!(values(&vm_dest, "critic_tgt0.w"), vec![1.0, 2.0, 3.0]);
        Ok(())
    }

    #[test]
    fn test_track_missing_source() -> Result<()> {
        let vm_src = varmap("a", &[1.0, 2.0, 3.0])?;
        let vm_dest = varmap("b", &[4.0, 5.0, 6.0])?;
        assert!(track(&vm_dest, &vm_src, 0.5).is_err());
        Ok(())
    }

    #[test]
    fn test_smooth_l1() -> Result<()> {
        let pred = Tensor::from_slice(&[0.0f32, 0.0, 0.0], (3,), &Device::Cpu)?;
        let tgt = Tensor::from_slice(&[0.5f32, -2.0, 3.0], (3,), &Device::Cpu)?;
        let e: Vec<f32> = CriticLoss::SmoothL1.elementwise(&pred, &tgt)?.to_vec1()?;
        assert_eq!(e, vec![0.125, 1.5, 2.5]);

        let w = Tensor::from_slice(&[1.0f32, 0.0, 0.0], (3,), &Device::Cpu)?;
        let l: f32 = CriticLoss::Mse.loss(&pred, &tgt, Some(&w))?.to_scalar()?;
        assert!((l - 0.25 / 3.0).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn test_gamma_not_terminated() -> Result<()> {
        let t: Vec<f32> = gamma_not_terminated(0.5, &[0, 1, 0], &Device::Cpu)?.to_vec1()?;
        assert_eq!(t, vec![0.5, 0.0, 0.5]);
        Ok(())
    }
}
