//! Saving and loading [`VarMap`]s as parts of a checkpoint.
use super::lock;
use anyhow::Result;
use candle_nn::VarMap;
use log::info;
use rink_core::{checkpoint::CheckpointManifest, error::RinkError};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Saves `varmap` as a safetensors file `dir/file` and adds its variables to `manifest`.
pub fn save_varmap(
    varmap: &VarMap,
    dir: &Path,
    file: &str,
    manifest: &mut CheckpointManifest,
) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(file);
    varmap.save(&path)?;

    let data = lock(varmap)?;
    let mut entries: Vec<_> = data.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    for (name, var) in entries {
        manifest.push(file, name, var.dims().to_vec(), var.dtype().as_str());
    }
    info!("Save parameters to {:?}", path);

    Ok(path)
}

/// Loads `varmap` from `dir/file`.
///
/// Every variable listed in `manifest` for the file must exist in `varmap` with the
/// same shape.
pub fn load_varmap(
    varmap: &mut VarMap,
    dir: &Path,
    file: &str,
    manifest: &CheckpointManifest,
) -> Result<()> {
    {
        let data = lock(varmap)?;
        for p in manifest.params_in(file) {
            match data.get(&p.name) {
                Some(var) if var.dims() == p.shape.as_slice() => {}
                Some(var) => {
                    return Err(RinkError::InvalidConfig(format!(
                        "Shape of {} is {:?} in the checkpoint, {:?} in the model",
                        p.name,
                        p.shape,
                        var.dims()
                    ))
                    .into())
                }
                None => {
                    return Err(RinkError::InvalidConfig(format!(
                        "Unknown parameter {} in the checkpoint",
                        p.name
                    ))
                    .into())
                }
            }
        }
    }

    let path = dir.join(file);
    varmap.load(&path)?;
    info!("Load parameters from {:?}", path);

    Ok(())
}
