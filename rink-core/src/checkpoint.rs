//! Versioned checkpoint manifest.
//!
//! A checkpoint is a directory holding named-tensor files written by an agent and a
//! manifest, `checkpoint.yaml`, listing every parameter with its file, shape and
//! dtype. Loading a checkpoint first reads the manifest; a missing directory or
//! manifest is reported as [`RinkError::CheckpointNotFound`] and a manifest of
//! another format version as [`RinkError::CheckpointVersion`].
use crate::error::RinkError;
use anyhow::Result;
use chrono::{DateTime, Local};
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::{BufReader, Write},
    path::{Path, PathBuf},
};

/// Format version written by this library.
pub const FORMAT_VERSION: u32 = 1;

/// Name of the manifest file in a checkpoint directory.
pub const MANIFEST_FILE: &str = "checkpoint.yaml";

/// A parameter tensor stored in a checkpoint.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ParamEntry {
    /// File name relative to the checkpoint directory.
    pub file: String,

    /// Name of the tensor in the file.
    pub name: String,

    /// Shape of the tensor.
    pub shape: Vec<usize>,

    /// Data type of the tensor.
    pub dtype: String,
}

/// Manifest of a checkpoint directory.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CheckpointManifest {
    /// Format version.
    pub format_version: u32,

    /// Kind of the agent, e.g., `"sac"`.
    pub agent: String,

    /// Creation time.
    pub created: DateTime<Local>,

    /// Parameters in the checkpoint.
    pub params: Vec<ParamEntry>,
}

impl CheckpointManifest {
    /// Creates an empty manifest for an agent of the given kind.
    pub fn new(agent: impl Into<String>) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            agent: agent.into(),
            created: Local::now(),
            params: vec![],
        }
    }

    /// Adds a parameter.
    pub fn push(
        &mut self,
        file: impl Into<String>,
        name: impl Into<String>,
        shape: Vec<usize>,
        dtype: impl Into<String>,
    ) {
        self.params.push(ParamEntry {
            file: file.into(),
            name: name.into(),
            shape,
            dtype: dtype.into(),
        });
    }

    /// Returns the distinct files referenced by the manifest, in order of appearance.
    pub fn files(&self) -> Vec<&str> {
        let mut files: Vec<&str> = vec![];
        for p in self.params.iter() {
            if !files.contains(&p.file.as_str()) {
                files.push(p.file.as_str());
            }
        }
        files
    }

    /// Returns the parameters stored in the given file.
    pub fn params_in<'a>(&'a self, file: &'a str) -> impl Iterator<Item = &'a ParamEntry> + 'a {
        self.params.iter().filter(move |p| p.file == file)
    }

    /// Writes the manifest into `dir`, creating the directory if needed.
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        fs::create_dir_all(dir.as_ref())?;
        let path = dir.as_ref().join(MANIFEST_FILE);
        let mut file = File::create(&path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        info!("Save checkpoint manifest to {:?}", path);
        Ok(path)
    }

    /// Reads the manifest in `dir` and checks its format version.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let path = dir.as_ref().join(MANIFEST_FILE);
        if !path.is_file() {
            return Err(RinkError::CheckpointNotFound(dir.as_ref().to_path_buf()).into());
        }

        let rdr = BufReader::new(File::open(&path)?);
        let manifest: Self = serde_yaml::from_reader(rdr)?;
        if manifest.format_version != FORMAT_VERSION {
            return Err(RinkError::CheckpointVersion {
                found: manifest.format_version,
                expected: FORMAT_VERSION,
            }
            .into());
        }
        info!("Load checkpoint manifest from {:?}", path);

        Ok(manifest)
    }

    /// Reads the manifest in `dir` and checks that it was written by `agent`.
    pub fn load_for(dir: impl AsRef<Path>, agent: &str) -> Result<Self> {
        let manifest = Self::load(dir)?;
        if manifest.agent != agent {
            return Err(RinkError::CheckpointKind {
                found: manifest.agent,
                expected: agent.to_string(),
            }
            .into());
        }
        Ok(manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_save_and_load() -> Result<()> {
        let dir = TempDir::new("checkpoint")?;
        let mut manifest = CheckpointManifest::new("sac");
        manifest.push("actor.safetensors", "actor.mlp.ln0.weight", vec![256, 18], "f32");
        manifest.push("actor.safetensors", "actor.mlp.ln0.bias", vec![256], "f32");
        manifest.push("critic.safetensors", "critic0.mlp.ln0.bias", vec![256], "f32");
        manifest.save(dir.path())?;

        let loaded = CheckpointManifest::load_for(dir.path(), "sac")?;
        assert_eq!(loaded, manifest);
        assert_eq!(loaded.files(), vec!["actor.safetensors", "critic.safetensors"]);
        assert_eq!(loaded.params_in("actor.safetensors").count(), 2);
        Ok(())
    }

    #[test]
    fn test_missing_checkpoint() {
        let err = CheckpointManifest::load("/nonexistent/rink/agent").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RinkError>(),
            Some(RinkError::CheckpointNotFound(_))
        ));
    }

    #[test]
    fn test_version_and_kind_mismatch() -> Result<()> {
        let dir = TempDir::new("checkpoint")?;
        let mut manifest = CheckpointManifest::new("dqn");
        manifest.format_version = FORMAT_VERSION + 1;
        manifest.save(dir.path())?;
        let err = CheckpointManifest::load(dir.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RinkError>(),
            Some(RinkError::CheckpointVersion { .. })
        ));

        CheckpointManifest::new("dqn").save(dir.path())?;
        let err = CheckpointManifest::load_for(dir.path(), "sac").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RinkError>(),
            Some(RinkError::CheckpointKind { .. })
        ));
        Ok(())
    }
}
