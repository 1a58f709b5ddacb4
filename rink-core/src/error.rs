//! Errors in the library.
use std::path::PathBuf;
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug)]
pub enum RinkError {
    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: expected {0}")]
    RecordValueTypeError(String),

    /// The replay buffer holds fewer transitions than requested.
    #[error("Replay buffer underflow: requested {requested} transitions, {stored} stored")]
    ReplayBufferUnderflow {
        /// The requested batch size.
        requested: usize,

        /// The number of transitions in the buffer.
        stored: usize,
    },

    /// The checkpoint directory or its manifest does not exist.
    #[error("Checkpoint not found: {0:?}")]
    CheckpointNotFound(PathBuf),

    /// The checkpoint was written with an unsupported format version.
    #[error("Unsupported checkpoint format version {found} (expected {expected})")]
    CheckpointVersion {
        /// Version found in the manifest.
        found: u32,

        /// Version supported by this library.
        expected: u32,
    },

    /// The checkpoint was written by another kind of agent.
    #[error("Checkpoint was written by agent {found:?}, expected {expected:?}")]
    CheckpointKind {
        /// Agent kind found in the manifest.
        found: String,

        /// Agent kind of the caller.
        expected: String,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
