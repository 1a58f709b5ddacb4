//! Errors of the hockey environment.
use thiserror::Error;

/// Errors of the hockey environment.
#[derive(Error, Debug)]
pub enum HockeyEnvError {
    /// The mode is none of `normal`, `shooting` and `defense`.
    #[error("Unknown mode: {0:?} (expected normal, shooting or defense)")]
    UnknownMode(String),

    /// The action table is neither `default` nor `custom`.
    #[error("Unknown action table: {0:?} (expected default or custom)")]
    UnknownActionTable(String),

    /// A method of the Python environment returned a value of unexpected shape.
    #[error("Unexpected return value of {method}: {detail}")]
    UnexpectedReturn {
        /// Name of the Python method.
        method: String,

        /// Description of the value.
        detail: String,
    },

    /// An observation does not have the expected number of elements.
    #[error("Observation has {found} elements, expected {expected}")]
    ObsDim {
        /// Number of elements found.
        found: usize,

        /// Number of elements expected.
        expected: usize,
    },

    /// A discrete action is out of the action table.
    #[error("Action index {index} is out of the action table with {len} entries")]
    ActionIndex {
        /// The action index.
        index: i64,

        /// Number of entries in the table.
        len: usize,
    },

    /// A discrete action was given to an environment without an action table.
    #[error("Discrete actions need an action table")]
    NoActionTable,
}
