//! Error types shared by every stage of a run

use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong while preparing or executing a run
#[derive(Debug, Error)]
pub enum SprtError {
    /// A filesystem operation on the workspace or a binary failed
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An external program could not be started at all
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// A step ran but reported failure (strict mode only)
    #[error("step `{step}` failed: {status}")]
    StepFailed { step: String, status: String },

    /// The configuration file or the resolved configuration is unusable
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to serialize run record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to parse run record: {0}")]
    Deserialize(#[source] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SprtError>;
