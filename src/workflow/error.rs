//! Workflow error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::storage::InvalidNameError;
use crate::tracker::TrackerError;

/// Result type for loading workflows and building plans.
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Errors raised before a plan runs.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("could not read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("unknown workflow: {0}")]
    UnknownWorkflow(String),

    #[error("workflow '{0}' is defined more than once")]
    DuplicateWorkflow(String),

    #[error("workflow '{0}' has no steps")]
    EmptyWorkflow(String),

    #[error("missing variable '{name}' (pass --var {name}=...)")]
    MissingVariable { name: String },

    #[error("malformed template '{template}': {reason}")]
    Template { template: String, reason: String },

    #[error("invalid value for {field}: '{value}'")]
    InvalidValue { field: String, value: String },

    #[error("invalid branch name: {0}")]
    InvalidName(#[from] InvalidNameError),

    #[error("workflow uses tracker steps but no [tracker] section is configured")]
    TrackerNotConfigured,

    #[error("tracker error: {0}")]
    Tracker(#[from] TrackerError),
}
