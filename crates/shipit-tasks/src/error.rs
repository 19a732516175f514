//! Pipeline error types

use shipit_core::{ErrorKind, ShipitError};
use shipit_stores::StoreError;
use thiserror::Error;

/// Errors that stop a pipeline run
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Local failure (documents, manifest, subprocess, credentials)
    #[error(transparent)]
    Core(#[from] ShipitError),

    /// Distribution channel failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// An answer from the operator could not be read
    #[error("Could not read answer: {0}")]
    Gate(#[source] std::io::Error),

    /// `--steps` named a step that does not exist
    #[error("Unknown step '{0}' (expected one of: {1})")]
    UnknownStep(String, String),
}

impl PipelineError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Core(e) => e.kind(),
            Self::Store(e) => e.kind(),
            Self::Gate(_) => ErrorKind::Other,
            Self::UnknownStep(..) => ErrorKind::Validation,
        }
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;
