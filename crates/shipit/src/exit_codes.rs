//! Exit codes for the CLI

use shipit_core::{ErrorKind, ShipitError};
use shipit_stores::StoreError;
use shipit_tasks::PipelineError;

/// Success
pub const SUCCESS: i32 = 0;

/// General error
pub const ERROR: i32 = 1;

/// Configuration error
pub const CONFIG_ERROR: i32 = 2;

/// Invalid version or missing release documents
pub const VERSION_ERROR: i32 = 4;

/// Build, tag or push command failed
pub const PROCESS_ERROR: i32 = 6;

/// Upload or remote service failure
pub const PUBLISH_ERROR: i32 = 7;

/// Exit code for an error that ended the run
pub fn for_error(error: &anyhow::Error) -> i32 {
    if let Some(e) = error.downcast_ref::<PipelineError>() {
        return match e {
            PipelineError::Core(ShipitError::Config(_)) => CONFIG_ERROR,
            other => for_kind(other.kind()),
        };
    }
    if let Some(e) = error.downcast_ref::<ShipitError>() {
        return match e {
            ShipitError::Config(_) => CONFIG_ERROR,
            other => for_kind(other.kind()),
        };
    }
    if let Some(e) = error.downcast_ref::<StoreError>() {
        return for_kind(e.kind());
    }
    ERROR
}

fn for_kind(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Validation | ErrorKind::NotFound => VERSION_ERROR,
        ErrorKind::Process => PROCESS_ERROR,
        ErrorKind::Auth | ErrorKind::Upload | ErrorKind::Network => PUBLISH_ERROR,
        ErrorKind::Io | ErrorKind::Other => ERROR,
    }
}
