//! Shipit Core - Core library for release publishing
//!
//! This crate provides the foundational types, error handling, configuration,
//! credential storage, version metadata and release documents used by the
//! Shipit release pipeline.

pub mod config;
pub mod credentials;
pub mod documents;
pub mod error;
pub mod manifest;
pub mod process;
pub mod prompt;
pub mod version;

pub use config::Config;
pub use credentials::CredentialStore;
pub use documents::{ReleaseDocuments, ReleaseLinks};
pub use error::{ErrorKind, Result, ShipitError};
pub use manifest::{patch_manifest, UpdateManifest};
pub use process::{CommandRunner, CommandSpec, SystemRunner};
pub use prompt::Prompter;
pub use version::{DocumentPaths, VersionDescriptor};
