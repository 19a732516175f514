//! Error types for Shipit

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using ShipitError
pub type Result<T> = std::result::Result<T, ShipitError>;

/// Coarse classification used by the pipeline to decide abort-vs-continue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid input (version string, configuration)
    Validation,
    /// Filesystem read/write failure
    Io,
    /// Rejected credentials or authorization
    Auth,
    /// A required document, record or entry does not exist
    NotFound,
    /// An artifact upload failed
    Upload,
    /// A subprocess failed or could not be spawned
    Process,
    /// Transport or remote API failure
    Network,
    /// Anything else
    Other,
}

impl ErrorKind {
    /// Returns the string representation of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Io => "io",
            Self::Auth => "auth",
            Self::NotFound => "not-found",
            Self::Upload => "upload",
            Self::Process => "process",
            Self::Network => "network",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for Shipit operations
#[derive(Debug, Error)]
pub enum ShipitError {
    /// Configuration-related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Version string errors
    #[error(transparent)]
    Version(#[from] VersionError),

    /// Release notes and changelog errors
    #[error(transparent)]
    Notes(#[from] NotesError),

    /// Update manifest errors
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// Credential store errors
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// Subprocess errors
    #[error(transparent)]
    Process(#[from] ProcessError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl ShipitError {
    /// Create a new "other" error with a message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Self::Other(msg.into())
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(e) => match e {
                ConfigError::NotFound(_) => ErrorKind::NotFound,
                ConfigError::Io(_) => ErrorKind::Io,
                _ => ErrorKind::Validation,
            },
            Self::Version(_) => ErrorKind::Validation,
            Self::Notes(e) => match e {
                NotesError::Unreadable { .. } => ErrorKind::Io,
                _ => ErrorKind::NotFound,
            },
            Self::Manifest(e) => match e {
                ManifestError::EntryNotFound { .. } => ErrorKind::NotFound,
                ManifestError::Io(_) => ErrorKind::Io,
                _ => ErrorKind::Validation,
            },
            Self::Credential(e) => match e {
                CredentialError::Prompt { .. } => ErrorKind::Other,
                _ => ErrorKind::Io,
            },
            Self::Process(_) => ErrorKind::Process,
            Self::Io(_) => ErrorKind::Io,
            Self::Json(_) => ErrorKind::Validation,
            Self::Other(_) => ErrorKind::Other,
        }
    }
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found at {0}")]
    NotFound(PathBuf),

    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {message}")]
    InvalidValue { field: String, message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// IO error
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),
}

/// Version string errors
#[derive(Debug, Error)]
pub enum VersionError {
    /// Version does not match the release grammar
    #[error("Invalid version name: {0} (expected e.g. 1.2.13-alpha1)")]
    InvalidFormat(String),
}

/// Release notes and changelog errors
#[derive(Debug, Error)]
pub enum NotesError {
    /// Neither the full-version nor the milestone release notes exist
    #[error("Release notes not found! Please edit {expected}")]
    Missing { expected: PathBuf },

    /// Release notes file exists but has no content
    #[error("Release notes are empty: {0}")]
    Empty(PathBuf),

    /// A document could not be read
    #[error("Failed to read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The changelog block for this version is empty
    #[error("ChangeLog is empty: {0}")]
    EmptyChangelog(PathBuf),

    /// The announcement draft has not been written yet
    #[error("Release announcement draft not found at {0}")]
    DraftMissing(PathBuf),
}

/// Update manifest errors
#[derive(Debug, Error)]
pub enum ManifestError {
    /// Manifest could not be parsed
    #[error("Could not parse manifest {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Manifest parsed but holds nothing
    #[error("Manifest {0} is empty")]
    Empty(PathBuf),

    /// Manifest has no usable libraries array
    #[error("Manifest {path} is malformed: {reason}")]
    Malformed { path: PathBuf, reason: String },

    /// No library entry with the requested name
    #[error("Failed to patch url in {path}: library {name} not found")]
    EntryNotFound { path: PathBuf, name: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Credential store errors
#[derive(Debug, Error)]
pub enum CredentialError {
    /// Credential file could not be parsed
    #[error("Could not parse credential file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Credential file could not be written
    #[error("Could not save credential file {path}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Operator input failed
    #[error("Could not read {name} from operator: {reason}")]
    Prompt { name: String, reason: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Subprocess errors
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Command could not be started
    #[error("Failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Command exited unsuccessfully
    #[error("{label} failed: {command} exited with {code}")]
    Failed {
        label: String,
        command: String,
        code: String,
    },
}
