//! Common types for distribution channels

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use shipit_core::config::LaunchpadConfig;

/// Which hosting instance to publish to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostingEnvironment {
    /// The real service
    Production,
    /// The test instance
    Staging,
}

impl HostingEnvironment {
    /// Web service root for this environment
    pub fn api_root<'a>(&self, config: &'a LaunchpadConfig) -> &'a str {
        match self {
            Self::Production => &config.production_api,
            Self::Staging => &config.staging_api,
        }
    }

    /// Site root used in download links
    pub fn web_root<'a>(&self, config: &'a LaunchpadConfig) -> &'a str {
        match self {
            Self::Production => &config.production_web,
            Self::Staging => &config.staging_web,
        }
    }
}

impl std::fmt::Display for HostingEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Production => write!(f, "production"),
            Self::Staging => write!(f, "staging"),
        }
    }
}

/// Anything identified by a name on the hosting platform
pub trait Named {
    /// Identifying name
    fn name(&self) -> &str;
}

/// A release series, e.g. `1.4`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Series {
    pub name: String,
    pub self_link: String,
}

/// A milestone, e.g. `1.4.0`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Milestone {
    pub name: String,
    pub self_link: String,
    #[serde(default)]
    pub is_active: bool,
}

/// A release record, identified by its milestone version
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Release {
    pub version: String,
    pub self_link: String,
}

impl Named for Series {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for Milestone {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for Release {
    fn name(&self) -> &str {
        &self.version
    }
}

/// Kind of file attached to a release
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseFileType {
    Installer,
    CodeTarball,
}

impl ReleaseFileType {
    /// Label the hosting platform expects
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Installer => "Installer file",
            Self::CodeTarball => "Code Release Tarball",
        }
    }
}

/// A file to attach to a release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactUpload {
    /// Remote file name
    pub file_name: String,
    /// Local file
    pub local_path: PathBuf,
    /// Short description shown on the download page
    pub description: String,
    /// MIME type
    pub content_type: String,
    /// Release file type
    pub file_type: ReleaseFileType,
}

/// Download links for a published release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedRelease {
    /// Whether the release record was created by this run
    pub is_new_release: bool,
    /// Core library
    pub jar_url: String,
    /// Source tarball
    pub tarball_url: String,
    /// Cross-platform archive
    pub zip_url: String,
    /// Windows installer
    pub exe_url: String,
}

/// A submitted announcement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRef {
    /// Full name of the post (`t3_...`)
    pub fullname: String,
    /// Forum the post was submitted to
    pub forum: String,
    /// Link to the post, when the service returned one
    pub url: Option<String>,
}
