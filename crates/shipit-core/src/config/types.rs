//! Configuration types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Placeholder replaced with the full version string in templates
pub const VERSION_PLACEHOLDER: &str = "{version}";

/// Main configuration for Shipit
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Project naming
    pub project: ProjectConfig,

    /// Local file locations
    pub paths: PathsConfig,

    /// Artifact file names
    pub artifacts: ArtifactsConfig,

    /// Build commands
    pub build: BuildConfig,

    /// Git configuration
    pub git: GitConfig,

    /// Launchpad hosting configuration
    pub launchpad: LaunchpadConfig,

    /// FTP mirror configuration
    pub mirror: MirrorConfig,

    /// Reddit announcement configuration
    pub announce: AnnounceConfig,
}

/// Project naming
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Machine name, used in URLs
    pub name: String,

    /// Human-readable name, used in titles
    pub display_name: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: "chunky".to_string(),
            display_name: "Chunky".to_string(),
        }
    }
}

/// Local file locations, relative to the working directory
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Credential store file
    pub credentials: PathBuf,

    /// Update manifest
    pub manifest: PathBuf,

    /// Shared changelog file
    pub changelog: PathBuf,

    /// Directory holding `release_notes-<version>.txt` files
    pub release_notes_dir: PathBuf,

    /// Build output directory
    pub build_dir: PathBuf,

    /// Checkout of the documentation repository
    pub docs_repo: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            credentials: PathBuf::from("credentials.json"),
            manifest: PathBuf::from("latest.json"),
            changelog: PathBuf::from("ChangeLog.txt"),
            release_notes_dir: PathBuf::from("."),
            build_dir: PathBuf::from("build"),
            docs_repo: PathBuf::from("../git/chunky-docs"),
        }
    }
}

/// Artifact file name templates
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactsConfig {
    /// Core library jar
    pub core_library: String,

    /// Source tarball
    pub source_tarball: String,

    /// Cross-platform binary archive
    pub archive: String,

    /// Windows installer
    pub installer: String,

    /// Launcher jar (not versioned)
    pub launcher: String,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            core_library: "chunky-core-{version}.jar".to_string(),
            source_tarball: "chunky-{version}.tar.gz".to_string(),
            archive: "Chunky-{version}.zip".to_string(),
            installer: "Chunky-{version}.exe".to_string(),
            launcher: "ChunkyLauncher.jar".to_string(),
        }
    }
}

impl ArtifactsConfig {
    /// Expand every template for a version
    pub fn for_version(&self, version: &str) -> ArtifactSet {
        ArtifactSet {
            core_library: expand(&self.core_library, version),
            source_tarball: expand(&self.source_tarball, version),
            archive: expand(&self.archive, version),
            installer: expand(&self.installer, version),
            launcher: self.launcher.clone(),
        }
    }
}

/// Artifact file names for one version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSet {
    pub core_library: String,
    pub source_tarball: String,
    pub archive: String,
    pub installer: String,
    pub launcher: String,
}

/// A single external command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildCommand {
    /// Name used in progress and error messages
    pub label: String,

    /// Program to execute
    pub program: String,

    /// Arguments; `{version}` is replaced with the full version
    #[serde(default)]
    pub args: Vec<String>,
}

impl BuildCommand {
    /// Create a new command
    pub fn new(label: impl Into<String>, program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            label: label.into(),
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Arguments with the version placeholder expanded
    pub fn expanded_args(&self, version: &str) -> Vec<String> {
        self.args.iter().map(|a| expand(a, version)).collect()
    }
}

/// Build commands
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Commands for a release build, run in order
    pub release: Vec<BuildCommand>,

    /// Commands for a debug snapshot build, run in order
    pub snapshot: Vec<BuildCommand>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            release: vec![
                BuildCommand::new("Ant build", "ant", &["-Dversion={version}", "release"]),
                BuildCommand::new("NSIS build", "makensis", &["Chunky.nsi"]),
            ],
            snapshot: vec![BuildCommand::new(
                "Ant build",
                "ant",
                &["-Ddebug=true", "dist"],
            )],
        }
    }
}

/// Git configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitConfig {
    /// Git executable
    pub program: String,

    /// Remote name
    pub remote: String,

    /// Branch holding the version bump commit
    pub branch: String,

    /// Annotation message for snapshot tags
    pub snapshot_tag_message: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            program: "git".to_string(),
            remote: "origin".to_string(),
            branch: "master".to_string(),
            snapshot_tag_message: "Snapshot build".to_string(),
        }
    }
}

/// Launchpad hosting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchpadConfig {
    /// Launchpad project name
    pub project: String,

    /// OAuth consumer key
    pub consumer_key: String,

    /// Production web service root
    pub production_api: String,

    /// Staging web service root
    pub staging_api: String,

    /// Production site root, used for download links
    pub production_web: String,

    /// Staging site root, used for download links
    pub staging_web: String,

    /// Summary given to newly created series
    pub series_summary: String,
}

impl Default for LaunchpadConfig {
    fn default() -> Self {
        Self {
            project: "chunky".to_string(),
            consumer_key: "Releasebot".to_string(),
            production_api: "https://api.launchpad.net/devel".to_string(),
            staging_api: "https://api.staging.launchpad.net/devel".to_string(),
            production_web: "https://launchpad.net".to_string(),
            staging_web: "https://staging.launchpad.net".to_string(),
            series_summary: "The current stable series for Chunky. \
                NB: The code is maintained separately on GitHub."
                .to_string(),
        }
    }
}

/// FTP mirror configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    /// FTP host
    pub host: String,

    /// FTP control port
    pub port: u16,

    /// Remote directory for the launcher and manifest
    pub remote_dir: String,

    /// Remote subdirectory for libraries
    pub library_dir: String,

    /// Remote manifest name for releases
    pub release_manifest: String,

    /// Remote manifest name for snapshots
    pub snapshot_manifest: String,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            host: "ftp.llbit.se".to_string(),
            port: 21,
            remote_dir: "chunkyupdate".to_string(),
            library_dir: "lib".to_string(),
            release_manifest: "latest.json".to_string(),
            snapshot_manifest: "snapshot.json".to_string(),
        }
    }
}

/// Reddit announcement configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnounceConfig {
    /// Subreddit to post in
    pub subreddit: String,

    /// User agent sent to the API
    pub user_agent: String,

    /// Flair text for announcements
    pub flair_text: String,

    /// Flair CSS class for announcements
    pub flair_css_class: String,

    /// Launcher download link used in release drafts
    pub launcher_url: String,

    /// Snapshot download page used in snapshot posts
    pub snapshot_page_url: String,

    /// OAuth token endpoint root
    pub auth_url: String,

    /// Authenticated API root
    pub api_url: String,
}

impl Default for AnnounceConfig {
    fn default() -> Self {
        Self {
            subreddit: "chunky".to_string(),
            user_agent: "Releasebot".to_string(),
            flair_text: "announcement".to_string(),
            flair_css_class: "announcement".to_string(),
            launcher_url: "http://chunkyupdate.llbit.se/ChunkyLauncher.jar".to_string(),
            snapshot_page_url: "http://chunky.llbit.se/snapshot.html".to_string(),
            auth_url: "https://www.reddit.com".to_string(),
            api_url: "https://oauth.reddit.com".to_string(),
        }
    }
}

fn expand(template: &str, version: &str) -> String {
    template.replace(VERSION_PLACEHOLDER, version)
}
