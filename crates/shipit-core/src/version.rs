//! Version descriptor
//!
//! A release is identified by a version string of the form
//! `MAJOR.MINOR[.PATCH][-SUFFIX]`. The descriptor derives the milestone and
//! series names from it and loads the release notes and changelog text that
//! every later step publishes.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, info, instrument};

use crate::config::Config;
use crate::error::{NotesError, Result, VersionError};

fn version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d+\.\d+(\.\d+)?)-?([a-zA-Z]*\.?\d*)?$").expect("version pattern is valid")
    })
}

/// The parts of a version string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionName {
    /// Full version, e.g. `1.2.13-alpha1`
    pub full: String,
    /// `MAJOR.MINOR.PATCH`, or `MAJOR.MINOR` when the patch is omitted
    pub milestone: String,
    /// Trailing identifier, possibly empty
    pub suffix: String,
    /// `MAJOR.MINOR`
    pub series: String,
}

impl VersionName {
    /// Parse and validate a version string without touching the filesystem
    pub fn parse(input: &str) -> Result<Self> {
        let caps = version_regex()
            .captures(input)
            .ok_or_else(|| VersionError::InvalidFormat(input.to_string()))?;

        let milestone = caps
            .get(1)
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| VersionError::InvalidFormat(input.to_string()))?;
        let suffix = caps
            .get(3)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        let series = milestone.split('.').take(2).collect::<Vec<_>>().join(".");

        Ok(Self {
            full: input.to_string(),
            milestone,
            suffix,
            series,
        })
    }

    /// Whether this version carries a pre-release suffix
    pub fn is_prerelease(&self) -> bool {
        !self.suffix.is_empty()
    }
}

impl std::fmt::Display for VersionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.full)
    }
}

/// Where release notes and the changelog live
#[derive(Debug, Clone)]
pub struct DocumentPaths {
    /// Directory holding `release_notes-<version>.txt`
    pub notes_dir: PathBuf,
    /// Shared changelog file
    pub changelog: PathBuf,
}

impl DocumentPaths {
    /// Resolve configured paths against a root directory
    pub fn from_config(config: &Config, root: &Path) -> Self {
        Self {
            notes_dir: root.join(&config.paths.release_notes_dir),
            changelog: root.join(&config.paths.changelog),
        }
    }

    /// Release notes file for a version or milestone name
    pub fn release_notes(&self, name: &str) -> PathBuf {
        self.notes_dir.join(format!("release_notes-{}.txt", name))
    }
}

/// Validated version plus the documents published with it
#[derive(Debug, Clone)]
pub struct VersionDescriptor {
    name: VersionName,
    changelog: String,
    release_notes: String,
}

impl VersionDescriptor {
    /// Parse a version string and load its release notes and changelog.
    ///
    /// If only `release_notes-<milestone>.txt` exists it is copied to
    /// `release_notes-<full>.txt` first, and the full-version file is read
    /// from then on.
    #[instrument(skip(paths))]
    pub fn load(input: &str, paths: &DocumentPaths) -> Result<Self> {
        let name = VersionName::parse(input)?;
        debug!(milestone = %name.milestone, series = %name.series, "version parsed");

        let notes_path = resolve_release_notes(&name, paths)?;
        let release_notes = read_document(&notes_path)?.replace('\r', "");
        if release_notes.trim().is_empty() {
            return Err(NotesError::Empty(notes_path).into());
        }

        let changelog_content = read_document(&paths.changelog)?;
        let changelog = extract_changelog_block(&changelog_content);
        if changelog.is_empty() {
            return Err(NotesError::EmptyChangelog(paths.changelog.clone()).into());
        }

        info!(
            version = %name.full,
            notes = %notes_path.display(),
            changelog_lines = changelog.lines().count(),
            "release documents loaded"
        );

        Ok(Self {
            name,
            changelog,
            release_notes,
        })
    }

    /// Build a descriptor from already loaded text
    pub fn from_parts(
        name: VersionName,
        changelog: impl Into<String>,
        release_notes: impl Into<String>,
    ) -> Self {
        Self {
            name,
            changelog: changelog.into(),
            release_notes: release_notes.into(),
        }
    }

    /// Parsed version name
    pub fn name(&self) -> &VersionName {
        &self.name
    }

    /// Full version string
    pub fn full(&self) -> &str {
        &self.name.full
    }

    /// Milestone name
    pub fn milestone(&self) -> &str {
        &self.name.milestone
    }

    /// Series name
    pub fn series(&self) -> &str {
        &self.name.series
    }

    /// Pre-release suffix, possibly empty
    pub fn suffix(&self) -> &str {
        &self.name.suffix
    }

    /// Changelog block for this release
    pub fn changelog(&self) -> &str {
        &self.changelog
    }

    /// Release notes text
    pub fn release_notes(&self) -> &str {
        &self.release_notes
    }
}

fn resolve_release_notes(name: &VersionName, paths: &DocumentPaths) -> Result<PathBuf> {
    let full_path = paths.release_notes(&name.full);
    if full_path.exists() {
        return Ok(full_path);
    }

    let milestone_path = paths.release_notes(&name.milestone);
    if !milestone_path.exists() {
        return Err(NotesError::Missing {
            expected: milestone_path,
        }
        .into());
    }

    std::fs::copy(&milestone_path, &full_path).map_err(|source| NotesError::Unreadable {
        path: milestone_path.clone(),
        source,
    })?;
    info!(
        from = %milestone_path.display(),
        to = %full_path.display(),
        "copied milestone release notes"
    );
    Ok(full_path)
}

fn read_document(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| {
        NotesError::Unreadable {
            path: path.to_path_buf(),
            source,
        }
        .into()
    })
}

/// Extract the entry block of the newest changelog section.
///
/// The first line is the version header. Entries follow, one per line,
/// until the first blank line.
pub fn extract_changelog_block(content: &str) -> String {
    content
        .lines()
        .skip(1)
        .map(str::trim_end)
        .take_while(|line| !line.is_empty())
        .fold(String::new(), |mut block, line| {
            block.push_str(line);
            block.push('\n');
            block
        })
}
