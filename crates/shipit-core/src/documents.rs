//! Release documents
//!
//! Renders the markdown announcement draft, the download-link properties
//! file, the snapshot announcement body and the documentation page. The
//! draft written here is the single source for both the release post and
//! the docs page.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::config::Config;
use crate::error::{NotesError, Result};
use crate::version::VersionDescriptor;

/// Download links a release draft points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseLinks {
    /// Windows installer
    pub exe_url: String,
    /// Cross-platform archive
    pub zip_url: String,
}

/// Renders and stores the documents published alongside a release
#[derive(Debug, Clone)]
pub struct ReleaseDocuments {
    display_name: String,
    build_dir: PathBuf,
    launcher_url: String,
    snapshot_page_url: String,
}

impl ReleaseDocuments {
    /// Create from configuration, resolving the build directory against `root`
    pub fn from_config(config: &Config, root: &Path) -> Self {
        Self {
            display_name: config.project.display_name.clone(),
            build_dir: root.join(&config.paths.build_dir),
            launcher_url: config.announce.launcher_url.clone(),
            snapshot_page_url: config.announce.snapshot_page_url.clone(),
        }
    }

    /// Build output directory
    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    /// Announcement draft for a milestone
    pub fn draft_path(&self, milestone: &str) -> PathBuf {
        self.build_dir.join(format!("release_notes-{}.md", milestone))
    }

    /// Download-link properties file for a milestone
    pub fn properties_path(&self, milestone: &str) -> PathBuf {
        self.build_dir.join(format!("version-{}.properties", milestone))
    }

    /// Markdown announcement for a release
    pub fn render_draft(&self, version: &VersionDescriptor, links: &ReleaseLinks) -> String {
        format!(
            "###Downloads\n\
             \n\
             * [Windows installer]({exe})\n\
             * [Cross-platform binaries]({zip})\n\
             * [Only launcher (win, mac, linux)]({launcher})\n\
             \n\
             ###Release Notes\n\
             \n\
             {notes}\n\
             \n\
             ###ChangeLog\n\
             \n\
             {changelog}",
            exe = links.exe_url,
            zip = links.zip_url,
            launcher = self.launcher_url,
            notes = version.release_notes(),
            changelog = version.changelog(),
        )
    }

    /// Properties consumed by the website build
    pub fn render_properties(&self, version: &VersionDescriptor, links: &ReleaseLinks) -> String {
        format!(
            "version={}\nexe.dl.link={}\nzip.dl.link={}",
            version.milestone(),
            links.exe_url,
            links.zip_url
        )
    }

    /// Write the draft and properties file into the build directory.
    ///
    /// Returns the draft path. Existing files are overwritten.
    #[instrument(skip(self, version, links), fields(milestone = %version.milestone()))]
    pub fn write_release_notes(
        &self,
        version: &VersionDescriptor,
        links: &ReleaseLinks,
    ) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.build_dir)?;

        let draft = self.draft_path(version.milestone());
        std::fs::write(&draft, self.render_draft(version, links))?;

        let properties = self.properties_path(version.milestone());
        std::fs::write(&properties, self.render_properties(version, links))?;

        info!(
            draft = %draft.display(),
            properties = %properties.display(),
            "release notes written"
        );
        Ok(draft)
    }

    /// Read the announcement draft for a milestone
    pub fn read_draft(&self, milestone: &str) -> Result<String> {
        let path = self.draft_path(milestone);
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(NotesError::DraftMissing(path).into())
            }
            Err(source) => Err(NotesError::Unreadable { path, source }.into()),
        }
    }

    /// Markdown body of a snapshot announcement
    pub fn render_snapshot_body(&self, version: &VersionDescriptor) -> String {
        format!(
            "###Snapshot {full}\n\
             \n\
             A new snapshot for {app} is now available. The snapshot is mostly untested,\n\
             so please make sure to backup your scenes before using it.\n\
             \n\
             [The snapshot can be downloaded using the launcher.]({page})\n\
             \n\
             ###Notes\n\
             \n\
             *These are preliminary release notes for upcoming features (which may not be fully functional).*\n\
             \n\
             {notes}\n\
             \n\
             ###ChangeLog\n\
             \n\
             {changelog}",
            full = version.full(),
            app = self.display_name,
            page = self.snapshot_page_url,
            notes = version.release_notes(),
            changelog = version.changelog(),
        )
    }

    /// Documentation page: a title header followed by the draft
    pub fn render_docs_page(&self, milestone: &str, draft: &str) -> String {
        format!(
            "{} {}\n============\n\n{}",
            self.display_name, milestone, draft
        )
    }

    /// Copy the draft into a documentation checkout as
    /// `docs/release/<milestone>/release_notes.md`.
    #[instrument(skip(self, docs_repo), fields(docs_repo = %docs_repo.display()))]
    pub fn publish_docs(&self, milestone: &str, docs_repo: &Path) -> Result<PathBuf> {
        let draft = self.read_draft(milestone)?;

        let dir = docs_repo.join("docs").join("release").join(milestone);
        std::fs::create_dir_all(&dir)?;
        debug!(dir = %dir.display(), "docs release directory ready");

        let page = dir.join("release_notes.md");
        std::fs::write(&page, self.render_docs_page(milestone, &draft))?;
        info!(page = %page.display(), "documentation updated");
        Ok(page)
    }
}
