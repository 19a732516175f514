//! Pipeline steps and run modes

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::PipelineError;

/// What kind of run this is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunMode {
    /// Full release, every step gated
    Release,
    /// Snapshot build and publish, every step gated
    Snapshot,
    /// Only the release mirror upload, ungated
    MirrorOnly,
    /// Only the documentation update, ungated
    DocsOnly,
}

impl RunMode {
    /// Steps in the order they run
    pub fn steps(&self) -> &'static [Step] {
        match self {
            Self::Release => &[
                Step::Build,
                Step::PublishHosting,
                Step::PatchManifest,
                Step::WriteDraft,
                Step::PublishMirror,
                Step::PostAnnouncement,
                Step::UpdateDocs,
                Step::Push,
            ],
            Self::Snapshot => &[
                Step::Tag,
                Step::Build,
                Step::PublishMirror,
                Step::PostAnnouncement,
            ],
            Self::MirrorOnly => &[Step::PublishMirror],
            Self::DocsOnly => &[Step::UpdateDocs],
        }
    }

    /// Whether steps in this mode ask before running
    pub fn is_gated(&self) -> bool {
        matches!(self, Self::Release | Self::Snapshot)
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Release => write!(f, "release"),
            Self::Snapshot => write!(f, "snapshot"),
            Self::MirrorOnly => write!(f, "mirror"),
            Self::DocsOnly => write!(f, "docs"),
        }
    }
}

/// One publish action
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Step {
    /// Create the snapshot tag
    Tag,
    /// Run the build commands
    Build,
    /// Upload artifacts to the hosting platform
    PublishHosting,
    /// Point the update manifest at the new core library
    PatchManifest,
    /// Write the announcement draft and properties file
    WriteDraft,
    /// Upload launcher, manifest and core library to the mirror
    PublishMirror,
    /// Post the announcement thread
    PostAnnouncement,
    /// Copy the draft into the documentation repository
    UpdateDocs,
    /// Push the release commit and tag
    Push,
}

impl Step {
    /// Every step, in declaration order
    pub const ALL: [Step; 9] = [
        Step::Tag,
        Step::Build,
        Step::PublishHosting,
        Step::PatchManifest,
        Step::WriteDraft,
        Step::PublishMirror,
        Step::PostAnnouncement,
        Step::UpdateDocs,
        Step::Push,
    ];

    /// Name used on the command line and in logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::Tag => "tag",
            Self::Build => "build",
            Self::PublishHosting => "publish-hosting",
            Self::PatchManifest => "patch-manifest",
            Self::WriteDraft => "write-draft",
            Self::PublishMirror => "publish-mirror",
            Self::PostAnnouncement => "post-announcement",
            Self::UpdateDocs => "update-docs",
            Self::Push => "push",
        }
    }

    /// Question asked before running this step
    pub fn question(&self, mode: RunMode) -> &'static str {
        let snapshot = mode == RunMode::Snapshot;
        match self {
            Self::Tag => "Tag snapshot?",
            Self::Build if snapshot => "Build snapshot?",
            Self::Build => "Build release?",
            Self::PublishHosting => "Publish to Launchpad?",
            Self::PatchManifest => "Patch update manifest?",
            Self::WriteDraft => "Write release notes draft?",
            Self::PublishMirror if snapshot => "Publish snapshot to FTP?",
            Self::PublishMirror => "Publish to FTP?",
            Self::PostAnnouncement if snapshot => "Post snapshot thread?",
            Self::PostAnnouncement => "Post release thread?",
            Self::UpdateDocs => "Update documentation?",
            Self::Push => "Push git release commit?",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Step {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Step::ALL
            .iter()
            .copied()
            .find(|step| step.name() == s)
            .ok_or_else(|| {
                let known: Vec<_> = Step::ALL.iter().map(Step::name).collect();
                PipelineError::UnknownStep(s.to_string(), known.join(", "))
            })
    }
}

/// Parse a comma-separated step list such as `build,publish-mirror`
pub fn parse_step_list(list: &str) -> Result<BTreeSet<Step>, PipelineError> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(Step::from_str)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_order() {
        let names: Vec<_> = RunMode::Release.steps().iter().map(Step::name).collect();
        assert_eq!(
            names,
            vec![
                "build",
                "publish-hosting",
                "patch-manifest",
                "write-draft",
                "publish-mirror",
                "post-announcement",
                "update-docs",
                "push"
            ]
        );
    }

    #[test]
    fn test_questions_depend_on_mode() {
        assert_eq!(Step::Build.question(RunMode::Release), "Build release?");
        assert_eq!(Step::Build.question(RunMode::Snapshot), "Build snapshot?");
        assert_eq!(
            Step::PublishMirror.question(RunMode::Snapshot),
            "Publish snapshot to FTP?"
        );
    }

    #[test]
    fn test_parse_step_list() {
        let steps = parse_step_list("build, publish-mirror,,push").unwrap();
        assert_eq!(
            steps.into_iter().collect::<Vec<_>>(),
            vec![Step::Build, Step::PublishMirror, Step::Push]
        );
    }

    #[test]
    fn test_unknown_step() {
        let err = parse_step_list("build,deploy").unwrap_err();
        assert!(err.to_string().contains("Unknown step 'deploy'"));
        assert_eq!(err.kind(), shipit_core::ErrorKind::Validation);
    }

    #[test]
    fn test_only_release_and_snapshot_are_gated() {
        assert!(RunMode::Release.is_gated());
        assert!(RunMode::Snapshot.is_gated());
        assert!(!RunMode::MirrorOnly.is_gated());
        assert!(!RunMode::DocsOnly.is_gated());
    }
}
