//! Release orchestration
//!
//! Runs the publish steps of a release or snapshot in a fixed order. Each
//! step asks its gate first, reports progress, and stops the run on the
//! first fatal error. Steps that depend on hosting URLs are only offered
//! when those URLs were produced earlier in the same run.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use shipit_core::config::BuildCommand;
use shipit_core::{
    patch_manifest, CommandRunner, CommandSpec, Config, CredentialStore, ErrorKind, Prompter,
    ReleaseDocuments, ReleaseLinks, VersionDescriptor,
};
use shipit_stores::{
    login_with_retry, AnnouncementPublisher, CredentialKeys, HostingEnvironment,
    HostingPublisher, MirrorPublisher, PostRef, PublishedRelease, StoreError,
};
use tracing::{info, instrument, warn};

use crate::backends::Backends;
use crate::error::{PipelineError, Result};
use crate::gate::StepGate;
use crate::reporter::{PipelineReporter, StepEvent};
use crate::step::{RunMode, Step};

/// Skip reason for steps that need this run's hosting URLs
const NO_HOSTING_URLS: &str = "no download URLs from publish-hosting in this run";

/// What happened during a run that did not abort
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Steps that finished, in order
    pub completed: Vec<Step>,
    /// Steps that were declined or not offered
    pub skipped: Vec<Step>,
    /// Steps that failed without ending the run
    pub failed: Vec<Step>,
    /// Hosting URLs, when publish-hosting ran
    pub published: Option<PublishedRelease>,
}

/// Drives one release or snapshot run
pub struct Pipeline<'a, B: Backends> {
    config: &'a Config,
    root: PathBuf,
    backends: &'a B,
    gate: &'a dyn StepGate,
    reporter: &'a dyn PipelineReporter,
    runner: &'a dyn CommandRunner,
    prompter: Arc<dyn Prompter>,
    documents: ReleaseDocuments,
}

impl<'a, B: Backends> Pipeline<'a, B> {
    /// Create a pipeline working in `root`
    pub fn new(
        config: &'a Config,
        root: &Path,
        backends: &'a B,
        gate: &'a dyn StepGate,
        reporter: &'a dyn PipelineReporter,
        runner: &'a dyn CommandRunner,
        prompter: Arc<dyn Prompter>,
    ) -> Self {
        Self {
            config,
            root: root.to_path_buf(),
            backends,
            gate,
            reporter,
            runner,
            prompter,
            documents: ReleaseDocuments::from_config(config, root),
        }
    }

    /// Run every step of `mode` for `version`
    #[instrument(skip_all, fields(mode = %mode, version = %version.full()))]
    pub async fn run(
        &self,
        mode: RunMode,
        version: &VersionDescriptor,
        credentials: &mut CredentialStore,
    ) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        match mode {
            RunMode::Release => self.run_release(version, credentials, &mut summary).await?,
            RunMode::Snapshot => self.run_snapshot(version, credentials, &mut summary).await?,
            RunMode::MirrorOnly => {
                let started = self.start(Step::PublishMirror);
                let result = self.publish_mirror(version, credentials, false).await;
                self.finish(Step::PublishMirror, started, result, &mut summary, |_| None)?;
            }
            RunMode::DocsOnly => {
                let started = self.start(Step::UpdateDocs);
                let result = self.update_docs(version);
                self.finish(Step::UpdateDocs, started, result, &mut summary, |page| {
                    Some(page.display().to_string())
                })?;
            }
        }
        info!(
            completed = summary.completed.len(),
            skipped = summary.skipped.len(),
            failed = summary.failed.len(),
            "run finished"
        );
        Ok(summary)
    }

    async fn run_release(
        &self,
        version: &VersionDescriptor,
        credentials: &mut CredentialStore,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let mode = RunMode::Release;

        if self.ask(Step::Build, mode, summary)? {
            let started = self.start(Step::Build);
            let result = self.build(&self.config.build.release, version);
            self.finish(Step::Build, started, result, summary, |_| None)?;
        }

        if self.ask(Step::PublishHosting, mode, summary)? {
            let started = self.start(Step::PublishHosting);
            let result = self.publish_hosting(version, credentials).await;
            let published =
                self.finish(Step::PublishHosting, started, result, summary, |published| {
                    Some(if published.is_new_release {
                        "new release created".to_string()
                    } else {
                        "files added to existing release".to_string()
                    })
                })?;
            summary.published = Some(published);
        }

        match summary.published.clone() {
            Some(published) => {
                if self.ask(Step::PatchManifest, mode, summary)? {
                    let started = self.start(Step::PatchManifest);
                    let result = self.patch(version, &published);
                    self.finish(Step::PatchManifest, started, result, summary, |_| None)?;
                }
                if self.ask(Step::WriteDraft, mode, summary)? {
                    let started = self.start(Step::WriteDraft);
                    let result = self.write_draft(version, &published);
                    self.finish(Step::WriteDraft, started, result, summary, |path| {
                        Some(path.display().to_string())
                    })?;
                }
            }
            None => {
                self.skip(Step::PatchManifest, NO_HOSTING_URLS, summary);
                self.skip(Step::WriteDraft, NO_HOSTING_URLS, summary);
            }
        }

        if self.ask(Step::PublishMirror, mode, summary)? {
            let started = self.start(Step::PublishMirror);
            let result = self.publish_mirror(version, credentials, false).await;
            self.finish(Step::PublishMirror, started, result, summary, |_| None)?;
        }

        if self.ask(Step::PostAnnouncement, mode, summary)? {
            let started = self.start(Step::PostAnnouncement);
            match self.post_release(version, credentials).await {
                Err(e) if is_local_failure(Step::PostAnnouncement, &e) => {
                    self.reporter.report(&StepEvent::Failed {
                        step: Step::PostAnnouncement,
                        kind: e.kind(),
                        error: e.to_string(),
                        fatal: false,
                    });
                    summary.failed.push(Step::PostAnnouncement);
                }
                result => {
                    self.finish(Step::PostAnnouncement, started, result, summary, describe_post)?;
                }
            }
        }

        if self.ask(Step::UpdateDocs, mode, summary)? {
            let started = self.start(Step::UpdateDocs);
            let result = self.update_docs(version);
            self.finish(Step::UpdateDocs, started, result, summary, |page| {
                Some(page.display().to_string())
            })?;
        }

        if self.ask(Step::Push, mode, summary)? {
            let started = self.start(Step::Push);
            let result = self.push(version);
            self.finish(Step::Push, started, result, summary, |_| None)?;
        }

        Ok(())
    }

    async fn run_snapshot(
        &self,
        version: &VersionDescriptor,
        credentials: &mut CredentialStore,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let mode = RunMode::Snapshot;

        if self.ask(Step::Tag, mode, summary)? {
            let started = self.start(Step::Tag);
            let result = self.tag(version);
            self.finish(Step::Tag, started, result, summary, |_| None)?;
        }

        if self.ask(Step::Build, mode, summary)? {
            let started = self.start(Step::Build);
            let result = self.build(&self.config.build.snapshot, version);
            self.finish(Step::Build, started, result, summary, |_| None)?;
        }

        if self.ask(Step::PublishMirror, mode, summary)? {
            let started = self.start(Step::PublishMirror);
            let result = self.publish_mirror(version, credentials, true).await;
            self.finish(Step::PublishMirror, started, result, summary, |_| None)?;
        }

        if self.ask(Step::PostAnnouncement, mode, summary)? {
            let started = self.start(Step::PostAnnouncement);
            let result = self.post_snapshot(version, credentials).await;
            self.finish(Step::PostAnnouncement, started, result, summary, describe_post)?;
        }

        Ok(())
    }

    // Step implementations

    fn build(&self, commands: &[BuildCommand], version: &VersionDescriptor) -> Result<()> {
        for command in commands {
            self.runner
                .run(&CommandSpec::from_build(command, version.full()))?;
        }
        Ok(())
    }

    fn tag(&self, version: &VersionDescriptor) -> Result<()> {
        let git = &self.config.git;
        self.runner.run(&CommandSpec::new("Git tag", &git.program).args([
            "tag",
            "-a",
            version.full(),
            "-m",
            git.snapshot_tag_message.as_str(),
        ]))?;
        Ok(())
    }

    async fn publish_hosting(
        &self,
        version: &VersionDescriptor,
        credentials: &mut CredentialStore,
    ) -> Result<PublishedRelease> {
        let environment = if self
            .gate
            .production_hosting()
            .map_err(PipelineError::Gate)?
        {
            HostingEnvironment::Production
        } else {
            HostingEnvironment::Staging
        };
        info!(%environment, "publishing to hosting platform");

        let login = self.backends.hosting(environment);
        let session = login_with_retry(&login, credentials, CredentialKeys::LAUNCHPAD).await?;
        let published = HostingPublisher::new(&session, self.config, &self.root)
            .publish(version)
            .await?;
        Ok(published)
    }

    fn patch(&self, version: &VersionDescriptor, published: &PublishedRelease) -> Result<()> {
        let artifacts = self.config.artifacts.for_version(version.full());
        patch_manifest(
            &self.root.join(&self.config.paths.manifest),
            &artifacts.core_library,
            &published.jar_url,
        )?;
        Ok(())
    }

    fn write_draft(
        &self,
        version: &VersionDescriptor,
        published: &PublishedRelease,
    ) -> Result<PathBuf> {
        let links = ReleaseLinks {
            exe_url: published.exe_url.clone(),
            zip_url: published.zip_url.clone(),
        };
        Ok(self.documents.write_release_notes(version, &links)?)
    }

    async fn publish_mirror(
        &self,
        version: &VersionDescriptor,
        credentials: &mut CredentialStore,
        snapshot: bool,
    ) -> Result<()> {
        let login = self.backends.mirror();
        let publisher = MirrorPublisher::new(&login, self.config, &self.root);
        if snapshot {
            publisher.publish_snapshot(credentials, version).await?;
        } else {
            publisher.publish_release(credentials, version).await?;
        }
        Ok(())
    }

    async fn post_release(
        &self,
        version: &VersionDescriptor,
        credentials: &mut CredentialStore,
    ) -> Result<PostRef> {
        let draft = self.documents.draft_path(version.milestone());
        if !draft.exists() {
            return Err(StoreError::DraftMissing(draft).into());
        }

        let login = self.backends.forum(credentials)?;
        let post = AnnouncementPublisher::new(&login, &self.documents, self.config)
            .post_release(credentials, version)
            .await?;
        Ok(post)
    }

    async fn post_snapshot(
        &self,
        version: &VersionDescriptor,
        credentials: &mut CredentialStore,
    ) -> Result<PostRef> {
        let login = self.backends.forum(credentials)?;
        let post = AnnouncementPublisher::new(&login, &self.documents, self.config)
            .post_snapshot(credentials, version)
            .await?;
        Ok(post)
    }

    fn update_docs(&self, version: &VersionDescriptor) -> Result<PathBuf> {
        let repo = self.docs_repo()?;
        Ok(self.documents.publish_docs(version.milestone(), &repo)?)
    }

    /// Configured docs checkout, or one named by the operator if that is missing
    fn docs_repo(&self) -> Result<PathBuf> {
        let configured = self.root.join(&self.config.paths.docs_repo);
        if configured.is_dir() {
            return Ok(configured);
        }
        warn!(path = %configured.display(), "documentation repository not found");

        loop {
            let answer = self
                .prompter
                .input("documentation repo: ")
                .map_err(PipelineError::Gate)?;
            let answer = answer.trim();
            // A blank answer would resolve to the working directory
            if answer.is_empty() {
                continue;
            }
            let repo = self.root.join(answer);
            if repo.is_dir() {
                return Ok(repo);
            }
            warn!(path = %repo.display(), "documentation repository not found");
        }
    }

    fn push(&self, version: &VersionDescriptor) -> Result<()> {
        let git = &self.config.git;
        self.runner.run(&CommandSpec::new("Git push", &git.program).args([
            "push",
            git.remote.as_str(),
            git.branch.as_str(),
        ]))?;
        self.runner.run(&CommandSpec::new("Git push tag", &git.program).args([
            "push",
            git.remote.as_str(),
            version.full(),
        ]))?;
        Ok(())
    }

    // Reporting

    fn ask(&self, step: Step, mode: RunMode, summary: &mut RunSummary) -> Result<bool> {
        let confirmed = self
            .gate
            .confirm(step, mode)
            .map_err(PipelineError::Gate)?;
        if !confirmed {
            self.skip(step, "declined", summary);
        }
        Ok(confirmed)
    }

    fn skip(&self, step: Step, reason: &str, summary: &mut RunSummary) {
        self.reporter.report(&StepEvent::Skipped {
            step,
            reason: reason.to_string(),
        });
        summary.skipped.push(step);
    }

    fn start(&self, step: Step) -> Instant {
        self.reporter.report(&StepEvent::Started { step });
        Instant::now()
    }

    fn finish<T>(
        &self,
        step: Step,
        started: Instant,
        result: Result<T>,
        summary: &mut RunSummary,
        describe: impl FnOnce(&T) -> Option<String>,
    ) -> Result<T> {
        match result {
            Ok(value) => {
                self.reporter.report(&StepEvent::Completed {
                    step,
                    duration: started.elapsed(),
                    detail: describe(&value),
                });
                summary.completed.push(step);
                Ok(value)
            }
            Err(e) => {
                self.reporter.report(&StepEvent::Failed {
                    step,
                    kind: e.kind(),
                    error: e.to_string(),
                    fatal: true,
                });
                Err(e)
            }
        }
    }
}

fn describe_post(post: &PostRef) -> Option<String> {
    Some(post.url.clone().unwrap_or_else(|| post.fullname.clone()))
}

/// Failures that end the step but not the run: only a missing announcement draft
fn is_local_failure(step: Step, error: &PipelineError) -> bool {
    step == Step::PostAnnouncement && error.kind() == ErrorKind::NotFound
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::{PresetGate, StepSelection};
    use crate::reporter::CollectingReporter;
    use async_trait::async_trait;
    use shipit_core::error::ProcessError;
    use shipit_core::prompt::ScriptedPrompter;
    use shipit_core::version::VersionName;
    use shipit_stores::{
        AnnouncementSession, ArtifactUpload, Authenticator, HostingPlatform, Milestone,
        MirrorSession, Release, Series,
    };
    use std::collections::HashSet;
    use std::sync::Mutex;
    use tempfile::TempDir;

    type Log = Arc<Mutex<Vec<String>>>;

    fn push(log: &Log, entry: String) {
        log.lock().unwrap().push(entry);
    }

    #[derive(Clone)]
    struct FakeHosting {
        log: Log,
        failing: HashSet<String>,
    }

    #[async_trait]
    impl HostingPlatform for FakeHosting {
        async fn releases(&self) -> shipit_stores::Result<Vec<Release>> {
            Ok(Vec::new())
        }

        async fn milestones(&self) -> shipit_stores::Result<Vec<Milestone>> {
            Ok(Vec::new())
        }

        async fn series(&self) -> shipit_stores::Result<Vec<Series>> {
            Ok(Vec::new())
        }

        async fn create_series(&self, name: &str, _: &str) -> shipit_stores::Result<Series> {
            push(&self.log, format!("lp create_series {}", name));
            Ok(Series {
                name: name.to_string(),
                self_link: name.to_string(),
            })
        }

        async fn create_milestone(
            &self,
            _: &Series,
            name: &str,
        ) -> shipit_stores::Result<Milestone> {
            push(&self.log, format!("lp create_milestone {}", name));
            Ok(Milestone {
                name: name.to_string(),
                self_link: name.to_string(),
                is_active: true,
            })
        }

        async fn create_release(
            &self,
            milestone: &Milestone,
            _: &str,
            _: &str,
            _: chrono::NaiveDate,
        ) -> shipit_stores::Result<Release> {
            push(&self.log, format!("lp create_release {}", milestone.name));
            Ok(Release {
                version: milestone.name.clone(),
                self_link: milestone.name.clone(),
            })
        }

        async fn deactivate_milestone(&self, _: &Milestone) -> shipit_stores::Result<()> {
            Ok(())
        }

        async fn upload_file(
            &self,
            _: &Release,
            upload: &ArtifactUpload,
        ) -> shipit_stores::Result<String> {
            if self.failing.contains(&upload.file_name) {
                return Err(StoreError::UploadFailed {
                    file: upload.file_name.clone(),
                    reason: "500".to_string(),
                });
            }
            Ok(format!("https://lp/{}", upload.file_name))
        }
    }

    struct FakeMirror {
        log: Log,
    }

    impl MirrorSession for FakeMirror {
        fn cwd(&mut self, dir: &str) -> shipit_stores::Result<()> {
            push(&self.log, format!("ftp cwd {}", dir));
            Ok(())
        }

        fn put(&mut self, remote_name: &str, _: &Path) -> shipit_stores::Result<()> {
            push(&self.log, format!("ftp put {}", remote_name));
            Ok(())
        }

        fn quit(&mut self) -> shipit_stores::Result<()> {
            Ok(())
        }
    }

    #[derive(Clone)]
    struct FakeForum {
        log: Log,
    }

    #[async_trait]
    impl AnnouncementSession for FakeForum {
        async fn submit(&self, forum: &str, title: &str, _: &str) -> shipit_stores::Result<PostRef> {
            push(&self.log, format!("post {}", title));
            Ok(PostRef {
                fullname: "t3_x".to_string(),
                forum: forum.to_string(),
                url: None,
            })
        }

        async fn set_flair(&self, _: &PostRef, _: &str, _: &str) -> shipit_stores::Result<()> {
            push(&self.log, "flair".to_string());
            Ok(())
        }

        async fn pin(&self, _: &PostRef) -> shipit_stores::Result<()> {
            push(&self.log, "pin".to_string());
            Ok(())
        }
    }

    /// Accepts any login and hands out a prepared session
    struct Login<S> {
        service: &'static str,
        make: Box<dyn Fn() -> S + Send + Sync>,
    }

    #[async_trait]
    impl<S: Send + 'static> Authenticator for Login<S> {
        type Session = S;

        fn service(&self) -> &str {
            self.service
        }

        async fn authenticate(&self, _: &str, _: &str) -> shipit_stores::Result<S> {
            Ok((self.make)())
        }
    }

    struct FakeBackends {
        log: Log,
        failing_uploads: HashSet<String>,
    }

    impl Backends for FakeBackends {
        type Hosting = FakeHosting;
        type HostingLogin = Login<FakeHosting>;
        type Mirror = FakeMirror;
        type MirrorLogin = Login<FakeMirror>;
        type Forum = FakeForum;
        type ForumLogin = Login<FakeForum>;

        fn hosting(&self, environment: HostingEnvironment) -> Login<FakeHosting> {
            push(&self.log, format!("lp login {}", environment));
            let session = FakeHosting {
                log: self.log.clone(),
                failing: self.failing_uploads.clone(),
            };
            Login {
                service: "lp",
                make: Box::new(move || session.clone()),
            }
        }

        fn mirror(&self) -> Login<FakeMirror> {
            let log = self.log.clone();
            Login {
                service: "ftp",
                make: Box::new(move || FakeMirror { log: log.clone() }),
            }
        }

        fn forum(
            &self,
            _credentials: &mut CredentialStore,
        ) -> shipit_stores::Result<Login<FakeForum>> {
            let log = self.log.clone();
            Ok(Login {
                service: "forum",
                make: Box::new(move || FakeForum { log: log.clone() }),
            })
        }
    }

    #[derive(Default)]
    struct RecordingRunner {
        commands: Mutex<Vec<String>>,
        fail_program: Option<String>,
    }

    impl CommandRunner for RecordingRunner {
        fn run(&self, spec: &CommandSpec) -> shipit_core::Result<()> {
            self.commands.lock().unwrap().push(spec.command_line());
            if self.fail_program.as_deref() == Some(spec.program.as_str()) {
                return Err(ProcessError::Failed {
                    label: spec.label.clone(),
                    command: spec.command_line(),
                    code: "1".to_string(),
                }
                .into());
            }
            Ok(())
        }
    }

    struct Fixture {
        temp: TempDir,
        config: Config,
        backends: FakeBackends,
        runner: RecordingRunner,
        reporter: CollectingReporter,
    }

    impl Fixture {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            std::fs::write(
                temp.path().join("latest.json"),
                r#"{"name":"1.4.0","libraries":[{"name":"chunky-core-1.4.0.jar","url":"old"}]}"#,
            )
            .unwrap();
            std::fs::create_dir(temp.path().join("docs-repo")).unwrap();

            let mut config = Config::default();
            config.paths.docs_repo = PathBuf::from("docs-repo");

            Self {
                temp,
                config,
                backends: FakeBackends {
                    log: Arc::new(Mutex::new(Vec::new())),
                    failing_uploads: HashSet::new(),
                },
                runner: RecordingRunner::default(),
                reporter: CollectingReporter::default(),
            }
        }

        fn root(&self) -> &Path {
            self.temp.path()
        }

        fn log(&self) -> Vec<String> {
            self.backends.log.lock().unwrap().clone()
        }

        fn commands(&self) -> Vec<String> {
            self.runner.commands.lock().unwrap().clone()
        }

        async fn run(
            &self,
            mode: RunMode,
            gate: &dyn StepGate,
            prompter: Arc<ScriptedPrompter>,
        ) -> Result<RunSummary> {
            let version = VersionDescriptor::from_parts(
                VersionName::parse("1.4.0").unwrap(),
                "Fixed bug X\n",
                "Notes",
            );
            let mut credentials = CredentialStore::in_memory(prompter.clone());
            let pipeline = Pipeline::new(
                &self.config,
                self.root(),
                &self.backends,
                gate,
                &self.reporter,
                &self.runner,
                prompter,
            );
            pipeline.run(mode, &version, &mut credentials).await
        }
    }

    fn login_answers() -> Arc<ScriptedPrompter> {
        Arc::new(ScriptedPrompter::new([
            "lp-token", "lp-secret", "ftp-user", "ftp-pass", "bot", "bot-pass",
        ]))
    }

    #[tokio::test]
    async fn test_full_release() {
        let fx = Fixture::new();
        let summary = fx
            .run(RunMode::Release, &PresetGate::all(false), login_answers())
            .await
            .unwrap();

        assert_eq!(summary.completed, RunMode::Release.steps().to_vec());
        assert!(summary.published.as_ref().unwrap().is_new_release);

        assert_eq!(
            fx.commands(),
            vec![
                "ant -Dversion=1.4.0 release",
                "makensis Chunky.nsi",
                "git push origin master",
                "git push origin 1.4.0",
            ]
        );

        let manifest = std::fs::read_to_string(fx.root().join("latest.json")).unwrap();
        assert!(manifest.contains("https://lp/chunky-core-1.4.0.jar"));

        let draft =
            std::fs::read_to_string(fx.root().join("build/release_notes-1.4.0.md")).unwrap();
        assert!(draft.contains("[Windows installer](https://lp/Chunky-1.4.0.exe)"));
        let page = std::fs::read_to_string(
            fx.root().join("docs-repo/docs/release/1.4.0/release_notes.md"),
        )
        .unwrap();
        assert!(page.starts_with("Chunky 1.4.0\n"));

        let log = fx.log();
        assert_eq!(log[0], "lp login staging");
        assert!(log.contains(&"ftp put latest.json".to_string()));
        assert!(log.contains(&"post Chunky 1.4.0 released!".to_string()));
        assert!(log.contains(&"pin".to_string()));
    }

    #[tokio::test]
    async fn test_url_dependent_steps_skipped_without_hosting() {
        let fx = Fixture::new();
        let gate = PresetGate::new(
            StepSelection::Only([Step::PostAnnouncement, Step::Push].into_iter().collect()),
            false,
        );

        let summary = fx
            .run(RunMode::Release, &gate, login_answers())
            .await
            .unwrap();

        assert_eq!(
            fx.reporter.skip_reason(Step::PatchManifest).as_deref(),
            Some(NO_HOSTING_URLS)
        );
        assert_eq!(
            fx.reporter.skip_reason(Step::WriteDraft).as_deref(),
            Some(NO_HOSTING_URLS)
        );
        // Missing draft is reported but does not stop the push
        assert_eq!(summary.failed, vec![Step::PostAnnouncement]);
        assert_eq!(summary.completed, vec![Step::Push]);
        assert!(!fx.log().iter().any(|l| l.starts_with("post")));
    }

    #[tokio::test]
    async fn test_build_failure_aborts() {
        let mut fx = Fixture::new();
        fx.runner.fail_program = Some("makensis".to_string());

        let err = fx
            .run(RunMode::Release, &PresetGate::all(false), login_answers())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Process);
        assert_eq!(fx.commands().len(), 2);
        assert!(fx.log().is_empty());
        assert!(fx.reporter.events().iter().any(|e| matches!(
            e,
            StepEvent::Failed {
                step: Step::Build,
                fatal: true,
                ..
            }
        )));
    }

    #[tokio::test]
    async fn test_missing_upload_is_fatal() {
        let mut fx = Fixture::new();
        fx.backends.failing_uploads.insert("Chunky-1.4.0.zip".to_string());
        let gate = PresetGate::new(
            StepSelection::Only(
                [Step::PublishHosting, Step::PatchManifest]
                    .into_iter()
                    .collect(),
            ),
            true,
        );

        let err = fx
            .run(RunMode::Release, &gate, login_answers())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Upload);
        assert_eq!(fx.log()[0], "lp login production");
        let manifest = std::fs::read_to_string(fx.root().join("latest.json")).unwrap();
        assert!(manifest.contains("\"old\""));
    }

    #[tokio::test]
    async fn test_docs_without_draft_is_fatal() {
        let fx = Fixture::new();
        let gate = PresetGate::new(
            StepSelection::Only([Step::UpdateDocs, Step::Push].into_iter().collect()),
            false,
        );

        let err = fx
            .run(RunMode::Release, &gate, login_answers())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(fx.commands().is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_run() {
        let fx = Fixture::new();
        let summary = fx
            .run(RunMode::Snapshot, &PresetGate::all(false), login_answers())
            .await
            .unwrap();

        assert_eq!(summary.completed, RunMode::Snapshot.steps().to_vec());
        assert_eq!(
            fx.commands(),
            vec![
                "git tag -a 1.4.0 -m Snapshot build",
                "ant -Ddebug=true dist",
            ]
        );
        let log = fx.log();
        assert!(log.contains(&"ftp put snapshot.json".to_string()));
        assert!(log.contains(&"post Chunky Snapshot 1.4.0".to_string()));
        assert!(!log.contains(&"pin".to_string()));
    }

    #[tokio::test]
    async fn test_mirror_only_ignores_gate() {
        let fx = Fixture::new();
        let gate = PresetGate::new(StepSelection::Only(Default::default()), false);
        let summary = fx
            .run(RunMode::MirrorOnly, &gate, login_answers())
            .await
            .unwrap();

        assert_eq!(summary.completed, vec![Step::PublishMirror]);
        assert!(fx.log().contains(&"ftp put latest.json".to_string()));
    }

    #[tokio::test]
    async fn test_docs_only_asks_for_missing_repo() {
        let mut fx = Fixture::new();
        fx.config.paths.docs_repo = PathBuf::from("nowhere");
        let draft_dir = fx.root().join("build");
        std::fs::create_dir_all(&draft_dir).unwrap();
        std::fs::write(draft_dir.join("release_notes-1.4.0.md"), "draft").unwrap();

        let prompter = Arc::new(ScriptedPrompter::new(["still-nowhere", "docs-repo"]));
        let summary = fx
            .run(RunMode::DocsOnly, &PresetGate::all(false), prompter.clone())
            .await
            .unwrap();

        assert_eq!(summary.completed, vec![Step::UpdateDocs]);
        assert_eq!(prompter.times_asked("documentation repo: "), 2);
        let page = std::fs::read_to_string(
            fx.root().join("docs-repo/docs/release/1.4.0/release_notes.md"),
        )
        .unwrap();
        assert_eq!(page, "Chunky 1.4.0\n============\n\ndraft");
    }

    #[tokio::test]
    async fn test_blank_docs_repo_answer_asks_again() {
        let mut fx = Fixture::new();
        fx.config.paths.docs_repo = PathBuf::from("nowhere");
        let draft_dir = fx.root().join("build");
        std::fs::create_dir_all(&draft_dir).unwrap();
        std::fs::write(draft_dir.join("release_notes-1.4.0.md"), "draft").unwrap();

        let prompter = Arc::new(ScriptedPrompter::new(["  ", "", "docs-repo"]));
        fx.run(RunMode::DocsOnly, &PresetGate::all(false), prompter.clone())
            .await
            .unwrap();

        assert_eq!(prompter.times_asked("documentation repo: "), 3);
        assert!(!fx.root().join("docs").exists());
        assert!(fx
            .root()
            .join("docs-repo/docs/release/1.4.0/release_notes.md")
            .is_file());
    }
}
