//! Mirror publishing
//!
//! The update mirror serves the launcher, the manifest and the core
//! library. Releases and snapshots upload the same files; only the remote
//! manifest name differs.

use std::path::{Path, PathBuf};

use shipit_core::config::{ArtifactsConfig, MirrorConfig};
use shipit_core::{Config, CredentialStore, VersionDescriptor};
use tracing::{info, instrument};

use crate::error::Result;
use crate::login::{login_with_retry, Authenticator, CredentialKeys};

/// An open connection to the mirror
pub trait MirrorSession: Send {
    /// Change the remote working directory
    fn cwd(&mut self, dir: &str) -> Result<()>;

    /// Upload a local file under `remote_name` in the current directory
    fn put(&mut self, remote_name: &str, local_path: &Path) -> Result<()>;

    /// Close the connection
    fn quit(&mut self) -> Result<()>;
}

/// Which manifest slot to publish to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorChannel {
    Release,
    Snapshot,
}

/// Uploads build output to the update mirror
pub struct MirrorPublisher<'a, A: Authenticator + ?Sized> {
    authenticator: &'a A,
    config: MirrorConfig,
    artifacts: ArtifactsConfig,
    build_dir: PathBuf,
    manifest: PathBuf,
}

impl<'a, A> MirrorPublisher<'a, A>
where
    A: Authenticator + ?Sized,
    A::Session: MirrorSession,
{
    /// Create a publisher, resolving local paths against `root`
    pub fn new(authenticator: &'a A, config: &Config, root: &Path) -> Self {
        Self {
            authenticator,
            config: config.mirror.clone(),
            artifacts: config.artifacts.clone(),
            build_dir: root.join(&config.paths.build_dir),
            manifest: root.join(&config.paths.manifest),
        }
    }

    /// Publish the launcher, release manifest and core library
    pub async fn publish_release(
        &self,
        credentials: &mut CredentialStore,
        version: &VersionDescriptor,
    ) -> Result<()> {
        self.publish(credentials, version, MirrorChannel::Release)
            .await
    }

    /// Publish the launcher, snapshot manifest and core library
    pub async fn publish_snapshot(
        &self,
        credentials: &mut CredentialStore,
        version: &VersionDescriptor,
    ) -> Result<()> {
        self.publish(credentials, version, MirrorChannel::Snapshot)
            .await
    }

    #[instrument(skip(self, credentials, version), fields(version = %version.full()))]
    async fn publish(
        &self,
        credentials: &mut CredentialStore,
        version: &VersionDescriptor,
        channel: MirrorChannel,
    ) -> Result<()> {
        let mut session =
            login_with_retry(self.authenticator, credentials, CredentialKeys::FTP).await?;
        self.upload(&mut session, version, channel)
    }

    fn upload(
        &self,
        session: &mut A::Session,
        version: &VersionDescriptor,
        channel: MirrorChannel,
    ) -> Result<()> {
        let names = self.artifacts.for_version(version.full());
        let remote_manifest = match channel {
            MirrorChannel::Release => &self.config.release_manifest,
            MirrorChannel::Snapshot => &self.config.snapshot_manifest,
        };

        session.cwd(&self.config.remote_dir)?;
        session.put(&names.launcher, &self.build_dir.join(&names.launcher))?;
        session.put(remote_manifest, &self.manifest)?;
        session.cwd(&self.config.library_dir)?;
        session.put(&names.core_library, &self.build_dir.join(&names.core_library))?;
        session.quit()?;

        info!(
            host = %self.config.host,
            manifest = %remote_manifest,
            library = %names.core_library,
            "mirror updated"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use async_trait::async_trait;
    use shipit_core::prompt::ScriptedPrompter;
    use shipit_core::version::VersionName;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingSession {
        ops: Arc<Mutex<Vec<String>>>,
    }

    impl MirrorSession for RecordingSession {
        fn cwd(&mut self, dir: &str) -> Result<()> {
            self.ops.lock().unwrap().push(format!("cwd {}", dir));
            Ok(())
        }

        fn put(&mut self, remote_name: &str, local_path: &Path) -> Result<()> {
            self.ops
                .lock()
                .unwrap()
                .push(format!("put {} <- {}", remote_name, local_path.display()));
            Ok(())
        }

        fn quit(&mut self) -> Result<()> {
            self.ops.lock().unwrap().push("quit".to_string());
            Ok(())
        }
    }

    struct FakeMirror {
        session: RecordingSession,
        accept_after: usize,
        attempts: Mutex<usize>,
    }

    #[async_trait]
    impl Authenticator for FakeMirror {
        type Session = RecordingSession;

        fn service(&self) -> &str {
            "ftp"
        }

        async fn authenticate(&self, _user: &str, _password: &str) -> Result<RecordingSession> {
            let mut attempts = self.attempts.lock().unwrap();
            *attempts += 1;
            if *attempts <= self.accept_after {
                return Err(StoreError::InvalidCredentials("530 Login incorrect".into()));
            }
            Ok(self.session.clone())
        }
    }

    fn version() -> VersionDescriptor {
        VersionDescriptor::from_parts(VersionName::parse("1.4.0").unwrap(), "* a\n", "notes")
    }

    fn ops_for(channel: MirrorChannel) -> Vec<String> {
        let mirror = FakeMirror {
            session: RecordingSession::default(),
            accept_after: 0,
            attempts: Mutex::new(0),
        };
        let mut credentials =
            CredentialStore::in_memory(Arc::new(ScriptedPrompter::new(["u", "p"])));
        let publisher = MirrorPublisher::new(&mirror, &Config::default(), Path::new("/w"));
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        runtime
            .block_on(publisher.publish(&mut credentials, &version(), channel))
            .unwrap();
        let ops = mirror.session.ops.lock().unwrap().clone();
        ops
    }

    #[test]
    fn test_release_upload_order() {
        assert_eq!(
            ops_for(MirrorChannel::Release),
            vec![
                "cwd chunkyupdate",
                "put ChunkyLauncher.jar <- /w/build/ChunkyLauncher.jar",
                "put latest.json <- /w/latest.json",
                "cwd lib",
                "put chunky-core-1.4.0.jar <- /w/build/chunky-core-1.4.0.jar",
                "quit",
            ]
        );
    }

    #[test]
    fn test_snapshot_differs_only_in_manifest_name() {
        let release = ops_for(MirrorChannel::Release);
        let snapshot = ops_for(MirrorChannel::Snapshot);
        let differing: Vec<_> = release
            .iter()
            .zip(&snapshot)
            .filter(|(a, b)| a != b)
            .collect();
        assert_eq!(differing.len(), 1);
        assert_eq!(differing[0].1, "put snapshot.json <- /w/latest.json");
    }

    #[tokio::test]
    async fn test_rejected_login_reprompts() {
        let mirror = FakeMirror {
            session: RecordingSession::default(),
            accept_after: 1,
            attempts: Mutex::new(0),
        };
        let prompter = Arc::new(ScriptedPrompter::new(["u", "bad", "u", "good"]));
        let mut credentials = CredentialStore::in_memory(prompter.clone());
        let publisher = MirrorPublisher::new(&mirror, &Config::default(), Path::new("/w"));

        publisher
            .publish_release(&mut credentials, &version())
            .await
            .unwrap();
        assert_eq!(prompter.times_asked("ftp password: "), 2);
        assert_eq!(mirror.session.ops.lock().unwrap().len(), 6);
    }
}
