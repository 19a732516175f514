//! Hosting-platform publishing
//!
//! Finds or creates the release record for a milestone and attaches the
//! build artifacts to it. Lookups always happen before creation at every
//! level, so re-running against an existing release only uploads.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use shipit_core::config::ArtifactsConfig;
use shipit_core::{Config, VersionDescriptor};
use tracing::{error, info, instrument, warn};

use crate::error::{Result, StoreError};
use crate::types::*;

/// Operations on a project hosted on the platform
#[async_trait]
pub trait HostingPlatform: Send + Sync {
    /// All releases of the project
    async fn releases(&self) -> Result<Vec<Release>>;

    /// All milestones of the project, active or not
    async fn milestones(&self) -> Result<Vec<Milestone>>;

    /// All series of the project
    async fn series(&self) -> Result<Vec<Series>>;

    /// Create a series
    async fn create_series(&self, name: &str, summary: &str) -> Result<Series>;

    /// Create a milestone in a series
    async fn create_milestone(&self, series: &Series, name: &str) -> Result<Milestone>;

    /// Create the release record for a milestone
    async fn create_release(
        &self,
        milestone: &Milestone,
        release_notes: &str,
        changelog: &str,
        date_released: NaiveDate,
    ) -> Result<Release>;

    /// Mark a milestone inactive
    async fn deactivate_milestone(&self, milestone: &Milestone) -> Result<()>;

    /// Attach a file to a release, returning its public download URL
    async fn upload_file(&self, release: &Release, upload: &ArtifactUpload) -> Result<String>;
}

/// Outcome of looking up a record by name
#[derive(Debug, PartialEq, Eq)]
pub enum Lookup<'a, T> {
    /// An existing record with that name
    Found(&'a T),
    /// No record; one with this name has to be created
    ToCreate(String),
}

/// Decide whether a record named `name` exists or has to be created
pub fn find_or_plan_create<'a, T: Named>(existing: &'a [T], name: &str) -> Lookup<'a, T> {
    existing
        .iter()
        .find(|record| record.name() == name)
        .map(Lookup::Found)
        .unwrap_or_else(|| Lookup::ToCreate(name.to_string()))
}

/// The four files attached to every release, in upload order
pub fn release_uploads(
    artifacts: &ArtifactsConfig,
    version: &str,
    build_dir: &Path,
) -> [ArtifactUpload; 4] {
    let names = artifacts.for_version(version);
    let upload = |file_name: String, description: &str, content_type: &str, file_type| {
        ArtifactUpload {
            local_path: build_dir.join(&file_name),
            file_name,
            description: description.to_string(),
            content_type: content_type.to_string(),
            file_type,
        }
    };

    [
        upload(
            names.core_library,
            "Core Library",
            "application/java-archive",
            ReleaseFileType::Installer,
        ),
        upload(
            names.source_tarball,
            "Source Code",
            "application/x-tar",
            ReleaseFileType::CodeTarball,
        ),
        upload(
            names.archive,
            "Binaries",
            "application/zip",
            ReleaseFileType::Installer,
        ),
        upload(
            names.installer,
            "Windows Installer",
            "application/octet-stream",
            ReleaseFileType::Installer,
        ),
    ]
}

/// Publishes a version to a hosting platform session
pub struct HostingPublisher<'a, P: HostingPlatform + ?Sized> {
    platform: &'a P,
    artifacts: ArtifactsConfig,
    build_dir: PathBuf,
    series_summary: String,
}

impl<'a, P: HostingPlatform + ?Sized> HostingPublisher<'a, P> {
    /// Create a publisher for an authenticated platform session
    pub fn new(platform: &'a P, config: &Config, root: &Path) -> Self {
        Self {
            platform,
            artifacts: config.artifacts.clone(),
            build_dir: root.join(&config.paths.build_dir),
            series_summary: config.launchpad.series_summary.clone(),
        }
    }

    /// Find or create the release and upload every artifact.
    ///
    /// All uploads are attempted even after one fails; if any file ended up
    /// without a URL the result is [`StoreError::MissingArtifacts`].
    #[instrument(skip(self, version), fields(milestone = %version.milestone()))]
    pub async fn publish(&self, version: &VersionDescriptor) -> Result<PublishedRelease> {
        let (release, is_new_release) = self.ensure_release(version).await?;

        let uploads = release_uploads(&self.artifacts, version.full(), &self.build_dir);
        let mut urls: Vec<Option<String>> = Vec::with_capacity(uploads.len());
        for upload in &uploads {
            info!(file = %upload.file_name, "uploading");
            match self.platform.upload_file(&release, upload).await {
                Ok(url) => {
                    info!(file = %upload.file_name, url = %url, "uploaded");
                    urls.push(Some(url));
                }
                Err(e) => {
                    error!(file = %upload.file_name, error = %e, "file upload error");
                    urls.push(None);
                }
            }
        }

        let missing: Vec<String> = uploads
            .iter()
            .zip(&urls)
            .filter(|(_, url)| url.is_none())
            .map(|(upload, _)| upload.file_name.clone())
            .collect();
        if !missing.is_empty() {
            return Err(StoreError::MissingArtifacts { missing });
        }

        let mut urls = urls.into_iter().flatten();
        let mut next = || {
            urls.next()
                .ok_or_else(|| StoreError::Other("download URL list exhausted".to_string()))
        };
        Ok(PublishedRelease {
            is_new_release,
            jar_url: next()?,
            tarball_url: next()?,
            zip_url: next()?,
            exe_url: next()?,
        })
    }

    async fn ensure_release(&self, version: &VersionDescriptor) -> Result<(Release, bool)> {
        let releases = self.platform.releases().await?;
        if let Lookup::Found(release) = find_or_plan_create(&releases, version.milestone()) {
            info!(
                milestone = version.milestone(),
                "previous release found, uploading additional files"
            );
            return Ok((release.clone(), false));
        }

        let milestones = self.platform.milestones().await?;
        let milestone = match find_or_plan_create(&milestones, version.milestone()) {
            Lookup::Found(milestone) => milestone.clone(),
            Lookup::ToCreate(name) => {
                let series = self.ensure_series(version.series()).await?;
                let milestone = self.platform.create_milestone(&series, &name).await?;
                info!(milestone = %name, "milestone created");
                milestone
            }
        };

        let release = self
            .platform
            .create_release(
                &milestone,
                version.release_notes(),
                version.changelog(),
                Local::now().date_naive(),
            )
            .await?;
        self.platform.deactivate_milestone(&milestone).await?;
        info!(milestone = version.milestone(), "release created");
        Ok((release, true))
    }

    async fn ensure_series(&self, name: &str) -> Result<Series> {
        let all = self.platform.series().await?;
        match find_or_plan_create(&all, name) {
            Lookup::Found(series) => Ok(series.clone()),
            Lookup::ToCreate(name) => {
                let series = self
                    .platform
                    .create_series(&name, &self.series_summary)
                    .await?;
                warn!(
                    series = %name,
                    link = %series.self_link,
                    "series created, please update the series summary manually"
                );
                Ok(series)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shipit_core::version::VersionName;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// In-memory hosting platform that records every mutating call
    #[derive(Default)]
    pub(crate) struct FakePlatform {
        pub releases: Mutex<Vec<Release>>,
        pub milestones: Mutex<Vec<Milestone>>,
        pub series: Mutex<Vec<Series>>,
        pub calls: Mutex<Vec<String>>,
        pub failing_uploads: HashSet<String>,
    }

    impl FakePlatform {
        pub(crate) fn with_release(version: &str) -> Self {
            let platform = Self::default();
            platform.releases.lock().unwrap().push(Release {
                version: version.to_string(),
                self_link: format!("lp/+release/{}", version),
            });
            platform
        }

        pub(crate) fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl HostingPlatform for FakePlatform {
        async fn releases(&self) -> Result<Vec<Release>> {
            Ok(self.releases.lock().unwrap().clone())
        }

        async fn milestones(&self) -> Result<Vec<Milestone>> {
            Ok(self.milestones.lock().unwrap().clone())
        }

        async fn series(&self) -> Result<Vec<Series>> {
            Ok(self.series.lock().unwrap().clone())
        }

        async fn create_series(&self, name: &str, _summary: &str) -> Result<Series> {
            self.record(format!("create_series {}", name));
            let series = Series {
                name: name.to_string(),
                self_link: format!("lp/{}", name),
            };
            self.series.lock().unwrap().push(series.clone());
            Ok(series)
        }

        async fn create_milestone(&self, series: &Series, name: &str) -> Result<Milestone> {
            self.record(format!("create_milestone {} {}", series.name, name));
            let milestone = Milestone {
                name: name.to_string(),
                self_link: format!("lp/+milestone/{}", name),
                is_active: true,
            };
            self.milestones.lock().unwrap().push(milestone.clone());
            Ok(milestone)
        }

        async fn create_release(
            &self,
            milestone: &Milestone,
            _release_notes: &str,
            _changelog: &str,
            _date_released: NaiveDate,
        ) -> Result<Release> {
            self.record(format!("create_release {}", milestone.name));
            let release = Release {
                version: milestone.name.clone(),
                self_link: format!("lp/+release/{}", milestone.name),
            };
            self.releases.lock().unwrap().push(release.clone());
            Ok(release)
        }

        async fn deactivate_milestone(&self, milestone: &Milestone) -> Result<()> {
            self.record(format!("deactivate {}", milestone.name));
            Ok(())
        }

        async fn upload_file(&self, release: &Release, upload: &ArtifactUpload) -> Result<String> {
            self.record(format!("upload {}", upload.file_name));
            if self.failing_uploads.contains(&upload.file_name) {
                return Err(StoreError::UploadFailed {
                    file: upload.file_name.clone(),
                    reason: "HTTP 500".to_string(),
                });
            }
            Ok(format!("https://dl/{}/{}", release.version, upload.file_name))
        }
    }

    fn version(input: &str) -> VersionDescriptor {
        VersionDescriptor::from_parts(VersionName::parse(input).unwrap(), "* entry\n", "notes")
    }

    fn publisher(platform: &FakePlatform) -> HostingPublisher<'_, FakePlatform> {
        HostingPublisher::new(platform, &Config::default(), Path::new("/work"))
    }

    #[test]
    fn test_find_or_plan_create() {
        let series = vec![
            Series {
                name: "1.3".to_string(),
                self_link: "a".to_string(),
            },
            Series {
                name: "1.4".to_string(),
                self_link: "b".to_string(),
            },
        ];
        assert_eq!(find_or_plan_create(&series, "1.4"), Lookup::Found(&series[1]));
        assert_eq!(
            find_or_plan_create(&series, "1.4.0"),
            Lookup::ToCreate("1.4.0".to_string())
        );
        assert_eq!(
            find_or_plan_create::<Series>(&[], "1.4"),
            Lookup::ToCreate("1.4".to_string())
        );
    }

    #[test]
    fn test_release_uploads_order_and_types() {
        let uploads = release_uploads(&ArtifactsConfig::default(), "1.2.3", Path::new("build"));
        let names: Vec<_> = uploads.iter().map(|u| u.file_name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "chunky-core-1.2.3.jar",
                "chunky-1.2.3.tar.gz",
                "Chunky-1.2.3.zip",
                "Chunky-1.2.3.exe"
            ]
        );
        assert_eq!(uploads[0].content_type, "application/java-archive");
        assert_eq!(uploads[1].file_type, ReleaseFileType::CodeTarball);
        assert_eq!(uploads[3].content_type, "application/octet-stream");
        assert_eq!(uploads[2].local_path, Path::new("build/Chunky-1.2.3.zip"));
    }

    #[tokio::test]
    async fn test_existing_release_only_uploads() {
        let platform = FakePlatform::with_release("1.2.3");
        let published = publisher(&platform).publish(&version("1.2.3")).await.unwrap();

        assert!(!published.is_new_release);
        assert!(platform.calls().iter().all(|c| c.starts_with("upload ")));
        assert_eq!(platform.calls().len(), 4);
        assert_eq!(published.jar_url, "https://dl/1.2.3/chunky-core-1.2.3.jar");
        assert_eq!(published.exe_url, "https://dl/1.2.3/Chunky-1.2.3.exe");
    }

    #[tokio::test]
    async fn test_creates_series_milestone_and_release() {
        let platform = FakePlatform::default();
        let published = publisher(&platform)
            .publish(&version("1.4.0-beta1"))
            .await
            .unwrap();

        assert!(published.is_new_release);
        assert_eq!(
            &platform.calls()[..4],
            &[
                "create_series 1.4",
                "create_milestone 1.4 1.4.0",
                "create_release 1.4.0",
                "deactivate 1.4.0",
            ]
        );
        assert_eq!(published.zip_url, "https://dl/1.4.0/Chunky-1.4.0-beta1.zip");
    }

    #[tokio::test]
    async fn test_existing_milestone_is_reused() {
        let platform = FakePlatform::default();
        platform.milestones.lock().unwrap().push(Milestone {
            name: "1.4.0".to_string(),
            self_link: "lp/+milestone/1.4.0".to_string(),
            is_active: true,
        });

        publisher(&platform).publish(&version("1.4.0")).await.unwrap();
        let calls = platform.calls();
        assert!(!calls.iter().any(|c| c.starts_with("create_series")));
        assert!(!calls.iter().any(|c| c.starts_with("create_milestone")));
        assert!(calls.contains(&"create_release 1.4.0".to_string()));
    }

    #[tokio::test]
    async fn test_second_run_creates_nothing() {
        let platform = FakePlatform::default();
        publisher(&platform).publish(&version("1.4.0")).await.unwrap();
        platform.calls.lock().unwrap().clear();

        let again = publisher(&platform).publish(&version("1.4.0")).await.unwrap();
        assert!(!again.is_new_release);
        assert!(platform.calls().iter().all(|c| c.starts_with("upload ")));
    }

    #[tokio::test]
    async fn test_failed_uploads_reported_together() {
        let mut platform = FakePlatform::with_release("1.2.3");
        platform.failing_uploads = ["chunky-1.2.3.tar.gz", "Chunky-1.2.3.exe"]
            .into_iter()
            .map(String::from)
            .collect();

        let err = publisher(&platform)
            .publish(&version("1.2.3"))
            .await
            .unwrap_err();

        // Every upload was still attempted
        assert_eq!(platform.calls().len(), 4);
        match err {
            StoreError::MissingArtifacts { missing } => {
                assert_eq!(missing, vec!["chunky-1.2.3.tar.gz", "Chunky-1.2.3.exe"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
