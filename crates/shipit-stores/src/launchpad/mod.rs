//! Launchpad integration
//!
//! Talks to the Launchpad web service (the lazr.restful `devel` API).
//!
//! ## Authentication
//!
//! Requests are signed with an OAuth 1.0 access token using the PLAINTEXT
//! method. The token and its secret live in the credential store as
//! `launchpad token` / `launchpad token secret`.
//!
//! ## Usage
//!
//! ```ignore
//! use shipit_stores::launchpad::LaunchpadConnector;
//! use shipit_stores::{login_with_retry, CredentialKeys, HostingEnvironment};
//!
//! let connector = LaunchpadConnector::new(&config.launchpad, HostingEnvironment::Staging);
//! let client = login_with_retry(&connector, &mut credentials, CredentialKeys::LAUNCHPAD).await?;
//! let releases = client.releases().await?;
//! ```

mod oauth;

pub use oauth::OAuthCredentials;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::header::{ACCEPT, AUTHORIZATION, LOCATION};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use shipit_core::config::LaunchpadConfig;
use shipit_core::version::VersionName;
use tracing::{debug, info, instrument};

use crate::error::{Result, StoreError};
use crate::hosting::HostingPlatform;
use crate::login::Authenticator;
use crate::types::*;

/// One page of a lazr collection
#[derive(Debug, Deserialize)]
struct Collection<T> {
    entries: Vec<T>,
    next_collection_link: Option<String>,
}

/// Logs in to Launchpad and hands out [`LaunchpadClient`] sessions
#[derive(Debug, Clone)]
pub struct LaunchpadConnector {
    client: Client,
    config: LaunchpadConfig,
    environment: HostingEnvironment,
}

impl LaunchpadConnector {
    /// Create a connector for one environment
    pub fn new(config: &LaunchpadConfig, environment: HostingEnvironment) -> Self {
        Self {
            client: Client::new(),
            config: config.clone(),
            environment,
        }
    }
}

#[async_trait]
impl Authenticator for LaunchpadConnector {
    type Session = LaunchpadClient;

    fn service(&self) -> &str {
        "launchpad"
    }

    #[instrument(skip(self, token, token_secret), fields(environment = %self.environment))]
    async fn authenticate(&self, token: &str, token_secret: &str) -> Result<LaunchpadClient> {
        let session = LaunchpadClient {
            client: self.client.clone(),
            api_root: self
                .environment
                .api_root(&self.config)
                .trim_end_matches('/')
                .to_string(),
            web_root: self
                .environment
                .web_root(&self.config)
                .trim_end_matches('/')
                .to_string(),
            project: self.config.project.clone(),
            credentials: OAuthCredentials {
                consumer_key: self.config.consumer_key.clone(),
                token: token.to_string(),
                token_secret: token_secret.to_string(),
            },
        };

        let url = format!("{}/people/+me", session.api_root);
        let response = session.authorized(session.client.get(&url)).send().await?;
        match response.status() {
            StatusCode::UNAUTHORIZED => Err(StoreError::InvalidCredentials(
                "Launchpad rejected the access token".to_string(),
            )),
            status if status.is_success() => {
                info!(project = %session.project, "Launchpad session ready");
                Ok(session)
            }
            status => Err(StoreError::ApiError {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            }),
        }
    }
}

/// Authenticated Launchpad session for one project
#[derive(Debug, Clone)]
pub struct LaunchpadClient {
    client: Client,
    api_root: String,
    web_root: String,
    project: String,
    credentials: OAuthCredentials,
}

impl LaunchpadClient {
    /// Public download link of a file attached to a release
    pub fn download_url(&self, series: &str, milestone: &str, file_name: &str) -> String {
        format!(
            "{}/{}/{}/{}/+download/{}",
            self.web_root, self.project, series, milestone, file_name
        )
    }

    fn project_url(&self) -> String {
        format!("{}/{}", self.api_root, self.project)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(AUTHORIZATION, self.credentials.authorization())
            .header(ACCEPT, "application/json")
    }

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(StoreError::AuthenticationFailed(
                response.text().await.unwrap_or_default(),
            ));
        }
        if !status.is_success() {
            return Err(StoreError::ApiError {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!("GET {}", url);
        let response = self.authorized(self.client.get(url)).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// Fetch every entry of a collection, following page links
    async fn collection<T: DeserializeOwned>(&self, url: String) -> Result<Vec<T>> {
        let mut entries = Vec::new();
        let mut next = Some(url);
        while let Some(url) = next {
            let page: Collection<T> = self.get_json(&url).await?;
            entries.extend(page.entries);
            next = page.next_collection_link;
        }
        Ok(entries)
    }

    /// Invoke a named factory operation and fetch the created entry
    async fn create<T: DeserializeOwned>(&self, target: &str, form: &[(&str, &str)]) -> Result<T> {
        debug!("POST {} ws.op={:?}", target, form.first().map(|(_, v)| v));
        let response = self
            .authorized(self.client.post(target))
            .form(form)
            .send()
            .await?;
        let response = Self::check(response).await?;

        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                StoreError::Other(format!("{} returned no location for the new entry", target))
            })?;
        self.get_json(&location).await
    }
}

#[async_trait]
impl HostingPlatform for LaunchpadClient {
    async fn releases(&self) -> Result<Vec<Release>> {
        self.collection(format!("{}/releases", self.project_url()))
            .await
    }

    async fn milestones(&self) -> Result<Vec<Milestone>> {
        self.collection(format!("{}/all_milestones", self.project_url()))
            .await
    }

    async fn series(&self) -> Result<Vec<Series>> {
        self.collection(format!("{}/series", self.project_url()))
            .await
    }

    #[instrument(skip(self, summary))]
    async fn create_series(&self, name: &str, summary: &str) -> Result<Series> {
        self.create(
            &self.project_url(),
            &[("ws.op", "newSeries"), ("name", name), ("summary", summary)],
        )
        .await
    }

    #[instrument(skip(self, series), fields(series = %series.name))]
    async fn create_milestone(&self, series: &Series, name: &str) -> Result<Milestone> {
        self.create(
            &series.self_link,
            &[("ws.op", "newMilestone"), ("name", name)],
        )
        .await
    }

    #[instrument(skip_all, fields(milestone = %milestone.name))]
    async fn create_release(
        &self,
        milestone: &Milestone,
        release_notes: &str,
        changelog: &str,
        date_released: NaiveDate,
    ) -> Result<Release> {
        let date = date_released.format("%Y-%m-%d").to_string();
        self.create(
            &milestone.self_link,
            &[
                ("ws.op", "createProductRelease"),
                ("release_notes", release_notes),
                ("changelog", changelog),
                ("date_released", date.as_str()),
            ],
        )
        .await
    }

    #[instrument(skip(self, milestone), fields(milestone = %milestone.name))]
    async fn deactivate_milestone(&self, milestone: &Milestone) -> Result<()> {
        let response = self
            .authorized(self.client.patch(&milestone.self_link))
            .json(&serde_json::json!({ "is_active": false }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    #[instrument(skip(self, release, upload), fields(file = %upload.file_name))]
    async fn upload_file(&self, release: &Release, upload: &ArtifactUpload) -> Result<String> {
        let content = tokio::fs::read(&upload.local_path).await?;
        let size = content.len();
        let file_part = Part::bytes(content)
            .file_name(upload.file_name.clone())
            .mime_str(&upload.content_type)?;

        let form = Form::new()
            .text("ws.op", "add_file")
            .text("filename", upload.file_name.clone())
            .text("description", upload.description.clone())
            .part("file_content", file_part)
            .text("content_type", upload.content_type.clone())
            .text("file_type", upload.file_type.as_str());

        let response = self
            .authorized(self.client.post(&release.self_link))
            .multipart(form)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::UploadFailed {
                file: upload.file_name.clone(),
                reason: format!("{} {}", status, response.text().await.unwrap_or_default()),
            });
        }

        let version = VersionName::parse(&release.version)?;
        info!(size, "file attached to release");
        Ok(self.download_url(&version.series, &version.milestone, &upload.file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(environment: HostingEnvironment) -> LaunchpadClient {
        let config = LaunchpadConfig::default();
        LaunchpadClient {
            client: Client::new(),
            api_root: environment.api_root(&config).to_string(),
            web_root: environment.web_root(&config).to_string(),
            project: config.project.clone(),
            credentials: OAuthCredentials {
                consumer_key: config.consumer_key,
                token: "t".to_string(),
                token_secret: "s".to_string(),
            },
        }
    }

    #[test]
    fn test_download_url() {
        let lp = client(HostingEnvironment::Production);
        assert_eq!(
            lp.download_url("1.2", "1.2.3", "Chunky-1.2.3-beta1.zip"),
            "https://launchpad.net/chunky/1.2/1.2.3/+download/Chunky-1.2.3-beta1.zip"
        );
        let staging = client(HostingEnvironment::Staging);
        assert!(staging
            .download_url("1.2", "1.2.3", "x")
            .starts_with("https://staging.launchpad.net/chunky/"));
    }

    #[test]
    fn test_collection_page_parsing() {
        let page: Collection<Release> = serde_json::from_str(
            r#"{
                "total_size": 2,
                "start": 0,
                "entries": [
                    {"version": "1.3.0", "self_link": "https://api/chunky/1.3/1.3.0", "date_released": null},
                    {"version": "1.2.3", "self_link": "https://api/chunky/1.2/1.2.3"}
                ],
                "next_collection_link": "https://api/chunky/releases?ws.start=2"
            }"#,
        )
        .unwrap();
        assert_eq!(page.entries.len(), 2);
        assert_eq!(page.entries[1].version, "1.2.3");
        assert!(page.next_collection_link.is_some());
    }

    #[test]
    fn test_last_page_has_no_next_link() {
        let page: Collection<Milestone> = serde_json::from_str(
            r#"{"entries": [{"name": "1.4.0", "self_link": "x", "is_active": false}]}"#,
        )
        .unwrap();
        assert!(page.next_collection_link.is_none());
        assert!(!page.entries[0].is_active);
    }
}
