//! Release announcements
//!
//! Release posts reuse the draft written after hosting upload. Snapshot
//! posts are rendered from the version's notes and changelog.

use async_trait::async_trait;
use shipit_core::config::AnnounceConfig;
use shipit_core::error::NotesError;
use shipit_core::{Config, CredentialStore, ReleaseDocuments, ShipitError, VersionDescriptor};
use tracing::{info, instrument};

use crate::error::{Result, StoreError};
use crate::login::{login_with_retry, Authenticator, CredentialKeys};
use crate::types::PostRef;

/// A logged-in forum session
#[async_trait]
pub trait AnnouncementSession: Send + Sync {
    /// Submit a text post
    async fn submit(&self, forum: &str, title: &str, body: &str) -> Result<PostRef>;

    /// Set link flair on a post
    async fn set_flair(&self, post: &PostRef, text: &str, css_class: &str) -> Result<()>;

    /// Pin a post to the top of the forum
    async fn pin(&self, post: &PostRef) -> Result<()>;
}

/// Posts release and snapshot announcements
pub struct AnnouncementPublisher<'a, A: Authenticator + ?Sized> {
    authenticator: &'a A,
    documents: &'a ReleaseDocuments,
    config: AnnounceConfig,
    display_name: String,
}

impl<'a, A> AnnouncementPublisher<'a, A>
where
    A: Authenticator + ?Sized,
    A::Session: AnnouncementSession,
{
    /// Create a publisher
    pub fn new(authenticator: &'a A, documents: &'a ReleaseDocuments, config: &Config) -> Self {
        Self {
            authenticator,
            documents,
            config: config.announce.clone(),
            display_name: config.project.display_name.clone(),
        }
    }

    /// Post the release draft, flair it and pin it.
    ///
    /// Fails with [`StoreError::DraftMissing`] before logging in when the
    /// draft has not been written.
    #[instrument(skip(self, credentials, version), fields(version = %version.full()))]
    pub async fn post_release(
        &self,
        credentials: &mut CredentialStore,
        version: &VersionDescriptor,
    ) -> Result<PostRef> {
        let body = match self.documents.read_draft(version.milestone()) {
            Ok(body) => body,
            Err(ShipitError::Notes(NotesError::DraftMissing(path))) => {
                return Err(StoreError::DraftMissing(path))
            }
            Err(e) => return Err(e.into()),
        };

        let session =
            login_with_retry(self.authenticator, credentials, CredentialKeys::REDDIT).await?;
        let title = format!("{} {} released!", self.display_name, version.full());
        let post = session.submit(&self.config.subreddit, &title, &body).await?;
        session
            .set_flair(&post, &self.config.flair_text, &self.config.flair_css_class)
            .await?;
        session.pin(&post).await?;

        info!(post = %post.fullname, "submitted release thread");
        Ok(post)
    }

    /// Post a snapshot announcement (flaired, not pinned)
    #[instrument(skip(self, credentials, version), fields(version = %version.full()))]
    pub async fn post_snapshot(
        &self,
        credentials: &mut CredentialStore,
        version: &VersionDescriptor,
    ) -> Result<PostRef> {
        let body = self.documents.render_snapshot_body(version);

        let session =
            login_with_retry(self.authenticator, credentials, CredentialKeys::REDDIT).await?;
        let title = format!("{} Snapshot {}", self.display_name, version.full());
        let post = session.submit(&self.config.subreddit, &title, &body).await?;
        session
            .set_flair(&post, &self.config.flair_text, &self.config.flair_css_class)
            .await?;

        info!(post = %post.fullname, "submitted snapshot thread");
        Ok(post)
    }
}
