//! Service backends
//!
//! The pipeline reaches every remote service through [`Backends`], so runs
//! can be exercised against in-memory fakes.

use shipit_core::{Config, CredentialStore};
use shipit_stores::ftp::{FtpAuthenticator, FtpSession};
use shipit_stores::launchpad::{LaunchpadClient, LaunchpadConnector};
use shipit_stores::reddit::{RedditAuthenticator, RedditSession};
use shipit_stores::{
    AnnouncementSession, Authenticator, HostingEnvironment, HostingPlatform, MirrorSession,
};

/// Factory for the login side of each distribution channel
pub trait Backends: Send + Sync {
    /// Hosting platform session
    type Hosting: HostingPlatform;
    /// Logs in to the hosting platform
    type HostingLogin: Authenticator<Session = Self::Hosting>;
    /// Mirror session
    type Mirror: MirrorSession;
    /// Logs in to the mirror
    type MirrorLogin: Authenticator<Session = Self::Mirror>;
    /// Announcement forum session
    type Forum: AnnouncementSession;
    /// Logs in to the announcement forum
    type ForumLogin: Authenticator<Session = Self::Forum>;

    /// Hosting login for one environment
    fn hosting(&self, environment: HostingEnvironment) -> Self::HostingLogin;

    /// Mirror login
    fn mirror(&self) -> Self::MirrorLogin;

    /// Forum login; may need app credentials from the store
    fn forum(&self, credentials: &mut CredentialStore) -> shipit_stores::Result<Self::ForumLogin>;
}

/// The real services: Launchpad, the FTP mirror and Reddit
#[derive(Debug, Clone)]
pub struct LiveBackends {
    config: Config,
}

impl LiveBackends {
    /// Create backends for a configuration
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
        }
    }
}

impl Backends for LiveBackends {
    type Hosting = LaunchpadClient;
    type HostingLogin = LaunchpadConnector;
    type Mirror = FtpSession;
    type MirrorLogin = FtpAuthenticator;
    type Forum = RedditSession;
    type ForumLogin = RedditAuthenticator;

    fn hosting(&self, environment: HostingEnvironment) -> LaunchpadConnector {
        LaunchpadConnector::new(&self.config.launchpad, environment)
    }

    fn mirror(&self) -> FtpAuthenticator {
        FtpAuthenticator::new(&self.config.mirror)
    }

    fn forum(&self, credentials: &mut CredentialStore) -> shipit_stores::Result<RedditAuthenticator> {
        RedditAuthenticator::from_store(&self.config.announce, credentials)
    }
}
