//! Shared login-with-retry
//!
//! Every service logs in the same way: take the username and password from
//! the credential store, try them, and on rejection forget both and ask
//! again. There is no retry limit; the operator aborts with Ctrl-C.

use async_trait::async_trait;
use shipit_core::CredentialStore;
use tracing::{info, warn};

use crate::error::Result;

/// Names of a username/password pair in the credential store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialKeys {
    pub user: &'static str,
    pub password: &'static str,
}

impl CredentialKeys {
    /// Keys for the FTP mirror
    pub const FTP: Self = Self {
        user: "ftp user",
        password: "ftp password",
    };

    /// Keys for the announcement forum
    pub const REDDIT: Self = Self {
        user: "reddit user",
        password: "reddit password",
    };

    /// Keys for the hosting platform's OAuth access token
    pub const LAUNCHPAD: Self = Self {
        user: "launchpad token",
        password: "launchpad token secret",
    };
}

/// Turns a username/password pair into a live session
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Authenticated session type
    type Session: Send;

    /// Service name for log messages
    fn service(&self) -> &str;

    /// Try to log in.
    ///
    /// Must return [`StoreError::InvalidCredentials`](crate::StoreError::InvalidCredentials)
    /// when the pair was rejected, so the caller can ask for a new one.
    async fn authenticate(&self, user: &str, password: &str) -> Result<Self::Session>;
}

/// Log in, re-prompting for credentials until the service accepts them.
///
/// Errors other than rejected credentials are returned unchanged.
pub async fn login_with_retry<A>(
    authenticator: &A,
    credentials: &mut CredentialStore,
    keys: CredentialKeys,
) -> Result<A::Session>
where
    A: Authenticator + ?Sized,
{
    loop {
        let user = credentials.get(keys.user)?;
        let password = credentials.get_secret_hidden(keys.password)?;

        match authenticator.authenticate(&user, &password).await {
            Ok(session) => {
                info!(service = authenticator.service(), user = %user, "logged in");
                return Ok(session);
            }
            Err(e) if e.is_invalid_credentials() => {
                warn!(
                    service = authenticator.service(),
                    error = %e,
                    "login failed, please try again"
                );
                credentials.invalidate(keys.user)?;
                credentials.invalidate(keys.password)?;
            }
            Err(e) => return Err(e),
        }
    }
}
