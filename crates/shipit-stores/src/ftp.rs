//! FTP mirror connection
//!
//! Blocking FTP through `suppaftp`. The calls run on the current thread,
//! which is fine for a tool that does one thing at a time.

use std::fs::File;
use std::path::Path;

use async_trait::async_trait;
use shipit_core::config::MirrorConfig;
use suppaftp::types::FileType;
use suppaftp::{FtpError, FtpStream, Status};
use tracing::{debug, info, instrument};

use crate::error::{Result, StoreError};
use crate::login::Authenticator;
use crate::mirror::MirrorSession;

/// Opens logged-in FTP sessions to the mirror host
#[derive(Debug, Clone)]
pub struct FtpAuthenticator {
    host: String,
    port: u16,
}

impl FtpAuthenticator {
    /// Create an authenticator for the configured mirror
    pub fn new(config: &MirrorConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
        }
    }
}

#[async_trait]
impl Authenticator for FtpAuthenticator {
    type Session = FtpSession;

    fn service(&self) -> &str {
        "ftp"
    }

    #[instrument(skip(self, password), fields(host = %self.host))]
    async fn authenticate(&self, user: &str, password: &str) -> Result<FtpSession> {
        let mut stream = FtpStream::connect((self.host.as_str(), self.port))?;
        match stream.login(user, password) {
            Ok(()) => {}
            Err(FtpError::UnexpectedResponse(response)) if response.status == Status::NotLoggedIn => {
                let _ = stream.quit();
                return Err(StoreError::InvalidCredentials(format!(
                    "{} rejected the login",
                    self.host
                )));
            }
            Err(e) => return Err(e.into()),
        }
        stream.transfer_type(FileType::Binary)?;
        info!("connected to mirror");
        Ok(FtpSession { stream })
    }
}

/// A logged-in FTP connection
pub struct FtpSession {
    stream: FtpStream,
}

impl MirrorSession for FtpSession {
    fn cwd(&mut self, dir: &str) -> Result<()> {
        debug!(dir, "CWD");
        self.stream.cwd(dir)?;
        Ok(())
    }

    fn put(&mut self, remote_name: &str, local_path: &Path) -> Result<()> {
        let mut file = File::open(local_path)?;
        let bytes = self.stream.put_file(remote_name, &mut file)?;
        info!(remote = remote_name, local = %local_path.display(), bytes, "stored");
        Ok(())
    }

    fn quit(&mut self) -> Result<()> {
        self.stream.quit()?;
        Ok(())
    }
}

impl std::fmt::Debug for FtpSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FtpSession").finish_non_exhaustive()
    }
}
