//! Distribution channel publishers for Shipit
//!
//! This crate talks to the services a release is published to.
//!
//! ## Channels
//!
//! - **Launchpad**: release records and downloadable artifacts
//! - **FTP mirror**: launcher, update manifest and core library for the auto-updater
//! - **Reddit**: release and snapshot announcements
//!
//! Every channel logs in through [`login_with_retry`], which keeps asking
//! for new credentials until the service accepts them.
//!
//! ## Usage
//!
//! ```ignore
//! use shipit_stores::{ftp::FtpAuthenticator, mirror::MirrorPublisher};
//!
//! let ftp = FtpAuthenticator::new(&config.mirror);
//! MirrorPublisher::new(&ftp, &config, &root)
//!     .publish_release(&mut credentials, &version)
//!     .await?;
//! ```

pub mod announce;
pub mod error;
pub mod ftp;
pub mod hosting;
pub mod launchpad;
pub mod login;
pub mod mirror;
pub mod reddit;
pub mod types;

pub use announce::{AnnouncementPublisher, AnnouncementSession};
pub use error::{Result, StoreError};
pub use hosting::{find_or_plan_create, HostingPlatform, HostingPublisher, Lookup};
pub use login::{login_with_retry, Authenticator, CredentialKeys};
pub use mirror::{MirrorPublisher, MirrorSession};
pub use types::*;
