pub mod auth;
pub mod drive;
pub mod imgur;

use std::path::Path;
use std::time::Duration;

use reqwest::Client;

use crate::config::{Config, UploadService};
use crate::constants::HTTP_TIMEOUT;
use crate::error::Result;
use crate::models::RemoteImage;

pub use drive::{DriveClient, DriveTarget};
pub use imgur::ImgurTarget;

/// The one upload backend active for this run.
#[derive(Debug)]
pub enum UploadTarget {
    Drive(DriveTarget),
    Imgur(ImgurTarget),
}

impl UploadTarget {
    pub fn from_config(config: &Config) -> Result<Self> {
        let http = Client::builder().timeout(HTTP_TIMEOUT).build()?;

        Ok(match config.upload_service {
            UploadService::GoogleDrive => UploadTarget::Drive(DriveTarget::new(
                http,
                &config.google_drive,
                config.timeouts.delete_wait(),
            )),
            UploadService::Imgur => UploadTarget::Imgur(ImgurTarget::new(
                http,
                &config.imgur,
                config.supported_formats.clone(),
            )),
        })
    }

    pub fn service(&self) -> UploadService {
        match self {
            UploadTarget::Drive(_) => UploadService::GoogleDrive,
            UploadTarget::Imgur(_) => UploadService::Imgur,
        }
    }

    pub async fn upload(&self, path: &Path) -> Result<RemoteImage> {
        match self {
            UploadTarget::Drive(drive) => drive.upload(path).await,
            UploadTarget::Imgur(imgur) => {
                tracing::info!("Uploading to Imgur...");
                imgur.upload(path).await
            }
        }
    }

    /// Pause before the remote copy is removed; `None` when nothing is removed.
    pub fn cleanup_delay(&self) -> Option<Duration> {
        match self {
            UploadTarget::Drive(drive) => Some(drive.delete_wait()),
            UploadTarget::Imgur(_) => None,
        }
    }

    pub async fn cleanup(&self, remote_id: &str) -> Result<()> {
        match self {
            UploadTarget::Drive(drive) => drive.delete(remote_id).await,
            UploadTarget::Imgur(_) => Ok(()),
        }
    }
}
