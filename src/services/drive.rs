use std::path::Path;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};

use crate::config::DriveSettings;
use crate::constants::{DRIVE_FOLDER_MIME, DRIVE_UPLOAD_MIME};
use crate::error::{AppError, Result};
use crate::models::{DriveFile, DriveFileList, DriveFileMetadata, DrivePermission, RemoteImage};
use crate::services::auth::Authenticator;

/// Thin client over the Drive v3 REST endpoints this tool needs.
#[derive(Debug, Clone)]
pub struct DriveClient {
    http: Client,
    api_base: String,
    upload_base: String,
}

impl DriveClient {
    pub fn new(http: Client, api_base: &str, upload_base: &str) -> Self {
        Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            upload_base: upload_base.trim_end_matches('/').to_string(),
        }
    }

    /// Looks up a non-trashed folder by exact name, creating it when absent.
    pub async fn find_or_create_folder(&self, token: &str, folder_name: &str) -> Result<String> {
        let query = format!(
            "name='{}' and mimeType='{}' and trashed=false",
            escape_query(folder_name),
            DRIVE_FOLDER_MIME
        );
        let request = self
            .http
            .get(format!("{}/drive/v3/files", self.api_base))
            .query(&[("q", query.as_str()), ("fields", "files(id, name)"), ("spaces", "drive")]);
        let response = request.bearer_auth(token).send().await?;
        let list: DriveFileList = Self::expect_success("folder lookup", response)
            .await?
            .json()
            .await?;

        if let Some(folder) = list.files.into_iter().next() {
            tracing::debug!("Found Drive folder {} ({})", folder_name, folder.id);
            return Ok(folder.id);
        }

        let metadata = DriveFileMetadata {
            name: folder_name,
            mime_type: Some(DRIVE_FOLDER_MIME),
            parents: vec![],
        };
        let request = self
            .http
            .post(format!("{}/drive/v3/files", self.api_base))
            .query(&[("fields", "id")])
            .json(&metadata);
        let response = request.bearer_auth(token).send().await?;
        let folder: DriveFile = Self::expect_success("folder create", response)
            .await?
            .json()
            .await?;

        tracing::info!("Created Drive folder {} ({})", folder_name, folder.id);
        Ok(folder.id)
    }

    /// Uploads `path` under its base name into `folder_id`, always typed image/jpeg.
    pub async fn upload_file(&self, token: &str, path: &Path, folder_id: &str) -> Result<String> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "screenshot".to_string());
        let bytes = tokio::fs::read(path).await?;

        let metadata = DriveFileMetadata {
            name: &file_name,
            mime_type: None,
            parents: vec![folder_id],
        };
        let boundary = format!("shotlens-{}", uuid::Uuid::new_v4().simple());
        let metadata = serde_json::to_vec(&metadata)?;
        let body = related_body(&boundary, &metadata, DRIVE_UPLOAD_MIME, &bytes);

        let request = self
            .http
            .post(format!("{}/upload/drive/v3/files", self.upload_base))
            .query(&[("uploadType", "multipart"), ("fields", "id")])
            .header(CONTENT_TYPE, format!("multipart/related; boundary={}", boundary))
            .body(body);
        let response = request.bearer_auth(token).send().await?;
        let file: DriveFile = Self::expect_success("file upload", response)
            .await?
            .json()
            .await?;

        Ok(file.id)
    }

    /// Anyone with the link may read.
    pub async fn grant_public_read(&self, token: &str, file_id: &str) -> Result<()> {
        let permission = DrivePermission {
            role: "reader",
            kind: "anyone",
        };
        let request = self
            .http
            .post(format!("{}/drive/v3/files/{}/permissions", self.api_base, file_id))
            .json(&permission);
        Self::expect_success("permission create", request.bearer_auth(token).send().await?).await?;
        Ok(())
    }

    pub async fn delete_file(&self, token: &str, file_id: &str) -> Result<()> {
        let request = self
            .http
            .delete(format!("{}/drive/v3/files/{}", self.api_base, file_id));
        Self::expect_success("file delete", request.bearer_auth(token).send().await?).await?;
        Ok(())
    }

    async fn expect_success(action: &'static str, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        tracing::debug!("Drive {} failed: {}", action, body);
        Err(AppError::UnexpectedStatus {
            service: "Google Drive",
            status,
            body,
        })
    }
}

/// Direct-download style link for a shared file.
pub fn public_url(file_id: &str) -> String {
    format!("https://drive.google.com/uc?id={}", file_id)
}

fn escape_query(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

fn related_body(boundary: &str, metadata: &[u8], media_type: &str, media: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(media.len() + metadata.len() + 256);
    let metadata_head = format!(
        "--{}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n",
        boundary
    );
    let media_head = format!("\r\n--{}\r\nContent-Type: {}\r\n\r\n", boundary, media_type);
    body.extend_from_slice(metadata_head.as_bytes());
    body.extend_from_slice(metadata);
    body.extend_from_slice(media_head.as_bytes());
    body.extend_from_slice(media);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    body
}

/// Drive backend: authorize, ensure the folder, upload, share.
#[derive(Debug)]
pub struct DriveTarget {
    client: DriveClient,
    auth: Authenticator,
    folder_name: String,
    delete_wait: Duration,
}

impl DriveTarget {
    pub fn new(http: Client, settings: &DriveSettings, delete_wait: Duration) -> Self {
        Self {
            client: DriveClient::new(
                http.clone(),
                &settings.api_base_url,
                &settings.upload_base_url,
            ),
            auth: Authenticator::new(http, settings),
            folder_name: settings.folder_name.clone(),
            delete_wait,
        }
    }

    pub async fn upload(&self, path: &Path) -> Result<RemoteImage> {
        let token = self.auth.access_token().await?;
        let folder_id = self.client.find_or_create_folder(&token, &self.folder_name).await?;

        tracing::info!("Uploading image to Google Drive folder: {}...", self.folder_name);
        let file_id = self.client.upload_file(&token, path, &folder_id).await?;
        self.client.grant_public_read(&token, &file_id).await?;

        let url = public_url(&file_id);
        tracing::info!("Google Drive Public URL: {}", url);
        Ok(RemoteImage {
            url,
            remote_id: Some(file_id),
        })
    }

    pub async fn delete(&self, file_id: &str) -> Result<()> {
        tracing::info!("Deleting file from Google Drive: {}", file_id);
        let token = self.auth.access_token().await?;
        self.client.delete_file(&token, file_id).await?;
        tracing::info!("Deleted file from Google Drive: {}", file_id);
        Ok(())
    }

    pub fn delete_wait(&self) -> Duration {
        self.delete_wait
    }
}
