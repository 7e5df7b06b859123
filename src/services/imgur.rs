use std::path::Path;

use reqwest::header::AUTHORIZATION;
use reqwest::multipart;
use reqwest::{Client, StatusCode};

use crate::config::ImgurSettings;
use crate::constants::MAX_IMGUR_UPLOAD_SIZE;
use crate::error::{AppError, Result};
use crate::models::{ImgurResponse, RemoteImage};

/// Anonymous Imgur upload with a client id.
#[derive(Debug, Clone)]
pub struct ImgurTarget {
    http: Client,
    api_url: String,
    client_id: String,
    formats: Vec<String>,
}

impl ImgurTarget {
    pub fn new(http: Client, settings: &ImgurSettings, formats: Vec<String>) -> Self {
        Self {
            http,
            api_url: settings.api_url.clone(),
            client_id: settings.client_id.clone(),
            formats: formats.into_iter().map(|f| f.to_lowercase()).collect(),
        }
    }

    /// Checks format and size before anything touches the network.
    pub async fn validate(&self, path: &Path) -> Result<u64> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_lowercase()))
            .unwrap_or_default();
        if !self.formats.iter().any(|f| *f == extension) {
            return Err(AppError::UnsupportedFormat {
                extension,
                supported: self.formats.clone(),
            });
        }

        let size = tokio::fs::metadata(path).await?.len();
        if size > MAX_IMGUR_UPLOAD_SIZE {
            return Err(AppError::FileTooLarge {
                size_mb: size as f64 / (1024.0 * 1024.0),
                max_mb: MAX_IMGUR_UPLOAD_SIZE / (1024 * 1024),
            });
        }

        Ok(size)
    }

    pub async fn upload(&self, path: &Path) -> Result<RemoteImage> {
        self.validate(path).await?;

        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let form = multipart::Form::new()
            .part("image", multipart::Part::bytes(bytes).file_name(file_name));

        let response = self
            .http
            .post(&self.api_url)
            .header(AUTHORIZATION, format!("Client-ID {}", self.client_id))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::UnexpectedStatus {
                service: "Imgur upload",
                status,
                body,
            });
        }

        let parsed: ImgurResponse = response.json().await?;
        tracing::info!("Imgur URL obtained: {}", parsed.data.link);

        Ok(RemoteImage {
            url: parsed.data.link,
            remote_id: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn target(api_url: String) -> ImgurTarget {
        let settings = ImgurSettings {
            api_url,
            client_id: "client-123".to_string(),
        };
        ImgurTarget::new(Client::new(), &settings, vec![".png".into(), ".jpg".into()])
    }

    #[tokio::test]
    async fn posts_file_with_client_id_header() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/3/image")
            .match_header("authorization", "Client-ID client-123")
            .match_header(
                "content-type",
                mockito::Matcher::Regex("multipart/form-data".to_string()),
            )
            .with_status(200)
            .with_body(r#"{"data":{"link":"https://i.imgur.com/abc.png"}}"#)
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Shot.PNG");
        tokio::fs::write(&path, vec![9u8; 2048]).await.unwrap();

        let image = target(format!("{}/3/image", server.url())).upload(&path).await.unwrap();
        assert_eq!(image.url, "https://i.imgur.com/abc.png");
        assert_eq!(image.remote_id, None);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_200_carries_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/3/image")
            .with_status(429)
            .with_body("rate limited")
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shot.png");
        tokio::fs::write(&path, vec![9u8; 16]).await.unwrap();

        let err = target(format!("{}/3/image", server.url())).upload(&path).await.unwrap_err();
        match err {
            AppError::UnexpectedStatus { status, body, .. } => {
                assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
                assert_eq!(body, "rate limited");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn rejects_unsupported_format_without_network() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("POST", mockito::Matcher::Any).expect(0).create_async().await;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shot.gif");
        tokio::fs::write(&path, vec![1u8; 16]).await.unwrap();

        let err = target(server.url()).upload(&path).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::UnsupportedFormat { ref extension, .. } if extension == ".gif"
        ));
        assert!(err.is_validation());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn rejects_oversized_file_without_network() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("POST", mockito::Matcher::Any).expect(0).create_async().await;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("huge.png");
        let file = std::fs::File::create(&path).unwrap();
        file.set_len(MAX_IMGUR_UPLOAD_SIZE + 1).unwrap();

        let err = target(server.url()).upload(&path).await.unwrap_err();
        assert!(matches!(err, AppError::FileTooLarge { max_mb: 10, .. }));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn file_at_ceiling_is_accepted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("edge.jpg");
        let file = std::fs::File::create(&path).unwrap();
        file.set_len(MAX_IMGUR_UPLOAD_SIZE).unwrap();

        let size = target("http://127.0.0.1:9".to_string()).validate(&path).await.unwrap();
        assert_eq!(size, MAX_IMGUR_UPLOAD_SIZE);
    }
}
