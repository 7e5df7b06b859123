use std::path::PathBuf;
use std::time::Duration;

use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported file format: {extension}. Supported formats are {supported:?}")]
    UnsupportedFormat {
        extension: String,
        supported: Vec<String>,
    },

    #[error("File size exceeds the limit of {max_mb}MB: {size_mb:.2}MB")]
    FileTooLarge { size_mb: f64, max_mb: u64 },

    #[error("File did not stabilize within {} seconds: {}", .waited.as_secs_f64(), .path.display())]
    Timeout { path: PathBuf, waited: Duration },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} request failed with status {status}: {body}")]
    UnexpectedStatus {
        service: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("Authorization failed: {0}")]
    Auth(String),

    #[error("Failed to open URL in browser: {0}")]
    Browser(String),

    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),
}

impl AppError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, AppError::Timeout { .. })
    }

    /// Rejections raised before any network call is attempted.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AppError::UnsupportedFormat { .. } | AppError::FileTooLarge { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
