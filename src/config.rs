use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::constants::{DRIVE_API_BASE_URL, DRIVE_UPLOAD_BASE_URL, IMGUR_API_URL};
use crate::error::{AppError, Result};

/// Upload backend selected once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadService {
    GoogleDrive,
    Imgur,
}

impl std::fmt::Display for UploadService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UploadService::GoogleDrive => write!(f, "google_drive"),
            UploadService::Imgur => write!(f, "imgur"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub upload_service: UploadService,
    pub monitor: MonitorSettings,
    pub supported_formats: Vec<String>,
    #[serde(default)]
    pub google_drive: DriveSettings,
    #[serde(default)]
    pub imgur: ImgurSettings,
    pub timeouts: Timeouts,
    #[serde(default)]
    pub debug: DebugSettings,
    #[serde(default)]
    pub temporary_files: TemporaryFiles,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitorSettings {
    pub directory: PathBuf,
    pub log_file: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DriveSettings {
    #[serde(default = "default_drive_scopes")]
    pub scopes: Vec<String>,
    #[serde(default = "default_drive_folder")]
    pub folder_name: String,
    #[serde(default = "default_token_file")]
    pub token_file: PathBuf,
    #[serde(default = "default_credentials_file")]
    pub credentials_file: PathBuf,
    #[serde(default = "default_drive_api_base")]
    pub api_base_url: String,
    #[serde(default = "default_drive_upload_base")]
    pub upload_base_url: String,
}

impl Default for DriveSettings {
    fn default() -> Self {
        Self {
            scopes: default_drive_scopes(),
            folder_name: default_drive_folder(),
            token_file: default_token_file(),
            credentials_file: default_credentials_file(),
            api_base_url: default_drive_api_base(),
            upload_base_url: default_drive_upload_base(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImgurSettings {
    #[serde(default = "default_imgur_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub client_id: String,
}

impl Default for ImgurSettings {
    fn default() -> Self {
        Self {
            api_url: default_imgur_api_url(),
            client_id: String::new(),
        }
    }
}

/// Timeout windows, in seconds.
#[derive(Debug, Clone, Deserialize)]
pub struct Timeouts {
    pub file_ready_wait: f64,
    pub script_termination: f64,
    pub delete_wait: f64,
}

impl Timeouts {
    pub fn file_ready(&self) -> Duration {
        seconds(self.file_ready_wait)
    }

    pub fn termination(&self) -> Duration {
        seconds(self.script_termination)
    }

    pub fn delete_wait(&self) -> Duration {
        seconds(self.delete_wait)
    }
}

/// Saturates instead of panicking; `Config::validate` rejects the values this clamps.
fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::MAX)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DebugSettings {
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemporaryFiles {
    #[serde(default)]
    pub prefixes: Vec<String>,
    #[serde(default)]
    pub suffixes: Vec<String>,
}

fn default_drive_scopes() -> Vec<String> {
    vec!["https://www.googleapis.com/auth/drive.file".to_string()]
}

fn default_drive_folder() -> String {
    "img_search".to_string()
}

fn default_token_file() -> PathBuf {
    PathBuf::from("token.json")
}

fn default_credentials_file() -> PathBuf {
    PathBuf::from("credentials.json")
}

fn default_drive_api_base() -> String {
    DRIVE_API_BASE_URL.to_string()
}

fn default_drive_upload_base() -> String {
    DRIVE_UPLOAD_BASE_URL.to_string()
}

fn default_imgur_api_url() -> String {
    IMGUR_API_URL.to_string()
}

impl Config {
    /// Read, override from the environment, normalize and validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;

        let mut config = Self::from_yaml(&raw)?;
        config.apply_overrides(|key| env::var(key).ok());
        config.finalize()?;
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Environment values win over the document.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(client_id) = lookup("IMGUR_CLIENT_ID").filter(|v| !v.is_empty()) {
            self.imgur.client_id = client_id;
        }
        if let Some(dir) = lookup("SHOTLENS_MONITOR_DIR").filter(|v| !v.is_empty()) {
            self.monitor.directory = PathBuf::from(dir);
        }
    }

    pub fn finalize(&mut self) -> Result<()> {
        self.monitor.directory = expand_home(&self.monitor.directory);
        self.supported_formats = self
            .supported_formats
            .iter()
            .map(|f| normalize_format(f))
            .filter(|f| f.len() > 1)
            .collect();
        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        if self.supported_formats.is_empty() {
            return Err(AppError::Config(
                "supported_formats must list at least one extension".to_string(),
            ));
        }
        if self.monitor.log_file.trim().is_empty() {
            return Err(AppError::Config("monitor.log_file must not be empty".to_string()));
        }

        let t = &self.timeouts;
        for (name, value, allow_zero) in [
            ("file_ready_wait", t.file_ready_wait, false),
            ("script_termination", t.script_termination, false),
            ("delete_wait", t.delete_wait, true),
        ] {
            let in_range = if allow_zero { value >= 0.0 } else { value > 0.0 };
            if !in_range || Duration::try_from_secs_f64(value).is_err() {
                return Err(AppError::Config(format!(
                    "timeouts.{} has an invalid value: {}",
                    name, value
                )));
            }
        }

        match self.upload_service {
            UploadService::Imgur => {
                if self.imgur.client_id.trim().is_empty() {
                    return Err(AppError::Config(
                        "imgur.client_id is required when upload_service is imgur".to_string(),
                    ));
                }
                if self.imgur.api_url.trim().is_empty() {
                    return Err(AppError::Config("imgur.api_url must not be empty".to_string()));
                }
            }
            UploadService::GoogleDrive => {
                if self.google_drive.folder_name.trim().is_empty() {
                    return Err(AppError::Config(
                        "google_drive.folder_name must not be empty".to_string(),
                    ));
                }
                if self.google_drive.scopes.is_empty() {
                    return Err(AppError::Config(
                        "google_drive.scopes must list at least one scope".to_string(),
                    ));
                }
            }
        }

        Ok(())
    }

    pub fn log_file_path(&self) -> PathBuf {
        self.monitor.directory.join(&self.monitor.log_file)
    }
}

fn normalize_format(format: &str) -> String {
    let format = format.trim().to_lowercase();
    if format.starts_with('.') {
        format
    } else {
        format!(".{}", format)
    }
}

/// Expands a leading `~` to the current user's home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}
