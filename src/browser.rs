use std::future::Future;

use tokio::process::Command;

use crate::constants::LENS_UPLOAD_BY_URL;
use crate::error::{AppError, Result};

/// Host platform, detected once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Windows,
    Other,
}

impl Platform {
    pub fn current() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    pub fn from_os(os: &str) -> Self {
        match os {
            "macos" => Platform::MacOs,
            "windows" => Platform::Windows,
            _ => Platform::Other,
        }
    }

    /// Program and arguments that open `url` in the default application.
    pub fn open_command(&self, url: &str) -> (&'static str, Vec<String>) {
        match self {
            Platform::MacOs => ("open", vec![url.to_string()]),
            // `start` is a cmd builtin; the empty string is the window title.
            Platform::Windows => (
                "cmd",
                vec!["/C".into(), "start".into(), String::new(), url.to_string()],
            ),
            Platform::Other => ("xdg-open", vec![url.to_string()]),
        }
    }
}

/// Something that can show a URL to the user.
pub trait UrlOpener: Send + Sync + 'static {
    fn open(&self, url: &str) -> impl Future<Output = Result<()>> + Send;
}

/// Opens URLs through the platform's "open" command.
#[derive(Debug, Clone, Copy)]
pub struct SystemBrowser {
    platform: Platform,
}

impl SystemBrowser {
    pub fn new() -> Self {
        Self {
            platform: Platform::current(),
        }
    }
}

impl Default for SystemBrowser {
    fn default() -> Self {
        Self::new()
    }
}

impl UrlOpener for SystemBrowser {
    async fn open(&self, url: &str) -> Result<()> {
        tracing::info!("Opening in default browser: {}", url);

        let (program, args) = self.platform.open_command(url);
        let status = Command::new(program)
            .args(&args)
            .status()
            .await
            .map_err(|e| {
                tracing::error!("Error opening URL in browser: {}", e);
                AppError::Browser(format!("{}: {}", program, e))
            })?;

        if !status.success() {
            tracing::warn!("{} exited with {}", program, status);
        }
        Ok(())
    }
}

/// Reverse image search link for a publicly reachable image.
pub fn lens_url(public_url: &str) -> String {
    format!("{}?url={}", LENS_UPLOAD_BY_URL, public_url)
}
