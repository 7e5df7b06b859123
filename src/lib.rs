//! Screenshot folder watcher: uploads each new capture to Google Drive or
//! Imgur, opens the public link in a reverse image search, then removes the
//! remote and local copies.

pub mod app;
pub mod browser;
pub mod cleanup;
pub mod config;
pub mod constants;
pub mod error;
pub mod filter;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod stability;
pub mod stop;
pub mod watcher;

pub use app::App;
pub use browser::{SystemBrowser, UrlOpener};
pub use config::{Config, UploadService};
pub use error::{AppError, Result};
pub use models::{Outcome, RemoteImage, Shutdown};
pub use pipeline::Pipeline;
pub use services::UploadTarget;
pub use stop::StopSignal;
