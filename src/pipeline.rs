use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::sync::mpsc;

use crate::browser::{lens_url, UrlOpener};
use crate::cleanup;
use crate::config::Config;
use crate::error::Result;
use crate::filter::FileFilter;
use crate::models::Outcome;
use crate::services::UploadTarget;
use crate::stability::wait_for_stable;
use crate::stop::StopSignal;

/// Sets the stop signal however the current run ends, panics included.
struct StopOnDrop<'a>(&'a StopSignal);

impl Drop for StopOnDrop<'_> {
    fn drop(&mut self) {
        self.0.set();
    }
}

/// Detect, settle, upload, open, cool down, clean up. One file at a time.
pub struct Pipeline<O> {
    target: UploadTarget,
    opener: O,
    filter: FileFilter,
    stop: StopSignal,
    ready_timeout: Duration,
}

impl<O: UrlOpener> Pipeline<O> {
    pub fn new(config: &Config, target: UploadTarget, opener: O, stop: StopSignal) -> Self {
        Self {
            target,
            opener,
            filter: FileFilter::from_config(config),
            stop,
            ready_timeout: config.timeouts.file_ready(),
        }
    }

    pub fn stop_signal(&self) -> &StopSignal {
        &self.stop
    }

    /// Runs one file end to end. Errors are logged here and never escape;
    /// the stop signal is set on every exit path.
    pub async fn process(&self, path: &Path) -> Outcome {
        let _stop = StopOnDrop(&self.stop);

        match self.run(path).await {
            Ok(outcome) => outcome,
            Err(e) if e.is_timeout() => {
                tracing::error!("⏱️  Timeout occurred: {}", e);
                Outcome::Failed
            }
            Err(e) => {
                tracing::error!("❌ Unexpected error during process: {}", e);
                tracing::error!("{:?}", e);
                Outcome::Failed
            }
        }
    }

    async fn run(&self, path: &Path) -> Result<Outcome> {
        if self.filter.is_temporary(path) {
            tracing::info!("Ignoring temporary file: {}", path.display());
            return Ok(Outcome::Skipped);
        }
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            tracing::info!("File does not exist: {}", path.display());
            return Ok(Outcome::Skipped);
        }

        wait_for_stable(path, self.ready_timeout).await?;

        let image = self.target.upload(path).await?;

        let search_url = lens_url(&image.url);
        tracing::info!("🔎 Opening Google Lens with URL: {}", search_url);
        self.opener.open(&search_url).await?;

        cleanup::remove_remote_after_delay(&self.target, &image).await;
        cleanup::remove_local(path).await?;

        Ok(Outcome::Completed)
    }

    /// Consumes watcher candidates in arrival order until the stop signal is
    /// set or the watcher goes away. A run in progress is never interrupted.
    pub async fn run_queue(self, mut candidates: mpsc::UnboundedReceiver<PathBuf>) {
        loop {
            let path = tokio::select! {
                biased;
                _ = self.stop.wait() => break,
                next = candidates.recv() => match next {
                    Some(path) => path,
                    None => break,
                },
            };
            self.process(&path).await;
        }
        tracing::debug!("Pipeline worker finished");
    }
}
