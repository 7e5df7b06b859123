use std::sync::Arc;

use tokio::signal;
use tokio::sync::mpsc;
use tokio::time;

use crate::browser::UrlOpener;
use crate::config::Config;
use crate::error::Result;
use crate::filter::FileFilter;
use crate::models::Shutdown;
use crate::pipeline::Pipeline;
use crate::services::UploadTarget;
use crate::stop::StopSignal;
use crate::watcher::DirectoryWatcher;

/// Owns the watch, the termination timer and the pipeline worker for one run.
pub struct App<O> {
    config: Arc<Config>,
    pipeline: Pipeline<O>,
    stop: StopSignal,
}

impl<O: UrlOpener> App<O> {
    pub fn new(config: Arc<Config>, target: UploadTarget, opener: O) -> Self {
        let stop = StopSignal::new();
        let pipeline = Pipeline::new(&config, target, opener, stop.clone());
        Self {
            config,
            pipeline,
            stop,
        }
    }

    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// Watches until a run completes, the termination window elapses, or the
    /// user interrupts. An in-flight run is allowed to finish before returning.
    pub async fn run(self) -> Result<Shutdown> {
        let Self {
            config,
            pipeline,
            stop,
        } = self;

        let (tx, rx) = mpsc::unbounded_channel();
        let watcher = DirectoryWatcher::start(
            &config.monitor.directory,
            FileFilter::from_config(&config),
            tx,
        )?;
        tracing::info!("Monitoring folder for new screenshots...");

        let worker = tokio::spawn(pipeline.run_queue(rx));
        let termination = config.timeouts.termination();

        let reason = tokio::select! {
            _ = stop.wait() => Shutdown::Completed,
            _ = time::sleep(termination) => {
                tracing::info!(
                    "{} seconds elapsed. Stopping the script...",
                    termination.as_secs_f64()
                );
                Shutdown::TimedOut
            }
            _ = async {
                if let Err(e) = signal::ctrl_c().await {
                    tracing::warn!("Unable to listen for Ctrl-C: {}", e);
                    std::future::pending::<()>().await
                }
            } => {
                tracing::info!("Stopping the script...");
                Shutdown::Interrupted
            }
        };

        stop.set();
        drop(watcher);
        if let Err(e) = worker.await {
            tracing::error!("Pipeline worker ended abnormally: {}", e);
        }

        tracing::info!("Script has been terminated ({}).", reason);
        Ok(reason)
    }
}
