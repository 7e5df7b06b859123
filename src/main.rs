use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use shotlens::constants::SHOTLENS_EMOJI;
use shotlens::{logging, App, Config, SystemBrowser, UploadTarget};

#[derive(Parser, Debug)]
#[command(name = "shotlens")]
#[command(about = "Uploads new screenshots and opens them in a reverse image search")]
struct Args {
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load(&args.config)
        .with_context(|| format!("Error loading {}", args.config.display()))?;

    // The log file lives inside the monitored folder
    tokio::fs::create_dir_all(&config.monitor.directory)
        .await
        .with_context(|| format!("Failed to create {}", config.monitor.directory.display()))?;
    logging::init(&config.log_file_path(), config.debug.enabled)?;

    tracing::info!(
        "{} shotlens uploading to {} from {}",
        SHOTLENS_EMOJI,
        config.upload_service,
        config.monitor.directory.display()
    );

    let target = UploadTarget::from_config(&config)?;
    let app = App::new(Arc::new(config), target, SystemBrowser::new());
    app.run().await?;

    Ok(())
}
