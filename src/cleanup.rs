use std::path::Path;

use tokio::time;

use crate::error::Result;
use crate::models::RemoteImage;
use crate::services::UploadTarget;

/// Cool-down, then remove the remote copy. Failures are logged and swallowed
/// so local cleanup always gets its turn.
pub async fn remove_remote_after_delay(target: &UploadTarget, image: &RemoteImage) {
    let (Some(delay), Some(remote_id)) = (target.cleanup_delay(), image.remote_id.as_deref()) else {
        return;
    };

    tracing::info!(
        "⏳ Waiting for {} seconds before deleting the file from {}...",
        delay.as_secs_f64(),
        target.service()
    );
    time::sleep(delay).await;

    if let Err(e) = target.cleanup(remote_id).await {
        tracing::error!("❌ Error deleting remote file {}: {}", remote_id, e);
    }
}

pub async fn remove_local(path: &Path) -> Result<()> {
    tokio::fs::remove_file(path).await?;
    tracing::info!("🗑️  Deleted processed image locally: {}", path.display());
    Ok(())
}
