use std::path::Path;
use std::time::Duration;

use tokio::time::{sleep, Instant};

use crate::constants::STABILITY_POLL_INTERVAL;
use crate::error::{AppError, Result};

/// Block until two consecutive size samples match and are non-zero.
///
/// A missing file counts as "not yet stable": some filesystems briefly drop
/// a file while it is still being written.
pub async fn wait_for_stable(path: &Path, timeout: Duration) -> Result<u64> {
    wait_for_stable_every(path, timeout, STABILITY_POLL_INTERVAL).await
}

pub(crate) async fn wait_for_stable_every(
    path: &Path,
    timeout: Duration,
    interval: Duration,
) -> Result<u64> {
    tracing::info!("Waiting for the file to be ready: {}", path.display());

    let started = Instant::now();
    let mut previous: Option<u64> = None;

    while started.elapsed() < timeout {
        match tokio::fs::metadata(path).await {
            Ok(meta) => {
                let size = meta.len();
                if previous == Some(size) && size > 0 {
                    tracing::info!("File is ready: {}", path.display());
                    return Ok(size);
                }
                previous = Some(size);
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("File not found during size check: {}", path.display());
            }
            Err(e) => return Err(e.into()),
        }
        sleep(interval).await;
    }

    Err(AppError::Timeout {
        path: path.to_path_buf(),
        waited: timeout,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[tokio::test]
    async fn settled_file_is_ready() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shot.png");
        tokio::fs::write(&path, vec![7u8; 4096]).await.unwrap();

        let size = wait_for_stable(&path, Duration::from_secs(5)).await.unwrap();
        assert_eq!(size, 4096);
    }

    #[tokio::test]
    async fn empty_file_times_out() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.png");
        tokio::fs::write(&path, b"").await.unwrap();

        let (timeout, every) = (Duration::from_millis(300), Duration::from_millis(50));
        let err = wait_for_stable_every(&path, timeout, every)
            .await
            .unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn missing_file_times_out() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gone.png");

        let (timeout, every) = (Duration::from_millis(300), Duration::from_millis(50));
        let err = wait_for_stable_every(&path, timeout, every)
            .await
            .unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn growing_file_times_out() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("growing.png");
        std::fs::write(&path, b"start").unwrap();

        let writer_path = path.clone();
        let writer = tokio::spawn(async move {
            for _ in 0..40 {
                let mut file = std::fs::OpenOptions::new()
                    .append(true)
                    .open(&writer_path)
                    .unwrap();
                file.write_all(&[1u8; 64]).unwrap();
                sleep(Duration::from_millis(20)).await;
            }
        });

        let (timeout, every) = (Duration::from_millis(500), Duration::from_millis(100));
        let err = wait_for_stable_every(&path, timeout, every)
            .await
            .unwrap_err();
        assert!(err.is_timeout());
        writer.abort();
    }

    #[tokio::test]
    async fn file_appearing_late_becomes_ready() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("late.png");

        let writer_path = path.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(120)).await;
            tokio::fs::write(&writer_path, vec![1u8; 128]).await.unwrap();
        });

        let size = wait_for_stable_every(&path, Duration::from_secs(3), Duration::from_millis(50))
            .await
            .unwrap();
        assert_eq!(size, 128);
    }
}
