use std::path::{Path, PathBuf};

use notify::event::{CreateKind, ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::error::Result;
use crate::filter::FileFilter;

/// Non-recursive watch on the screenshot folder. Dropping it stops the watch.
pub struct DirectoryWatcher {
    _watcher: RecommendedWatcher,
}

impl DirectoryWatcher {
    /// Forwards every accepted path to `candidates`, in arrival order.
    pub fn start(
        directory: &Path,
        filter: FileFilter,
        candidates: mpsc::UnboundedSender<PathBuf>,
    ) -> Result<Self> {
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                tracing::debug!("Raw file event received: {:?}", event);
                if let Some(path) = accepted_path(&event, &filter) {
                    if let Err(e) = candidates.send(path) {
                        tracing::error!("Failed to queue file event: {}", e);
                    }
                }
            }
            Err(e) => tracing::error!("Watch error: {}", e),
        })?;

        watcher.watch(directory, RecursiveMode::NonRecursive)?;
        tracing::info!("👀 Started watching folder: {}", directory.display());

        Ok(Self { _watcher: watcher })
    }
}

/// Where a qualifying event's file now lives, plus the label used in logs.
fn event_target(event: &Event) -> Option<(&Path, &'static str)> {
    match event.kind {
        EventKind::Create(CreateKind::Folder) => None,
        EventKind::Create(_) => event.paths.first().map(|p| (p.as_path(), "created")),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            event.paths.first().map(|p| (p.as_path(), "moved"))
        }
        // Backends that pair renames also emit the `To` half; taking only that
        // one keeps a rename inside the folder to a single dispatch.
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => None,
        // Backends that do not pair renames report each side separately.
        EventKind::Modify(ModifyKind::Name(RenameMode::Any)) => event
            .paths
            .first()
            .filter(|p| p.exists())
            .map(|p| (p.as_path(), "moved")),
        _ => None,
    }
}

pub(crate) fn accepted_path(event: &Event, filter: &FileFilter) -> Option<PathBuf> {
    let (path, label) = event_target(event)?;

    if path.is_dir() || !filter.has_supported_format(path) {
        return None;
    }
    if filter.is_temporary(path) {
        tracing::info!("Ignoring temporary file ({}): {}", label, path.display());
        return None;
    }

    tracing::info!("📸 New screenshot detected ({}): {}", label, path.display());
    Some(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{DataChange, RemoveKind};

    fn filter() -> FileFilter {
        FileFilter::new(vec![".png".into()], vec![".".into()], vec![".tmp".into()])
    }

    fn event(kind: EventKind, paths: &[&str]) -> Event {
        paths
            .iter()
            .fold(Event::new(kind), |event, p| event.add_path(PathBuf::from(p)))
    }

    #[test]
    fn accepts_created_screenshot() {
        let e = event(EventKind::Create(CreateKind::File), &["/shots/a.PNG"]);
        assert_eq!(accepted_path(&e, &filter()), Some(PathBuf::from("/shots/a.PNG")));
    }

    #[test]
    fn accepts_rename_destination_once() {
        let to = event(EventKind::Modify(ModifyKind::Name(RenameMode::To)), &["/shots/b.png"]);
        assert_eq!(accepted_path(&to, &filter()), Some(PathBuf::from("/shots/b.png")));

        let both = event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            &["/shots/.a.png.tmp", "/shots/a.png"],
        );
        assert_eq!(accepted_path(&both, &filter()), None);
    }

    #[tokio::test]
    async fn rename_inside_folder_queues_one_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let draft = dir.path().join("draft.bin");
        std::fs::write(&draft, b"pixels").unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let _watcher = DirectoryWatcher::start(dir.path(), filter(), tx).unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;

        let shot = dir.path().join("shot.png");
        std::fs::rename(&draft, &shot).unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(700)).await;

        let mut queued = Vec::new();
        while let Ok(path) = rx.try_recv() {
            queued.push(path);
        }
        assert_eq!(queued.len(), 1, "queued: {:?}", queued);
        assert_eq!(queued[0].file_name(), shot.file_name());
    }

    #[test]
    fn rejects_temporary_and_foreign_files() {
        let temp = event(EventKind::Create(CreateKind::File), &["/shots/.tmp_shot.png"]);
        assert_eq!(accepted_path(&temp, &filter()), None);

        let log = event(EventKind::Create(CreateKind::File), &["/shots/screenshot.log"]);
        assert_eq!(accepted_path(&log, &filter()), None);
    }

    #[test]
    fn ignores_writes_removals_and_folders() {
        let write = event(
            EventKind::Modify(ModifyKind::Data(DataChange::Content)),
            &["/shots/a.png"],
        );
        assert_eq!(accepted_path(&write, &filter()), None);

        let removed = event(EventKind::Remove(RemoveKind::File), &["/shots/a.png"]);
        assert_eq!(accepted_path(&removed, &filter()), None);

        let folder = event(EventKind::Create(CreateKind::Folder), &["/shots/dir.png"]);
        assert_eq!(accepted_path(&folder, &filter()), None);
    }
}
