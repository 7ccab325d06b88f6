//! Filesystem event source backed by `notify`.
//!
//! Raw events are coalesced over a latency window and reported as the set
//! of directories that saw activity, which is what the debouncer consumes.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use notify::{Event, EventKind, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant, timeout_at};

use super::error::WatchError;

/// Delivers batches of changed directories.
pub struct EventSource {
    /// Channel for receiving file events.
    event_rx: mpsc::Receiver<notify::Result<Event>>,
    /// The underlying file watcher; `None` once stopped.
    watcher: Option<notify::RecommendedWatcher>,
    dirs: Vec<PathBuf>,
    latency: Duration,
}

impl EventSource {
    /// Start watching `dirs` recursively.
    pub fn start(dirs: &[PathBuf], latency: Duration) -> Result<Self, WatchError> {
        let (tx, rx) = mpsc::channel(100);

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = tx.blocking_send(res);
        })?;

        for dir in dirs {
            watcher
                .watch(dir, RecursiveMode::Recursive)
                .map_err(|e| WatchError::PathWatchFailed {
                    path: dir.clone(),
                    reason: e.to_string(),
                })?;
            crate::debug_event!("watcher", "watching", "{}", dir.display());
        }

        Ok(Self {
            event_rx: rx,
            watcher: Some(watcher),
            dirs: dirs.to_vec(),
            latency,
        })
    }

    /// Wait for the next batch.
    ///
    /// Blocks until an event arrives, then collects for one latency window
    /// measured from that event. Later events never extend the window.
    /// Returns `None` once stopped.
    pub async fn next_batch(&mut self) -> Option<Vec<PathBuf>> {
        let mut dirs = BTreeSet::new();

        let first = self.event_rx.recv().await?;
        let deadline = Instant::now() + self.latency;
        Self::collect(first, &mut dirs);

        loop {
            match timeout_at(deadline, self.event_rx.recv()).await {
                Ok(Some(res)) => Self::collect(res, &mut dirs),
                Ok(None) => break,
                Err(_) => break,
            }
        }

        Some(dirs.into_iter().collect())
    }

    /// Stop delivering events.
    pub fn stop(&mut self) {
        if let Some(mut watcher) = self.watcher.take() {
            for dir in &self.dirs {
                if let Err(e) = watcher.unwatch(dir) {
                    tracing::debug!("[watcher] failed to unwatch {}: {e}", dir.display());
                }
            }
        }
        self.event_rx.close();
    }

    fn collect(res: notify::Result<Event>, dirs: &mut BTreeSet<PathBuf>) {
        match res {
            Ok(event) => {
                if !is_relevant(&event.kind) {
                    return;
                }
                dirs.extend(event.paths.iter().filter_map(|p| directory_of(p)));
            }
            Err(e) => {
                tracing::error!("[watcher] file watch error: {e}");
            }
        }
    }
}

/// Accesses don't change anything on disk.
fn is_relevant(kind: &EventKind) -> bool {
    !matches!(kind, EventKind::Access(_))
}

/// Directory to list for a changed path: the path itself when it is a
/// directory, its parent otherwise (including paths that no longer exist).
fn directory_of(path: &Path) -> Option<PathBuf> {
    if path.is_dir() {
        Some(path.to_path_buf())
    } else {
        path.parent().map(Path::to_path_buf)
    }
}
