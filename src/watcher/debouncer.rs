//! Watermark debouncing of directory notifications.
//!
//! The event source reports directories, not files. The debouncer lists
//! those directories and keeps only entries modified after the watermark,
//! the moment the previous batch finished. Changes already handled in an
//! earlier batch are therefore never reported twice.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::error::WatchError;
use crate::chain::ChangedFileSet;

/// Turns directory notifications into a set of changed files.
#[derive(Debug, Clone)]
pub struct Debouncer {
    /// Paths under this directory are reported relative to it.
    working_dir: PathBuf,
}

impl Debouncer {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
        }
    }

    /// Entries of `dirs` modified strictly after `watermark`.
    ///
    /// The result is deduplicated and sorted. Directories or files that
    /// vanish while being inspected are skipped.
    pub fn changed_files<I, P>(
        &self,
        dirs: I,
        watermark: SystemTime,
    ) -> Result<ChangedFileSet, WatchError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut changed = Vec::new();
        for dir in dirs {
            for entry in Self::files_in_directory(dir.as_ref())? {
                if Self::changed_since(&entry, watermark)? {
                    changed.push(entry);
                }
            }
        }

        changed.sort();
        changed.dedup();

        Ok(changed.iter().map(|p| self.make_relative(p)).collect())
    }

    fn files_in_directory(dir: &Path) -> Result<Vec<PathBuf>, WatchError> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(WatchError::ReadFailed {
                    path: dir.to_path_buf(),
                    reason: e.to_string(),
                });
            }
        };

        let mut files = Vec::new();
        for entry in entries {
            match entry {
                Ok(entry) => files.push(entry.path()),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(WatchError::ReadFailed {
                        path: dir.to_path_buf(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        Ok(files)
    }

    fn changed_since(path: &Path, watermark: SystemTime) -> Result<bool, WatchError> {
        let modified = fs::metadata(path).and_then(|meta| meta.modified());
        match modified {
            Ok(mtime) => Ok(mtime > watermark),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(WatchError::ReadFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }),
        }
    }

    fn make_relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.working_dir)
            .unwrap_or(path)
            .to_string_lossy()
            .into_owned()
    }
}
