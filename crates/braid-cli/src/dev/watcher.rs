//! Debounced file watching for the rebuild loop.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::error::{CliError, Result};

/// A filesystem change the rebuild loop cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileChange {
    Modified(PathBuf),
    Created(PathBuf),
    Removed(PathBuf),
}

impl FileChange {
    pub fn path(&self) -> &Path {
        match self {
            FileChange::Modified(path) | FileChange::Created(path) | FileChange::Removed(path) => {
                path
            }
        }
    }
}

/// Watches a project root and forwards debounced changes over a channel.
///
/// Dropping the watcher stops the notification thread.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    root: PathBuf,
}

impl FileWatcher {
    pub fn new(
        root: PathBuf,
        ignore_patterns: Vec<String>,
        debounce_ms: u64,
    ) -> Result<(Self, mpsc::Receiver<FileChange>)> {
        if !root.exists() {
            return Err(CliError::FileNotFound(root));
        }

        let (tx, rx) = mpsc::channel(100);
        let debounce = Duration::from_millis(debounce_ms);
        let watch_root = root.clone();

        // Runs on notify's own thread; a single slot is enough to swallow
        // the editor's burst of events for one file.
        let mut last_event: Option<(PathBuf, Instant)> = None;
        let mut watcher = notify::recommended_watcher(move |result: notify::Result<Event>| {
            let Ok(event) = result else { return };
            for path in &event.paths {
                if should_ignore(path, &watch_root, &ignore_patterns) {
                    continue;
                }

                let now = Instant::now();
                if let Some((last_path, last_time)) = &last_event {
                    if last_path == path && now.duration_since(*last_time) < debounce {
                        continue;
                    }
                }
                last_event = Some((path.clone(), now));

                let change = match event.kind {
                    EventKind::Create(_) => FileChange::Created(path.clone()),
                    EventKind::Modify(_) => FileChange::Modified(path.clone()),
                    EventKind::Remove(_) => FileChange::Removed(path.clone()),
                    _ => continue,
                };
                tracing::trace!(path = %path.display(), "file change dispatched");
                let _ = tx.blocking_send(change);
            }
        })?;
        watcher.watch(&root, RecursiveMode::Recursive)?;

        Ok((
            Self {
                _watcher: watcher,
                root,
            },
            rx,
        ))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Paths outside the root, under an ignored directory, matching an ignored
/// suffix, or with a hidden component are skipped.
fn should_ignore(path: &Path, root: &Path, patterns: &[String]) -> bool {
    let Ok(relative) = path.strip_prefix(root) else {
        return true;
    };

    for pattern in patterns {
        if let Some(suffix) = pattern.strip_prefix('*') {
            if relative.to_string_lossy().ends_with(suffix) {
                return true;
            }
        } else if relative.iter().any(|part| part == OsStr::new(pattern.as_str())) {
            return true;
        }
    }

    relative
        .iter()
        .any(|part| part.to_str().is_some_and(|name| name.starts_with('.')))
}
