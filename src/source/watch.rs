//! File watching for source buffers backed by files on disk

use std::fs;
use std::path::{Path, PathBuf};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::engine::SourceChange;

/// Which buffer a watched file feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Markup,
    Style,
    Script,
}

impl SourceKind {
    pub fn change(self, contents: String) -> SourceChange {
        match self {
            SourceKind::Markup => SourceChange::Markup(contents),
            SourceKind::Style => SourceChange::Style(contents),
            SourceKind::Script => SourceChange::Script(contents),
        }
    }
}

struct WatchedFile {
    kind: SourceKind,
    path: PathBuf,
    contents: String,
}

/// Turns filesystem notifications into [`SourceChange`]s.
///
/// Parent directories are watched rather than the files themselves, so
/// editors that save by writing a new file and renaming it over the old one
/// keep being followed.
pub struct SourceWatcher {
    _watcher: RecommendedWatcher,
    paths: mpsc::UnboundedReceiver<PathBuf>,
    files: Vec<WatchedFile>,
}

fn is_content_event(kind: &EventKind) -> bool {
    matches!(kind, EventKind::Create(_) | EventKind::Modify(_))
}

fn canonical(path: PathBuf) -> PathBuf {
    fs::canonicalize(&path).unwrap_or(path)
}

impl SourceWatcher {
    /// Watch `files`, taking their current contents as the baseline
    pub fn new(files: Vec<(SourceKind, PathBuf)>) -> Result<Self, notify::Error> {
        let (tx, rx) = mpsc::unbounded_channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| match res {
                Ok(event) if is_content_event(&event.kind) => {
                    for path in event.paths {
                        let _ = tx.send(path);
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::debug!("File watch error: {e}"),
            },
            notify::Config::default(),
        )?;

        let mut dirs: Vec<PathBuf> = Vec::new();
        let mut watched = Vec::with_capacity(files.len());
        for (kind, path) in files {
            let path = canonical(path);
            let contents = fs::read_to_string(&path).unwrap_or_default();
            let dir = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            if !dirs.contains(&dir) {
                watcher.watch(&dir, RecursiveMode::NonRecursive)?;
                tracing::debug!(dir = %dir.display(), "Watching source directory");
                dirs.push(dir);
            }
            watched.push(WatchedFile {
                kind,
                path,
                contents,
            });
        }

        Ok(Self {
            _watcher: watcher,
            paths: rx,
            files: watched,
        })
    }

    /// Wait for the next edit to a watched file.
    ///
    /// Notifications that leave a file's contents unchanged are skipped.
    /// Cancel safe: the only await point is the notification channel.
    pub async fn next_change(&mut self) -> Option<SourceChange> {
        loop {
            let path = canonical(self.paths.recv().await?);
            for file in self.files.iter_mut().filter(|file| file.path == path) {
                let Ok(contents) = fs::read_to_string(&file.path) else {
                    continue;
                };
                if contents != file.contents {
                    file.contents = contents.clone();
                    return Some(file.kind.change(contents));
                }
            }
        }
    }
}
