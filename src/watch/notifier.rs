use crate::error::StoreError;
use notify::event::ModifyKind;
use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

/// Coarse classification of a filesystem change event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// A file appeared, including one renamed into place.
    Created,
    /// File contents changed.
    Content,
    Removed,
    /// Permissions, timestamps and other metadata only.
    Attribute,
    Other,
}

impl ChangeKind {
    pub fn from_event_kind(kind: &EventKind) -> Self {
        match kind {
            EventKind::Create(_) => ChangeKind::Created,
            EventKind::Modify(ModifyKind::Metadata(_)) => ChangeKind::Attribute,
            EventKind::Modify(ModifyKind::Name(_)) => ChangeKind::Created,
            EventKind::Modify(_) => ChangeKind::Content,
            EventKind::Remove(_) => ChangeKind::Removed,
            EventKind::Access(_) | EventKind::Any | EventKind::Other => ChangeKind::Other,
        }
    }

    /// Whether a watched store file should be reloaded after this event.
    pub fn touches_content(self) -> bool {
        matches!(self, ChangeKind::Created | ChangeKind::Content)
    }

    /// Whether a watched directory listing changed.
    pub fn touches_listing(self) -> bool {
        matches!(
            self,
            ChangeKind::Created | ChangeKind::Content | ChangeKind::Removed
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    File,
    Directory,
}

impl Scope {
    fn accepts(self, kind: ChangeKind) -> bool {
        match self {
            Scope::File => kind.touches_content(),
            Scope::Directory => kind.touches_listing(),
        }
    }
}

/// Delivers qualifying change events for a store file or a set of
/// directories to the thread that owns it.
///
/// Events arrive on an internal channel; the owner drains them from its own
/// loop. After [`close`](Self::close) nothing is delivered any more.
pub struct FileChangeNotifier {
    watcher: Option<RecommendedWatcher>,
    rx: Receiver<ChangeKind>,
    open: bool,
    live: bool,
    watched: Vec<PathBuf>,
}

impl FileChangeNotifier {
    /// Watch a single file. The parent directory is watched instead of the
    /// file itself so replacing the file by rename keeps being observed.
    pub fn watch_file(path: &Path) -> Result<Self, StoreError> {
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file_name = path.file_name().map(|n| n.to_os_string());
        let (tx, rx) = channel();
        let mut watcher = build_watcher(tx, Scope::File, file_name).map_err(|source| {
            StoreError::WatchSetup {
                path: path.to_path_buf(),
                source,
            }
        })?;
        watcher
            .watch(&parent, RecursiveMode::NonRecursive)
            .map_err(|source| StoreError::WatchSetup {
                path: parent.clone(),
                source,
            })?;
        tracing::debug!(path = %path.display(), "watching store file");
        Ok(Self {
            watcher: Some(watcher),
            rx,
            open: true,
            live: true,
            watched: vec![path.to_path_buf()],
        })
    }

    /// Watch directories recursively. Directories that cannot be watched
    /// are skipped; it is an error only when none can.
    pub fn watch_dirs(dirs: &[PathBuf]) -> Result<Self, StoreError> {
        let (tx, rx) = channel();
        let first = dirs.first().cloned().unwrap_or_default();
        let mut watcher = build_watcher(tx, Scope::Directory, None).map_err(|source| {
            StoreError::WatchSetup {
                path: first.clone(),
                source,
            }
        })?;
        let mut watched = Vec::new();
        let mut last_error = None;
        for dir in dirs {
            match watcher.watch(dir, RecursiveMode::Recursive) {
                Ok(()) => watched.push(dir.clone()),
                Err(e) => {
                    tracing::debug!(dir = %dir.display(), error = %e, "skipping unwatchable directory");
                    last_error = Some((dir.clone(), e));
                }
            }
        }
        if watched.is_empty() {
            let (path, source) = last_error.unwrap_or_else(|| {
                (first, notify::Error::generic("no directories to watch"))
            });
            return Err(StoreError::WatchSetup { path, source });
        }
        Ok(Self {
            watcher: Some(watcher),
            rx,
            open: true,
            live: true,
            watched,
        })
    }

    /// A notifier fed by the caller instead of the filesystem, for hosts
    /// that bring their own change-notification primitive.
    pub fn manual() -> (Sender<ChangeKind>, Self) {
        let (tx, rx) = channel();
        (
            tx,
            Self {
                watcher: None,
                rx,
                open: true,
                live: true,
                watched: Vec::new(),
            },
        )
    }

    /// A notifier that never reports anything, used when watching failed.
    pub fn detached() -> Self {
        let (_, rx) = channel();
        Self {
            watcher: None,
            rx,
            open: true,
            live: false,
            watched: Vec::new(),
        }
    }

    /// Whether events can still arrive.
    pub fn is_live(&self) -> bool {
        self.open && self.live
    }

    pub fn watched(&self) -> &[PathBuf] {
        &self.watched
    }

    /// Take every pending event without blocking.
    pub fn drain(&self) -> Vec<ChangeKind> {
        let events: Vec<ChangeKind> = self.rx.try_iter().collect();
        if self.open {
            events
        } else {
            Vec::new()
        }
    }

    /// Block for up to `timeout` waiting for the next event.
    pub fn wait(&self, timeout: Duration) -> Option<ChangeKind> {
        if !self.is_live() {
            std::thread::sleep(timeout);
            return None;
        }
        match self.rx.recv_timeout(timeout) {
            Ok(kind) => Some(kind),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                std::thread::sleep(timeout);
                None
            }
        }
    }

    /// Stop watching. Safe to call repeatedly.
    pub fn close(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        self.watcher = None;
        let dropped = self.rx.try_iter().count();
        tracing::debug!(watched = ?self.watched, dropped, "closed change notifier");
    }
}

impl Drop for FileChangeNotifier {
    fn drop(&mut self) {
        self.close();
    }
}

fn build_watcher(
    tx: Sender<ChangeKind>,
    scope: Scope,
    file_name: Option<OsString>,
) -> notify::Result<RecommendedWatcher> {
    RecommendedWatcher::new(
        move |res: notify::Result<notify::Event>| match res {
            Ok(ev) => {
                if let Some(name) = &file_name {
                    let ours = ev
                        .paths
                        .iter()
                        .any(|p| p.file_name() == Some(name.as_os_str()));
                    if !ours {
                        return;
                    }
                }
                let kind = ChangeKind::from_event_kind(&ev.kind);
                if scope.accepts(kind) {
                    let _ = tx.send(kind);
                }
            }
            Err(e) => tracing::error!("watch error: {:?}", e),
        },
        Config::default(),
    )
}
