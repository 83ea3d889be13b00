use chrono::Local;
use std::fmt::Display;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// User-facing failure reports, appended to a log file the shell surfaces
/// as notifications.
#[derive(Debug, Clone)]
pub struct NoticeLog {
    path: PathBuf,
}

impl NoticeLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, msg: &str) {
        match OpenOptions::new().create(true).append(true).open(&self.path) {
            Ok(mut file) => {
                let _ = writeln!(file, "{} - {}", Local::now().to_rfc3339(), msg);
            }
            Err(e) => tracing::warn!(path = %self.path.display(), error = %e, "failed to write notice"),
        }
    }

    /// Log `err` and surface it with `action` as context.
    pub fn report(&self, action: &str, err: &dyn Display) {
        tracing::error!(error = %err, "{action} failed");
        self.append(&format!("{action} failed: {err}"));
    }
}
