use std::path::PathBuf;
use thiserror::Error;

/// Failures produced by the on-disk stores, the icon indexes and the file
/// watchers.
///
/// None of these are fatal: read and parse failures are recovered inside the
/// stores, write and asset failures are reported to the user while the
/// in-memory state stays authoritative, watch failures degrade to "no live
/// reload".
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed record on line {line} of {path}: {source}")]
    Parse {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("icon asset operation on {path} failed: {source}")]
    AssetIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported icon file {0}")]
    UnsupportedAsset(PathBuf),

    #[error("cannot watch {path}: {source}")]
    WatchSetup {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    #[error("no category named {0:?}")]
    UnknownCategory(String),

    #[error("a category named {0:?} already exists")]
    DuplicateCategory(String),
}

impl StoreError {
    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Write {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn asset(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::AssetIo {
            path: path.into(),
            source,
        }
    }
}
