use crate::error::StoreError;
use std::collections::HashMap;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Image file extensions accepted as custom icons.
pub const ICON_EXTENSIONS: &[&str] = &["jpeg", "jpg", "png", "bmp", "webp", "ico", "svg"];

/// Lower-cased icon extension of `path`, `None` when it has none or the
/// extension is not an accepted image type.
pub fn icon_extension(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    ICON_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Index of the custom icons stored in one directory, mapping a logical
/// name (category name or application id) to the extension of its
/// `<name>.<ext>` file.
///
/// The index is re-scanned after every copy, rename and delete so it never
/// disagrees with the directory within a session.
#[derive(Debug, Clone)]
pub struct IconAssetIndex {
    dir: PathBuf,
    entries: HashMap<String, String>,
}

impl IconAssetIndex {
    /// Scan `dir` once and build the index. A missing directory yields an
    /// empty index.
    pub fn scan(dir: impl Into<PathBuf>) -> Self {
        let mut index = Self {
            dir: dir.into(),
            entries: HashMap::new(),
        };
        index.refresh();
        index
    }

    pub fn refresh(&mut self) {
        self.entries = scan_dir(&self.dir);
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn extension(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn path_for(&self, name: &str) -> Option<PathBuf> {
        self.extension(name)
            .map(|ext| self.dir.join(format!("{name}.{ext}")))
    }

    /// Copy `source` into the directory as `<name>.<ext>`, replacing any
    /// existing asset for `name` including ones with a different extension.
    pub fn copy_and_register(&mut self, name: &str, source: &Path) -> Result<PathBuf, StoreError> {
        check_logical_name(name, &self.dir)?;
        let ext = icon_extension(source)
            .ok_or_else(|| StoreError::UnsupportedAsset(source.to_path_buf()))?;
        fs::create_dir_all(&self.dir).map_err(|e| StoreError::asset(&self.dir, e))?;
        let target = self.dir.join(format!("{name}.{ext}"));

        // Stage the copy first: `source` may itself be one of the stale
        // assets removed below.
        let mut staged =
            tempfile::NamedTempFile::new_in(&self.dir).map_err(|e| StoreError::asset(&target, e))?;
        let mut input = fs::File::open(source).map_err(|e| StoreError::asset(source, e))?;
        io::copy(&mut input, &mut staged).map_err(|e| StoreError::asset(&target, e))?;

        for stale in ICON_EXTENSIONS.iter().filter(|e| **e != ext) {
            let path = self.dir.join(format!("{name}.{stale}"));
            match fs::remove_file(&path) {
                Ok(()) => tracing::debug!(path = %path.display(), "removed stale icon"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(StoreError::asset(path, e)),
            }
        }
        staged
            .persist(&target)
            .map_err(|e| StoreError::asset(&target, e.error))?;
        self.refresh();
        tracing::info!(name, path = %target.display(), "registered icon");
        Ok(target)
    }

    /// Delete the asset registered for `name`. Returns `false` when there was
    /// nothing to delete.
    pub fn remove(&mut self, name: &str) -> Result<bool, StoreError> {
        let Some(path) = self.path_for(name) else {
            tracing::debug!(name, dir = %self.dir.display(), "no icon to remove");
            return Ok(false);
        };
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(StoreError::asset(path, e)),
        }
        self.refresh();
        Ok(true)
    }

    /// Move the asset of `old` to `new`. Returns `false` when `old` has no
    /// asset.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<bool, StoreError> {
        let Some(source) = self.path_for(old) else {
            return Ok(false);
        };
        if old != new {
            self.replace(old, new, &source)?;
        }
        Ok(true)
    }

    /// Register `source` as the asset of `new` and delete the asset of
    /// `old`. If `old` cannot be deleted the copy is removed again and the
    /// error returned.
    pub fn replace(&mut self, old: &str, new: &str, source: &Path) -> Result<PathBuf, StoreError> {
        let target = self.copy_and_register(new, source)?;
        if old == new {
            return Ok(target);
        }
        if let Err(e) = self.remove(old) {
            if let Err(undo) = self.remove(new) {
                tracing::warn!(name = new, error = %undo, "failed to roll back icon copy");
            }
            return Err(e);
        }
        Ok(target)
    }
}

fn check_logical_name(name: &str, dir: &Path) -> Result<(), StoreError> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\']);
    if invalid {
        return Err(StoreError::asset(
            dir.join(name),
            io::Error::new(ErrorKind::InvalidInput, "invalid icon name"),
        ));
    }
    Ok(())
}

fn scan_dir(dir: &Path) -> HashMap<String, String> {
    let mut entries = HashMap::new();
    if !dir.is_dir() {
        return entries;
    }
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name();
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "failed to read icon entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(file_name) = entry.file_name().to_str() else {
            continue;
        };
        let Some((name, ext)) = file_name.rsplit_once('.') else {
            continue;
        };
        let ext = ext.to_ascii_lowercase();
        if name.is_empty() || !ICON_EXTENSIONS.contains(&ext.as_str()) {
            continue;
        }
        entries.entry(name.to_string()).or_insert(ext);
    }
    entries
}
