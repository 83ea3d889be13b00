use crate::settings::SETTINGS_FILE;
use crate::store::{CATEGORIES_FILE, RECENTS_FILE};
use anyhow::{anyhow, Context};
use std::path::{Path, PathBuf};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "PANEL_MENU_DATA_DIR";

pub const NOTICES_FILE: &str = "notices.log";

/// Locations of every persisted file, all under one data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    root: PathBuf,
}

impl DataPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Pick the data directory: `explicit`, then `$PANEL_MENU_DATA_DIR`,
    /// then `<user data dir>/panel-menu`.
    pub fn resolve(explicit: Option<PathBuf>) -> anyhow::Result<Self> {
        if let Some(root) = explicit {
            return Ok(Self::new(root));
        }
        if let Some(root) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self::new(root));
        }
        dirs_next::data_dir()
            .map(|d| Self::new(d.join("panel-menu")))
            .ok_or_else(|| anyhow!("no data directory available; set {DATA_DIR_ENV}"))
    }

    /// Create the data directory and both icon directories.
    pub fn ensure(&self) -> anyhow::Result<()> {
        for dir in [self.root.clone(), self.category_icons(), self.app_icons()] {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn categories(&self) -> PathBuf {
        self.root.join(CATEGORIES_FILE)
    }

    pub fn recents(&self) -> PathBuf {
        self.root.join(RECENTS_FILE)
    }

    pub fn settings(&self) -> PathBuf {
        self.root.join(SETTINGS_FILE)
    }

    pub fn notices(&self) -> PathBuf {
        self.root.join(NOTICES_FILE)
    }

    pub fn category_icons(&self) -> PathBuf {
        self.root.join("icons").join("categories")
    }

    pub fn app_icons(&self) -> PathBuf {
        self.root.join("icons").join("apps")
    }
}
