use crate::store::MAX_RECENTS;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Settings {
    /// When enabled the logger is initialised at debug level and honours
    /// `RUST_LOG`.
    #[serde(default)]
    pub debug_logging: bool,
    /// Optional file receiving log output instead of stderr.
    #[serde(default)]
    pub log_file: Option<String>,
    /// Number of launched applications remembered. Clamped to
    /// `1..=MAX_RECENTS`.
    #[serde(default = "default_recents_limit")]
    pub recents_limit: usize,
    /// Quiet period in milliseconds before an external edit is reloaded.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Show the recents section at the top of the menu.
    #[serde(default = "default_show_recents")]
    pub show_recents: bool,
    /// Directories scanned for `.desktop` files. If `None`, the XDG data
    /// directories are used.
    #[serde(default)]
    pub application_dirs: Option<Vec<String>>,
}

fn default_recents_limit() -> usize {
    MAX_RECENTS
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_show_recents() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug_logging: false,
            log_file: None,
            recents_limit: default_recents_limit(),
            debounce_ms: default_debounce_ms(),
            show_recents: default_show_recents(),
            application_dirs: None,
        }
    }
}

impl Settings {
    /// Load settings from `path`. A missing or empty file gives the
    /// defaults; malformed JSON is an error.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let settings: Settings = serde_json::from_str(&content)?;
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn recents_limit(&self) -> usize {
        self.recents_limit.clamp(1, MAX_RECENTS)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
