use anyhow::{anyhow, Context};
use freedesktop_file_parser::{parse, EntryType};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use walkdir::WalkDir;

/// A launchable application known to the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppInfo {
    /// Desktop application identifier, e.g. `org.gnome.Nautilus.desktop`.
    pub id: String,
    pub name: String,
    /// Themed icon name or absolute icon path from the desktop entry.
    pub icon: Option<String>,
    pub exec: String,
    pub terminal: bool,
    pub no_display: bool,
    pub path: PathBuf,
}

/// Source of installed applications.
pub trait AppRegistry {
    /// Every launchable application, in a stable order.
    fn list(&self) -> Vec<AppInfo>;

    fn lookup(&self, id: &str) -> Option<AppInfo>;

    fn is_installed(&self, id: &str) -> bool {
        self.lookup(id).is_some()
    }

    /// Whether the application should appear in menus.
    fn should_show(&self, id: &str) -> bool {
        self.lookup(id).map_or(false, |app| !app.no_display)
    }

    fn display_name(&self, id: &str) -> Option<String> {
        self.lookup(id).map(|app| app.name)
    }

    fn icon(&self, id: &str) -> Option<String> {
        self.lookup(id).and_then(|app| app.icon)
    }

    fn launch(&self, id: &str) -> anyhow::Result<()>;

    /// Re-read the installed applications.
    fn refresh(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Directories whose changes should trigger [`refresh`](Self::refresh).
    fn watch_dirs(&self) -> Vec<PathBuf> {
        Vec::new()
    }
}

/// XDG `applications` directories in lookup priority order.
pub fn default_application_dirs() -> Vec<PathBuf> {
    let mut data_dirs = Vec::new();
    if let Some(home_data) = dirs_next::data_dir() {
        data_dirs.push(home_data);
    }
    match std::env::var("XDG_DATA_DIRS") {
        Ok(system_dirs) if !system_dirs.is_empty() => {
            data_dirs.extend(
                system_dirs
                    .split(':')
                    .filter(|d| !d.is_empty())
                    .map(PathBuf::from),
            );
        }
        _ => {
            data_dirs.push(PathBuf::from("/usr/local/share"));
            data_dirs.push(PathBuf::from("/usr/share"));
        }
    }
    data_dirs.into_iter().map(|d| d.join("applications")).collect()
}

/// Registry backed by `.desktop` files.
pub struct DesktopRegistry {
    dirs: Vec<PathBuf>,
    apps: BTreeMap<String, AppInfo>,
}

impl DesktopRegistry {
    /// Scan `dirs` (earlier directories win when ids collide).
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        let mut registry = Self {
            dirs,
            apps: BTreeMap::new(),
        };
        registry.rescan();
        registry
    }

    /// Use the configured directories, or the XDG defaults when `None`.
    pub fn from_settings(dirs: Option<&[String]>) -> Self {
        match dirs {
            Some(dirs) => Self::new(dirs.iter().map(PathBuf::from).collect()),
            None => Self::new(default_application_dirs()),
        }
    }

    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }

    fn rescan(&mut self) {
        let mut apps = BTreeMap::new();
        for dir in &self.dirs {
            if !dir.is_dir() {
                continue;
            }
            for entry in WalkDir::new(dir).follow_links(true) {
                let entry = match entry {
                    Ok(e) => e,
                    Err(e) => {
                        tracing::debug!(dir = %dir.display(), error = %e, "skipping unreadable entry");
                        continue;
                    }
                };
                if !entry.file_type().is_file() {
                    continue;
                }
                let Some(id) = desktop_id(dir, entry.path()) else {
                    continue;
                };
                if apps.contains_key(&id) {
                    continue;
                }
                match read_desktop_entry(&id, entry.path()) {
                    Ok(Some(app)) => {
                        apps.insert(id, app);
                    }
                    Ok(None) => {}
                    Err(e) => {
                        tracing::debug!(path = %entry.path().display(), error = %e, "ignoring desktop entry")
                    }
                }
            }
        }
        tracing::debug!(count = apps.len(), "scanned applications");
        self.apps = apps;
    }
}

impl AppRegistry for DesktopRegistry {
    fn list(&self) -> Vec<AppInfo> {
        self.apps.values().cloned().collect()
    }

    fn lookup(&self, id: &str) -> Option<AppInfo> {
        self.apps.get(id).cloned()
    }

    fn is_installed(&self, id: &str) -> bool {
        self.apps.contains_key(id)
    }

    fn launch(&self, id: &str) -> anyhow::Result<()> {
        let app = self
            .apps
            .get(id)
            .ok_or_else(|| anyhow!("unknown application {id}"))?;
        spawn_exec(&app.exec, app.terminal).with_context(|| format!("failed to launch {id}"))
    }

    fn refresh(&mut self) -> anyhow::Result<()> {
        self.rescan();
        Ok(())
    }

    fn watch_dirs(&self) -> Vec<PathBuf> {
        self.dirs.iter().filter(|d| d.is_dir()).cloned().collect()
    }
}

/// Desktop file id of `path` relative to `root`: sub-directory separators
/// become `-`.
fn desktop_id(root: &Path, path: &Path) -> Option<String> {
    if path.extension().and_then(|e| e.to_str()) != Some("desktop") {
        return None;
    }
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<&str> = rel
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;
    Some(parts.join("-"))
}

fn read_desktop_entry(id: &str, path: &Path) -> anyhow::Result<Option<AppInfo>> {
    let content = std::fs::read_to_string(path).context("failed to read desktop file")?;
    let desktop_file = parse(&content).context("failed to parse desktop file")?;
    let EntryType::Application(app) = &desktop_file.entry.entry_type else {
        return Ok(None);
    };
    Ok(Some(AppInfo {
        id: id.to_string(),
        name: desktop_file.entry.name.default.clone(),
        icon: desktop_file
            .entry
            .icon
            .as_ref()
            .map(|icon| icon.content.clone()),
        exec: app.exec.clone().unwrap_or_default(),
        terminal: app.terminal.unwrap_or(false),
        no_display: desktop_file.entry.no_display.unwrap_or(false),
        path: path.to_path_buf(),
    }))
}

/// Strip desktop-entry field codes from an Exec line. `%%` becomes `%`,
/// unknown codes are kept verbatim.
pub(crate) fn expand_field_codes(exec: &str) -> String {
    let mut out = String::with_capacity(exec.len());
    let mut chars = exec.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '%' {
            out.push(ch);
            continue;
        }
        match chars.peek().copied() {
            Some('%') => {
                out.push('%');
                chars.next();
            }
            Some('f' | 'F' | 'u' | 'U' | 'd' | 'D' | 'n' | 'N' | 'i' | 'c' | 'k' | 'v' | 'm') => {
                chars.next();
            }
            _ => out.push('%'),
        }
    }
    out
}

fn spawn_exec(exec: &str, terminal: bool) -> anyhow::Result<()> {
    let expanded = expand_field_codes(exec);
    let mut parts = shlex::split(&expanded)
        .ok_or_else(|| anyhow!("malformed Exec line: {exec}"))?
        .into_iter();
    let program = parts.next().ok_or_else(|| anyhow!("empty Exec line"))?;

    let mut cmd = if terminal {
        let term = std::env::var("TERMINAL").unwrap_or_else(|_| "xterm".into());
        let mut cmd = Command::new(term);
        cmd.arg("-e").arg(program);
        cmd
    } else {
        Command::new(program)
    };
    cmd.args(parts)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .context("failed to spawn process")?;
    Ok(())
}
