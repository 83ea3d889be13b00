#![allow(dead_code)]

use panel_menu::paths::DataPaths;
use panel_menu::registry::{AppInfo, AppRegistry};
use panel_menu::settings::Settings;
use panel_menu::MenuContext;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// In-memory application registry for tests.
#[derive(Clone, Default)]
pub struct MemoryRegistry {
    pub apps: Vec<AppInfo>,
    pub launched: Rc<RefCell<Vec<String>>>,
}

impl MemoryRegistry {
    pub fn with(ids: &[&str]) -> Self {
        let mut reg = Self::default();
        for id in ids {
            reg.add(id, &title(id), false);
        }
        reg
    }

    pub fn add(&mut self, id: &str, name: &str, no_display: bool) {
        self.apps.push(AppInfo {
            id: id.to_string(),
            name: name.to_string(),
            icon: Some(format!("{}-icon", name.to_lowercase())),
            exec: format!("/usr/bin/{}", name.to_lowercase()),
            terminal: false,
            no_display,
            path: PathBuf::from(format!("/usr/share/applications/{id}")),
        });
    }
}

/// `"files.desktop"` -> `"Files"`.
fn title(id: &str) -> String {
    let stem = id.trim_end_matches(".desktop");
    let mut chars = stem.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl AppRegistry for MemoryRegistry {
    fn list(&self) -> Vec<AppInfo> {
        self.apps.clone()
    }

    fn lookup(&self, id: &str) -> Option<AppInfo> {
        self.apps.iter().find(|a| a.id == id).cloned()
    }

    fn launch(&self, id: &str) -> anyhow::Result<()> {
        if self.lookup(id).is_none() {
            anyhow::bail!("unknown application {id}");
        }
        self.launched.borrow_mut().push(id.to_string());
        Ok(())
    }
}

pub fn open_context(root: &Path, registry: MemoryRegistry) -> MenuContext {
    MenuContext::open(DataPaths::new(root), Settings::default(), Box::new(registry))
        .expect("open context")
}

pub fn write_icon(dir: &Path, file: &str) -> PathBuf {
    std::fs::create_dir_all(dir).expect("create icon dir");
    let path = dir.join(file);
    std::fs::write(&path, file.as_bytes()).expect("write icon");
    path
}
