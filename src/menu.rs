use crate::context::MenuContext;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SectionKey {
    Recents,
    Category(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconRef {
    /// User-provided icon file.
    Custom(PathBuf),
    /// Icon name or path from the application's desktop entry.
    Themed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub app_id: String,
    pub label: String,
    pub icon: Option<IconRef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuSection {
    pub key: SectionKey,
    pub title: String,
    pub icon: Option<PathBuf>,
    pub items: Vec<MenuItem>,
}

/// Snapshot of what the popup shows, rebuilt after every reload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuModel {
    pub sections: Vec<MenuSection>,
}

impl MenuModel {
    pub fn build(ctx: &MenuContext) -> Self {
        let registry = ctx.registry();
        let mut sections = Vec::new();

        if ctx.settings().show_recents {
            let items: Vec<MenuItem> = ctx
                .recents()
                .entries()
                .filter(|e| registry.is_installed(&e.id) && registry.should_show(&e.id))
                .map(|e| item(ctx, &e.id, ""))
                .collect();
            if !items.is_empty() {
                sections.push(MenuSection {
                    key: SectionKey::Recents,
                    title: "Recent".into(),
                    icon: None,
                    items,
                });
            }
        }

        for category in ctx.categories().ordered() {
            let items = category
                .apps
                .iter()
                .filter(|app| registry.is_installed(&app.id))
                .map(|app| item(ctx, &app.id, &app.name))
                .collect();
            sections.push(MenuSection {
                key: SectionKey::Category(category.name.clone()),
                title: category.name.clone(),
                icon: ctx.category_icons().path_for(&category.name),
                items,
            });
        }
        Self { sections }
    }

    pub fn section(&self, key: &SectionKey) -> Option<&MenuSection> {
        self.sections.iter().find(|s| &s.key == key)
    }

    pub fn item_keys(&self) -> HashSet<ItemKey> {
        self.sections
            .iter()
            .flat_map(|s| {
                s.items.iter().map(move |i| ItemKey {
                    section: s.key.clone(),
                    app_id: i.app_id.clone(),
                })
            })
            .collect()
    }
}

fn item(ctx: &MenuContext, id: &str, name_override: &str) -> MenuItem {
    let label = if name_override.is_empty() {
        ctx.registry()
            .display_name(id)
            .unwrap_or_else(|| id.to_string())
    } else {
        name_override.to_string()
    };
    let icon = ctx
        .app_icons()
        .path_for(id)
        .map(IconRef::Custom)
        .or_else(|| ctx.registry().icon(id).map(IconRef::Themed));
    MenuItem {
        app_id: id.to_string(),
        label,
        icon,
    }
}

/// Visible applications whose name or id contains `query`, ignoring case,
/// sorted by name.
pub fn search(ctx: &MenuContext, query: &str) -> Vec<MenuItem> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    let registry = ctx.registry();
    let mut apps: Vec<_> = registry
        .list()
        .into_iter()
        .filter(|app| registry.should_show(&app.id))
        .filter(|app| {
            app.name.to_lowercase().contains(&needle) || app.id.to_lowercase().contains(&needle)
        })
        .collect();
    apps.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.id.cmp(&b.id))
    });
    apps.iter().map(|app| item(ctx, &app.id, "")).collect()
}

/// Identifies one row of the rendered menu independently of the widget
/// showing it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemKey {
    pub section: SectionKey,
    pub app_id: String,
}

impl ItemKey {
    pub fn new(section: SectionKey, app_id: impl Into<String>) -> Self {
        Self {
            section,
            app_id: app_id.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowState {
    pub selected: bool,
    pub hovered: bool,
}

/// Transient per-row UI state kept beside the model rather than on the
/// rendered rows.
#[derive(Debug, Default)]
pub struct RowStates {
    rows: HashMap<ItemKey, RowState>,
}

impl RowStates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &ItemKey) -> RowState {
        self.rows.get(key).copied().unwrap_or_default()
    }

    /// Select `key`, clearing any other selection.
    pub fn select(&mut self, key: ItemKey) {
        for state in self.rows.values_mut() {
            state.selected = false;
        }
        self.rows.entry(key).or_default().selected = true;
    }

    pub fn selected(&self) -> Option<&ItemKey> {
        self.rows
            .iter()
            .find(|(_, state)| state.selected)
            .map(|(key, _)| key)
    }

    pub fn set_hovered(&mut self, key: ItemKey, hovered: bool) {
        self.rows.entry(key).or_default().hovered = hovered;
    }

    /// Forget rows that no longer exist in `model`.
    pub fn retain_model(&mut self, model: &MenuModel) {
        let live = model.item_keys();
        self.rows.retain(|key, _| live.contains(key));
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }
}
