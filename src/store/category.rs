use crate::error::StoreError;
use crate::icons::IconAssetIndex;
use crate::store::jsonl::{read_jsonl, write_jsonl, Fingerprint, LoadReport};
use hashlink::LinkedHashMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CATEGORIES_FILE: &str = "categories.jsonl";

/// A reference to a launchable application inside one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppEntry {
    /// Desktop application identifier, e.g. `firefox.desktop`.
    pub id: String,
    /// Display name override. Empty means "use the registry name".
    #[serde(default)]
    pub name: String,
    /// 1-based position inside the owning category.
    #[serde(default)]
    pub rank: u32,
}

impl AppEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            rank: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    /// Display order among ranked categories. `None` marks special
    /// categories that sit outside the rank sequence.
    #[serde(default)]
    pub rank: Option<u32>,
    #[serde(default)]
    pub apps: Vec<AppEntry>,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rank: None,
            apps: Vec::new(),
        }
    }

    pub fn with_apps(mut self, apps: Vec<AppEntry>) -> Self {
        self.apps = apps;
        self.renumber_apps();
        self
    }

    pub fn app(&self, id: &str) -> Option<&AppEntry> {
        self.apps.iter().find(|a| a.id == id)
    }

    /// Assign ranks 1..M following the current list order.
    pub fn renumber_apps(&mut self) {
        for (idx, app) in self.apps.iter_mut().enumerate() {
            app.rank = idx as u32 + 1;
        }
    }

    /// Order entries by their stored rank (stable for ties), then renumber.
    fn normalize_apps(&mut self) {
        self.apps.sort_by_key(|a| a.rank);
        self.renumber_apps();
    }
}

/// Direction for moving a category or an app entry one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Ordered collection of categories backed by `categories.jsonl`.
///
/// Among categories with a rank, ranks are kept dense (1..N) by every
/// mutation; within each category app entry ranks are dense (1..M).
#[derive(Debug)]
pub struct CategoryStore {
    path: PathBuf,
    categories: LinkedHashMap<String, Category>,
    fingerprint: Option<Fingerprint>,
}

impl CategoryStore {
    /// Create an empty store bound to `path` without touching the disk.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            categories: LinkedHashMap::new(),
            fingerprint: None,
        }
    }

    pub fn open(path: impl Into<PathBuf>) -> (Self, LoadReport) {
        let mut store = Self::new(path);
        let report = store.load();
        (store, report)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fingerprint of the file contents last loaded or saved by this store.
    pub fn fingerprint(&self) -> Option<&Fingerprint> {
        self.fingerprint.as_ref()
    }

    /// Replace the in-memory map with the persisted one. Missing files give
    /// an empty store and malformed lines are skipped.
    pub fn load(&mut self) -> LoadReport {
        let read = read_jsonl::<Category>(&self.path);
        let mut map: LinkedHashMap<String, Category> = LinkedHashMap::new();
        for mut category in read.records {
            category.normalize_apps();
            if let Some(slot) = map.get_mut(&category.name) {
                tracing::warn!(name = %category.name, "duplicate category, keeping the last one");
                *slot = category;
            } else {
                map.insert(category.name.clone(), category);
            }
        }
        self.categories = map;
        self.normalize_ranks();
        self.fingerprint = read.fingerprint;
        tracing::debug!(
            path = %self.path.display(),
            categories = self.categories.len(),
            skipped = read.report.skipped.len(),
            "loaded categories"
        );
        read.report
    }

    /// Persist every category, one JSON line each, in map order.
    pub fn save(&mut self) -> Result<Fingerprint, StoreError> {
        let fingerprint = write_jsonl(&self.path, self.categories.values())?;
        self.fingerprint = Some(fingerprint.clone());
        Ok(fingerprint)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Category> {
        self.categories.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.categories.contains_key(name)
    }

    /// Categories in map (insertion) order.
    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.values()
    }

    /// Categories in display order: ranked ones by `(rank, name)`, then the
    /// unranked ones by name.
    pub fn ordered(&self) -> Vec<&Category> {
        let mut list: Vec<&Category> = self.categories.values().collect();
        list.sort_by(|a, b| match (a.rank, b.rank) {
            (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.name.cmp(&b.name)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.name.cmp(&b.name),
        });
        list
    }

    /// Insert `category` or replace the one stored under `original` (or under
    /// its own name when `original` is absent or unknown) keeping its
    /// position and rank.
    ///
    /// A new category is ranked after every existing one. When the name
    /// changes the icon follows it; when `icon` is given it becomes the
    /// category's icon. Renaming onto another category's name is rejected.
    /// Icon failures abort before the map is touched.
    pub fn upsert(
        &mut self,
        original: Option<&str>,
        mut category: Category,
        icon: Option<&Path>,
        icons: &mut IconAssetIndex,
    ) -> Result<(), StoreError> {
        let original = original
            .filter(|name| self.categories.contains_key(*name))
            .unwrap_or(category.name.as_str())
            .to_string();
        let existing_rank = self.categories.get(&original).map(|c| c.rank);
        let renamed = existing_rank.is_some() && original != category.name;
        if renamed && self.categories.contains_key(&category.name) {
            return Err(StoreError::DuplicateCategory(category.name));
        }

        match icon {
            Some(source) if renamed => {
                icons.replace(&original, &category.name, source)?;
            }
            Some(source) => {
                icons.copy_and_register(&category.name, source)?;
            }
            None if renamed => {
                icons.rename(&original, &category.name)?;
            }
            None => {}
        }

        category.renumber_apps();
        match existing_rank {
            None => {
                category.rank = Some(self.next_rank());
                tracing::info!(name = %category.name, rank = ?category.rank, "added category");
                self.categories.insert(category.name.clone(), category);
            }
            Some(rank) if !renamed => {
                category.rank = rank;
                if let Some(slot) = self.categories.get_mut(&original) {
                    *slot = category;
                }
            }
            Some(rank) => {
                category.rank = rank;
                tracing::info!(from = %original, to = %category.name, "renamed category");
                let mut replacement = Some(category);
                let previous = std::mem::take(&mut self.categories);
                self.categories = previous
                    .into_iter()
                    .map(|(name, current)| {
                        if name == original {
                            match replacement.take() {
                                Some(c) => (c.name.clone(), c),
                                None => (name, current),
                            }
                        } else {
                            (name, current)
                        }
                    })
                    .collect();
                self.normalize_ranks();
            }
        }
        Ok(())
    }

    /// Delete the named category and its icon, then close the gap it left in
    /// the rank sequence.
    pub fn remove(&mut self, name: &str, icons: &mut IconAssetIndex) -> Result<Category, StoreError> {
        if !self.categories.contains_key(name) {
            return Err(StoreError::UnknownCategory(name.to_string()));
        }
        icons.remove(name)?;
        let removed = self
            .categories
            .remove(name)
            .ok_or_else(|| StoreError::UnknownCategory(name.to_string()))?;
        self.normalize_ranks();
        tracing::info!(name, "removed category");
        Ok(removed)
    }

    /// Swap the rank of `name` with its neighbour in `direction`. Returns
    /// `false` (and changes nothing) at either end of the sequence or for an
    /// unranked or unknown category.
    pub fn reorder(&mut self, name: &str, direction: Direction) -> bool {
        self.normalize_ranks();
        let order = self.ranked_names();
        let Some(pos) = order.iter().position(|n| n == name) else {
            return false;
        };
        let neighbour = match direction {
            Direction::Up => pos.checked_sub(1),
            Direction::Down => (pos + 1 < order.len()).then_some(pos + 1),
        };
        let Some(neighbour) = neighbour else {
            return false;
        };
        let other = &order[neighbour];
        let (Some(a), Some(b)) = (
            self.categories.get(name).and_then(|c| c.rank),
            self.categories.get(other).and_then(|c| c.rank),
        ) else {
            return false;
        };
        if let Some(c) = self.categories.get_mut(name) {
            c.rank = Some(b);
        }
        if let Some(c) = self.categories.get_mut(other) {
            c.rank = Some(a);
        }
        true
    }

    /// Drop app entries whose id fails `is_installed` and renumber the
    /// survivors. Returns whether any category changed.
    pub fn prune_uninstalled(&mut self, is_installed: impl Fn(&str) -> bool) -> bool {
        let mut changed = false;
        for category in self.categories.values_mut() {
            let before = category.apps.clone();
            category.apps.retain(|app| is_installed(&app.id));
            category.renumber_apps();
            if category.apps != before {
                tracing::info!(
                    category = %category.name,
                    removed = before.len() - category.apps.len(),
                    "pruned uninstalled applications"
                );
                changed = true;
            }
        }
        changed
    }

    /// Append `id` to the category. Returns `false` if it is already there.
    pub fn add_app(&mut self, category: &str, id: &str, name: &str) -> Result<bool, StoreError> {
        let cat = self.category_mut(category)?;
        if cat.app(id).is_some() {
            return Ok(false);
        }
        cat.apps.push(AppEntry::new(id, name));
        cat.renumber_apps();
        Ok(true)
    }

    pub fn remove_app(&mut self, category: &str, id: &str) -> Result<bool, StoreError> {
        let cat = self.category_mut(category)?;
        let before = cat.apps.len();
        cat.apps.retain(|a| a.id != id);
        cat.renumber_apps();
        Ok(cat.apps.len() != before)
    }

    /// Move an app entry one step within its category.
    pub fn reorder_app(
        &mut self,
        category: &str,
        id: &str,
        direction: Direction,
    ) -> Result<bool, StoreError> {
        let cat = self.category_mut(category)?;
        let Some(pos) = cat.apps.iter().position(|a| a.id == id) else {
            return Ok(false);
        };
        let target = match direction {
            Direction::Up => pos.checked_sub(1),
            Direction::Down => (pos + 1 < cat.apps.len()).then_some(pos + 1),
        };
        let Some(target) = target else {
            return Ok(false);
        };
        cat.apps.swap(pos, target);
        cat.renumber_apps();
        Ok(true)
    }

    fn category_mut(&mut self, name: &str) -> Result<&mut Category, StoreError> {
        self.categories
            .get_mut(name)
            .ok_or_else(|| StoreError::UnknownCategory(name.to_string()))
    }

    fn next_rank(&self) -> u32 {
        self.categories
            .values()
            .filter_map(|c| c.rank)
            .max()
            .unwrap_or(0)
            + 1
    }

    fn ranked_names(&self) -> Vec<String> {
        self.ordered()
            .into_iter()
            .filter(|c| c.rank.is_some())
            .map(|c| c.name.clone())
            .collect()
    }

    /// Reassign ranks 1..N following `(rank, name)` order.
    fn normalize_ranks(&mut self) {
        for (idx, name) in self.ranked_names().into_iter().enumerate() {
            if let Some(c) = self.categories.get_mut(&name) {
                c.rank = Some(idx as u32 + 1);
            }
        }
    }
}
