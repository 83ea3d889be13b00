use crate::error::StoreError;
use crate::icons::IconAssetIndex;
use crate::notice::NoticeLog;
use crate::paths::DataPaths;
use crate::registry::AppRegistry;
use crate::settings::Settings;
use crate::store::{Category, CategoryStore, Direction, Fingerprint, LoadReport, RecentsStore};
use std::path::Path;

/// Everything one surface (the preferences editor or the running popup)
/// needs, built once at startup and dropped on shutdown.
pub struct MenuContext {
    paths: DataPaths,
    settings: Settings,
    categories: CategoryStore,
    recents: RecentsStore,
    category_icons: IconAssetIndex,
    app_icons: IconAssetIndex,
    registry: Box<dyn AppRegistry>,
    notices: NoticeLog,
}

impl MenuContext {
    /// Load every store under `paths`, dropping app entries for
    /// applications that are no longer installed.
    pub fn open(
        paths: DataPaths,
        settings: Settings,
        registry: Box<dyn AppRegistry>,
    ) -> anyhow::Result<Self> {
        paths.ensure()?;
        let (categories, category_report) = CategoryStore::open(paths.categories());
        let (recents, recents_report) =
            RecentsStore::open(paths.recents(), settings.recents_limit());
        let mut ctx = Self {
            category_icons: IconAssetIndex::scan(paths.category_icons()),
            app_icons: IconAssetIndex::scan(paths.app_icons()),
            notices: NoticeLog::new(paths.notices()),
            paths,
            settings,
            categories,
            recents,
            registry,
        };
        ctx.log_load("categories", &category_report);
        ctx.log_load("recents", &recents_report);
        ctx.prune_uninstalled();
        Ok(ctx)
    }

    pub fn paths(&self) -> &DataPaths {
        &self.paths
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn categories(&self) -> &CategoryStore {
        &self.categories
    }

    pub fn recents(&self) -> &RecentsStore {
        &self.recents
    }

    pub fn category_icons(&self) -> &IconAssetIndex {
        &self.category_icons
    }

    pub fn app_icons(&self) -> &IconAssetIndex {
        &self.app_icons
    }

    pub fn registry(&self) -> &dyn AppRegistry {
        self.registry.as_ref()
    }

    pub fn notices(&self) -> &NoticeLog {
        &self.notices
    }

    /// Re-read the category file and both icon directories.
    pub fn reload(&mut self) -> LoadReport {
        let report = self.categories.load();
        self.category_icons.refresh();
        self.app_icons.refresh();
        self.log_load("categories", &report);
        self.prune_uninstalled();
        report
    }

    /// Re-scan installed applications and drop entries that disappeared.
    pub fn refresh_registry(&mut self) -> anyhow::Result<()> {
        self.registry.refresh()?;
        self.prune_uninstalled();
        Ok(())
    }

    /// Drop category entries and recents of uninstalled applications and
    /// persist whatever changed. Skipped while the registry lists nothing,
    /// so a broken application scan cannot wipe the user's data.
    pub fn prune_uninstalled(&mut self) -> bool {
        if self.registry.list().is_empty() {
            tracing::debug!("registry is empty, not pruning");
            return false;
        }
        let registry = self.registry.as_ref();
        let categories_changed = self
            .categories
            .prune_uninstalled(|id| registry.is_installed(id));
        let recents_changed = self.recents.retain(|id| registry.is_installed(id));

        // Failures are reported by save_categories; memory stays pruned.
        if categories_changed && self.save_categories().is_err() {
            tracing::debug!("pruned categories kept in memory only");
        }
        if recents_changed {
            if let Err(e) = self.recents.save() {
                self.notices.report("saving recents", &e);
            }
        }
        categories_changed || recents_changed
    }

    /// Persist the categories, reporting a failure to the user. The
    /// in-memory state stays as it is either way.
    pub fn save_categories(&mut self) -> Result<Fingerprint, StoreError> {
        self.categories.save().map_err(|e| {
            self.notices.report("saving categories", &e);
            e
        })
    }

    pub fn add_category(&mut self, name: &str, icon: Option<&Path>) -> Result<(), StoreError> {
        self.update_category(None, Category::new(name), icon)
    }

    /// Insert or replace a category, renaming it when `original` differs
    /// from the new name.
    pub fn update_category(
        &mut self,
        original: Option<&str>,
        category: Category,
        icon: Option<&Path>,
    ) -> Result<(), StoreError> {
        let result = self
            .categories
            .upsert(original, category, icon, &mut self.category_icons);
        self.commit("updating category", result)
    }

    pub fn remove_category(&mut self, name: &str) -> Result<Category, StoreError> {
        let result = self.categories.remove(name, &mut self.category_icons);
        self.commit("removing category", result)
    }

    pub fn move_category(&mut self, name: &str, direction: Direction) -> Result<bool, StoreError> {
        if !self.categories.reorder(name, direction) {
            return Ok(false);
        }
        self.save_categories()?;
        Ok(true)
    }

    pub fn assign_app(&mut self, category: &str, id: &str, name: &str) -> Result<bool, StoreError> {
        let result = self.categories.add_app(category, id, name);
        self.commit("adding application", result)
    }

    pub fn unassign_app(&mut self, category: &str, id: &str) -> Result<bool, StoreError> {
        let result = self.categories.remove_app(category, id);
        self.commit("removing application", result)
    }

    pub fn move_app(
        &mut self,
        category: &str,
        id: &str,
        direction: Direction,
    ) -> Result<bool, StoreError> {
        let result = self.categories.reorder_app(category, id, direction);
        self.commit("moving application", result)
    }

    pub fn set_app_icon(&mut self, id: &str, source: &Path) -> Result<(), StoreError> {
        self.app_icons
            .copy_and_register(id, source)
            .map(|_| ())
            .map_err(|e| {
                self.notices.report("setting application icon", &e);
                e
            })
    }

    pub fn clear_app_icon(&mut self, id: &str) -> Result<bool, StoreError> {
        self.app_icons.remove(id).map_err(|e| {
            self.notices.report("removing application icon", &e);
            e
        })
    }

    /// Launch `id` and record it in the recents list.
    pub fn launch(&mut self, id: &str) -> anyhow::Result<()> {
        self.registry.launch(id)?;
        self.recents.bump(id);
        if let Err(e) = self.recents.save() {
            self.notices.report("saving recents", &e);
        }
        Ok(())
    }

    /// Persist after a successful mutation, or report the failure.
    fn commit<T>(&mut self, action: &str, result: Result<T, StoreError>) -> Result<T, StoreError> {
        match result {
            Ok(value) => {
                self.save_categories()?;
                Ok(value)
            }
            Err(e) => {
                self.notices.report(action, &e);
                Err(e)
            }
        }
    }

    fn log_load(&self, what: &str, report: &LoadReport) {
        if !report.is_clean() {
            tracing::warn!(store = what, lines = ?report.skipped, "skipped malformed lines");
        }
    }
}
