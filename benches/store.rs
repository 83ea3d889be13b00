use criterion::{criterion_group, criterion_main, Criterion};
use panel_menu::icons::IconAssetIndex;
use panel_menu::menu::search;
use panel_menu::paths::DataPaths;
use panel_menu::registry::{AppInfo, AppRegistry};
use panel_menu::settings::Settings;
use panel_menu::store::{AppEntry, Category, CategoryStore, Direction};
use panel_menu::MenuContext;
use std::path::PathBuf;

struct StaticRegistry(Vec<AppInfo>);

impl AppRegistry for StaticRegistry {
    fn list(&self) -> Vec<AppInfo> {
        self.0.clone()
    }

    fn lookup(&self, id: &str) -> Option<AppInfo> {
        self.0.iter().find(|a| a.id == id).cloned()
    }

    fn launch(&self, _id: &str) -> anyhow::Result<()> {
        Ok(())
    }
}

fn apps(count: usize) -> Vec<AppInfo> {
    (0..count)
        .map(|i| AppInfo {
            id: format!("org.example.App{i}.desktop"),
            name: format!("Application {i}"),
            icon: None,
            exec: format!("app{i}"),
            terminal: false,
            no_display: i % 10 == 0,
            path: PathBuf::from(format!("/usr/share/applications/app{i}.desktop")),
        })
        .collect()
}

fn populated_store(dir: &std::path::Path, count: usize) -> CategoryStore {
    let mut store = CategoryStore::new(dir.join("categories.jsonl"));
    let mut icons = IconAssetIndex::scan(dir.join("icons"));
    for i in 0..count {
        let entries = (0..8)
            .map(|j| AppEntry::new(format!("org.example.App{}.desktop", i * 8 + j), ""))
            .collect();
        let category = Category::new(format!("Category {i}")).with_apps(entries);
        store
            .upsert(None, category, None, &mut icons)
            .expect("upsert");
    }
    store
}

fn bench_categories(c: &mut Criterion) {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut store = populated_store(dir.path(), 1_000);
    store.save().expect("save");

    c.bench_function("ordered_1k", |b| b.iter(|| store.ordered().len()));
    c.bench_function("reorder_1k", |b| {
        b.iter(|| {
            store.reorder("Category 500", Direction::Up);
            store.reorder("Category 500", Direction::Down);
        })
    });
    c.bench_function("load_1k", |b| b.iter(|| store.load()));
}

fn bench_search(c: &mut Criterion) {
    let dir = tempfile::tempdir().expect("tempdir");
    let ctx = MenuContext::open(
        DataPaths::new(dir.path()),
        Settings::default(),
        Box::new(StaticRegistry(apps(5_000))),
    )
    .expect("context");
    c.bench_function("search_5k", |b| b.iter(|| search(&ctx, "application 49")));
}

criterion_group!(benches, bench_categories, bench_search);
criterion_main!(benches);
