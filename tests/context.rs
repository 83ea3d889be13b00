use panel_menu::paths::DataPaths;
use panel_menu::settings::Settings;
use panel_menu::store::Direction;
use panel_menu::MenuContext;
use std::fs;
use tempfile::tempdir;

mod common;
use common::{open_context, MemoryRegistry};

const STALE: &str = "{\"name\":\"Work\",\"rank\":1,\"apps\":[\
{\"id\":\"files.desktop\",\"name\":\"\",\"rank\":1},\
{\"id\":\"gone.desktop\",\"name\":\"Gone\",\"rank\":2}]}\n";

#[test]
fn open_prunes_uninstalled_apps_and_saves() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("categories.jsonl"), STALE).unwrap();

    let ctx = open_context(dir.path(), MemoryRegistry::with(&["files.desktop"]));
    let work = ctx.categories().get("Work").unwrap();
    assert_eq!(work.apps.len(), 1);
    assert_eq!(work.apps[0].rank, 1);
    let on_disk = fs::read_to_string(dir.path().join("categories.jsonl")).unwrap();
    assert!(!on_disk.contains("gone.desktop"));
}

#[test]
fn empty_registry_does_not_prune() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("categories.jsonl"), STALE).unwrap();

    let ctx = open_context(dir.path(), MemoryRegistry::default());
    assert_eq!(ctx.categories().get("Work").unwrap().apps.len(), 2);
    assert_eq!(
        fs::read_to_string(dir.path().join("categories.jsonl")).unwrap(),
        STALE
    );
}

#[test]
fn open_creates_data_layout() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("nested").join("data");
    let ctx = open_context(&root, MemoryRegistry::default());
    assert!(ctx.paths().category_icons().is_dir());
    assert!(ctx.paths().app_icons().is_dir());
    assert!(ctx.categories().is_empty());
}

#[test]
fn launch_records_recent_and_persists() {
    let dir = tempdir().unwrap();
    let registry = MemoryRegistry::with(&["files.desktop"]);
    let launched = registry.launched.clone();
    let mut ctx = open_context(dir.path(), registry);

    ctx.launch("files.desktop").unwrap();
    assert_eq!(*launched.borrow(), ["files.desktop"]);
    assert_eq!(ctx.recents().ids(), ["files.desktop"]);
    let on_disk = fs::read_to_string(dir.path().join("recents.jsonl")).unwrap();
    assert!(on_disk.contains("\"id\":\"files.desktop\""));

    assert!(ctx.launch("missing.desktop").is_err());
    assert_eq!(ctx.recents().len(), 1);
}

#[test]
fn settings_limit_applies_to_recents() {
    let dir = tempdir().unwrap();
    let settings = Settings {
        recents_limit: 2,
        ..Settings::default()
    };
    let registry = MemoryRegistry::with(&["a.desktop", "b.desktop", "c.desktop"]);
    let mut ctx =
        MenuContext::open(DataPaths::new(dir.path()), settings, Box::new(registry)).unwrap();
    for id in ["a.desktop", "b.desktop", "c.desktop"] {
        ctx.launch(id).unwrap();
    }
    assert_eq!(ctx.recents().ids(), ["c.desktop", "b.desktop"]);
}

#[test]
fn failed_save_is_reported_in_notices() {
    let dir = tempdir().unwrap();
    // A directory where the category file should be makes every save fail.
    fs::create_dir_all(dir.path().join("categories.jsonl").join("blocked")).unwrap();
    let mut ctx = open_context(dir.path(), MemoryRegistry::with(&["files.desktop"]));

    assert!(ctx.add_category("Work", None).is_err());
    assert!(ctx.categories().contains("Work"));
    let notices = fs::read_to_string(ctx.notices().path()).unwrap();
    assert!(notices.contains("saving categories failed"));
}

#[test]
fn failed_edit_is_reported_in_notices() {
    let dir = tempdir().unwrap();
    let mut ctx = open_context(dir.path(), MemoryRegistry::with(&["files.desktop"]));

    assert!(ctx.remove_category("Nope").is_err());
    assert!(ctx.assign_app("Nope", "files.desktop", "").is_err());
    let notices = fs::read_to_string(ctx.notices().path()).unwrap();
    assert_eq!(notices.lines().count(), 2);
    assert!(notices.lines().next().unwrap().contains("removing category failed"));
}

#[test]
fn editor_operations_persist() {
    let dir = tempdir().unwrap();
    let mut ctx = open_context(dir.path(), MemoryRegistry::with(&["files.desktop"]));
    ctx.add_category("Work", None).unwrap();
    ctx.add_category("Play", None).unwrap();
    assert!(ctx.move_category("Play", Direction::Up).unwrap());
    assert!(!ctx.move_category("Play", Direction::Up).unwrap());
    ctx.assign_app("Work", "files.desktop", "My Files").unwrap();

    let reopened = open_context(dir.path(), MemoryRegistry::with(&["files.desktop"]));
    let names: Vec<&str> = reopened
        .categories()
        .ordered()
        .into_iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(names, ["Play", "Work"]);
    assert_eq!(
        reopened.categories().get("Work").unwrap().apps[0].name,
        "My Files"
    );
}

#[test]
fn edit_after_corrupt_line_keeps_other_categories_on_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("categories.jsonl");
    let mut bytes = b"{\"name\":\"Work\",\"rank\":1,\"apps\":[]}\n".to_vec();
    bytes.extend_from_slice(b"\xff\xfe\n");
    bytes.extend_from_slice(b"{\"name\":\"Play\",\"rank\":2,\"apps\":[]}\n");
    fs::write(&path, bytes).unwrap();

    let mut ctx = open_context(dir.path(), MemoryRegistry::with(&["files.desktop"]));
    ctx.add_category("New", None).unwrap();

    let (reloaded, report) = panel_menu::store::CategoryStore::open(&path);
    assert!(report.is_clean());
    let names: Vec<&str> = reloaded
        .ordered()
        .into_iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(names, ["Work", "Play", "New"]);
}

#[test]
fn open_prunes_recents_of_uninstalled_apps() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("recents.jsonl"),
        "{\"id\":\"gone.desktop\",\"ts\":2}\n{\"id\":\"files.desktop\",\"ts\":1}\n",
    )
    .unwrap();

    let ctx = open_context(dir.path(), MemoryRegistry::with(&["files.desktop"]));
    assert_eq!(ctx.recents().ids(), ["files.desktop"]);
    let on_disk = fs::read_to_string(dir.path().join("recents.jsonl")).unwrap();
    assert!(!on_disk.contains("gone.desktop"));
}

#[test]
fn empty_registry_keeps_recents() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("recents.jsonl"),
        "{\"id\":\"gone.desktop\",\"ts\":2}\n",
    )
    .unwrap();

    let ctx = open_context(dir.path(), MemoryRegistry::default());
    assert_eq!(ctx.recents().ids(), ["gone.desktop"]);
}
