use panel_menu::icons::IconAssetIndex;
use std::fs;
use tempfile::tempdir;

mod common;
use common::write_icon;

#[test]
fn copy_creates_directory_and_registers() {
    let dir = tempdir().unwrap();
    let source = write_icon(&dir.path().join("picked"), "logo.PNG");
    let icon_dir = dir.path().join("icons").join("apps");
    let mut index = IconAssetIndex::scan(&icon_dir);
    assert!(index.is_empty());

    let target = index.copy_and_register("org.example.App.desktop", &source).unwrap();
    assert_eq!(target, icon_dir.join("org.example.App.desktop.png"));
    assert_eq!(index.extension("org.example.App.desktop"), Some("png"));
    assert_eq!(fs::read(&target).unwrap(), b"logo.PNG");
    assert!(source.exists());
}

#[test]
fn copy_replaces_asset_with_other_extension() {
    let dir = tempdir().unwrap();
    let icon_dir = dir.path().join("icons");
    write_icon(&icon_dir, "Work.png");
    let source = write_icon(&dir.path().join("picked"), "new.svg");
    let mut index = IconAssetIndex::scan(&icon_dir);

    index.copy_and_register("Work", &source).unwrap();
    assert_eq!(index.extension("Work"), Some("svg"));
    assert!(!icon_dir.join("Work.png").exists());
    assert_eq!(index.len(), 1);
}

#[test]
fn copy_overwrites_same_extension() {
    let dir = tempdir().unwrap();
    let icon_dir = dir.path().join("icons");
    write_icon(&icon_dir, "Work.png");
    let source = write_icon(&dir.path().join("picked"), "other.png");
    let mut index = IconAssetIndex::scan(&icon_dir);

    index.copy_and_register("Work", &source).unwrap();
    assert_eq!(fs::read(icon_dir.join("Work.png")).unwrap(), b"other.png");
}

#[test]
fn remove_without_entry_is_reported_not_fatal() {
    let dir = tempdir().unwrap();
    let mut index = IconAssetIndex::scan(dir.path());
    assert!(!index.remove("Nothing").unwrap());
}

#[test]
fn remove_deletes_file_and_entry() {
    let dir = tempdir().unwrap();
    write_icon(dir.path(), "Games.webp");
    let mut index = IconAssetIndex::scan(dir.path());
    assert!(index.remove("Games").unwrap());
    assert!(!index.contains("Games"));
    assert!(!dir.path().join("Games.webp").exists());
}

#[test]
fn rename_moves_the_asset() {
    let dir = tempdir().unwrap();
    write_icon(dir.path(), "Old.ico");
    let mut index = IconAssetIndex::scan(dir.path());

    assert!(index.rename("Old", "New").unwrap());
    assert_eq!(index.extension("New"), Some("ico"));
    assert!(!index.contains("Old"));
    assert!(!index.rename("Missing", "Other").unwrap());
}

#[test]
fn index_follows_external_changes_after_refresh() {
    let dir = tempdir().unwrap();
    let mut index = IconAssetIndex::scan(dir.path());
    write_icon(dir.path(), "Late.bmp");
    assert!(!index.contains("Late"));
    index.refresh();
    assert_eq!(index.path_for("Late"), Some(dir.path().join("Late.bmp")));
}

#[test]
fn replace_installs_new_source_and_drops_old_name() {
    let dir = tempdir().unwrap();
    let icon_dir = dir.path().join("icons");
    write_icon(&icon_dir, "Work.png");
    let source = write_icon(&dir.path().join("picked"), "office.svg");
    let mut index = IconAssetIndex::scan(&icon_dir);

    let target = index.replace("Work", "Office", &source).unwrap();
    assert_eq!(target, icon_dir.join("Office.svg"));
    assert!(!index.contains("Work"));
    assert!(!icon_dir.join("Work.png").exists());
    assert_eq!(fs::read(&target).unwrap(), b"office.svg");
}

#[test]
fn replace_with_bad_source_touches_nothing() {
    let dir = tempdir().unwrap();
    let icon_dir = dir.path().join("icons");
    write_icon(&icon_dir, "Work.png");
    let mut index = IconAssetIndex::scan(&icon_dir);

    assert!(index
        .replace("Work", "Office", &dir.path().join("missing.png"))
        .is_err());
    assert_eq!(index.extension("Work"), Some("png"));
    assert!(!index.contains("Office"));
    assert_eq!(fs::read_dir(&icon_dir).unwrap().count(), 1);
}
