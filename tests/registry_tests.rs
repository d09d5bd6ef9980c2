// registry_tests.rs - レジストリ公開APIの結合テスト

use filereg::{ErrorCategory, FileKind, FileRegistry, RegistryConfig, WriteMode};
use std::fs;
use tempfile::{tempdir, TempDir};

fn registry_in(dir: &TempDir) -> FileRegistry {
    FileRegistry::with_config(RegistryConfig::default().with_base_dir(dir.path()))
}

#[test]
fn test_write_read_delete_scenario() {
    let temp_dir = tempdir().unwrap();
    let mut registry = registry_in(&temp_dir);

    registry.new_file("a.txt").unwrap();
    let index = registry.position_by_name("a.txt").unwrap().unwrap();

    registry
        .write(index, "Hello world!\n", WriteMode::Truncate)
        .unwrap()
        .write(index, "Hello world!\n", WriteMode::Append)
        .unwrap();

    let lines = registry.read(index).unwrap();
    assert_eq!(lines, ["Hello world!\n", "Hello world!\n"]);

    let path = registry.path(index).unwrap().to_path_buf();
    registry.delete_file(index).unwrap();

    assert!(!registry.is_occupied(index));
    assert!(registry.get(index).is_err());
    assert!(!path.exists());
}

#[test]
fn test_create_then_find_returns_same_name() {
    let temp_dir = tempdir().unwrap();
    let mut registry = registry_in(&temp_dir);

    for name in ["notes.md", "data.csv", "x"] {
        registry.new_file(name).unwrap();
        let record = registry.find_by_name(name).unwrap().unwrap();
        assert_eq!(record.name(), name);
        assert_eq!(record.path(), temp_dir.path().join(name));
        assert_eq!(record.kind(), FileKind::Regular);
    }
    assert_eq!(registry.len(), 3);
}

#[test]
fn test_duplicate_name_leaves_size_unchanged() {
    let temp_dir = tempdir().unwrap();
    let mut registry = registry_in(&temp_dir);
    registry.new_file("fm_test.txt").unwrap();

    let before = (registry.len(), registry.slot_count());
    let err = registry.new_file("fm_test.txt").unwrap_err();
    assert_eq!(err.category(), ErrorCategory::NameConflict);
    assert_eq!((registry.len(), registry.slot_count()), before);
}

#[test]
fn test_existing_file_is_loaded_not_truncated() {
    let temp_dir = tempdir().unwrap();
    fs::write(temp_dir.path().join("keep.txt"), "line one\nline two\n").unwrap();

    let mut registry = registry_in(&temp_dir);
    registry.new_file("keep.txt").unwrap();

    assert_eq!(registry.size(0).unwrap(), 18);
    assert_eq!(registry.line_count(0).unwrap(), 2);
    assert_eq!(registry.char_count(0).unwrap(), 18);
    assert_eq!(registry.read(0).unwrap(), ["line one\n", "line two\n"]);
}

#[test]
fn test_appended_lines_round_trip_in_order() {
    let temp_dir = tempdir().unwrap();
    let mut registry = registry_in(&temp_dir);
    registry.new_file("log.txt").unwrap();

    let entries: Vec<String> = (0..25).map(|i| format!("entry {}\n", i)).collect();
    registry.write(0, &entries[0], WriteMode::Truncate).unwrap();
    for entry in &entries[1..] {
        registry.write(0, entry, WriteMode::Append).unwrap();
    }

    assert_eq!(registry.read(0).unwrap(), entries.as_slice());
}

#[test]
fn test_truncate_sets_exact_size() {
    let temp_dir = tempdir().unwrap();
    let mut registry = registry_in(&temp_dir);
    registry.new_file("t.txt").unwrap();
    registry.write(0, "0123456789abcdef", WriteMode::Truncate).unwrap();

    for length in [10u64, 3, 0, 32] {
        registry.truncate(0, length).unwrap();
        assert_eq!(registry.size(0).unwrap(), length);
        assert_eq!(fs::metadata(registry.path(0).unwrap()).unwrap().len(), length);
    }
}

#[test]
fn test_change_mode_updates_mode_string() {
    let temp_dir = tempdir().unwrap();
    let mut registry = registry_in(&temp_dir);
    registry.new_file("p.txt").unwrap();

    registry.change_mode(0, "0666").unwrap();
    assert_eq!(registry.mode_string(0).unwrap(), "rw-rw-rw-");

    registry.change_mode(0, "0640").unwrap();
    assert_eq!(registry.mode_string(0).unwrap(), "rw-r-----");

    let err = registry.change_mode(0, "rw-r").unwrap_err();
    assert_eq!(err.category(), ErrorCategory::InvalidArgument);
}

#[test]
fn test_rename_updates_name_and_path() {
    let temp_dir = tempdir().unwrap();
    let mut registry = registry_in(&temp_dir);
    registry.new_file("old.txt").unwrap();
    registry.write(0, "content\n", WriteMode::Truncate).unwrap();

    registry.rename(0, "new.txt").unwrap();

    assert_eq!(registry.name(0).unwrap(), "new.txt");
    assert_eq!(registry.path(0).unwrap(), temp_dir.path().join("new.txt"));
    assert!(registry.find_by_name("old.txt").unwrap().is_none());
    assert!(registry.find_by_name("new.txt").unwrap().is_some());
    assert!(!temp_dir.path().join("old.txt").exists());
    assert_eq!(fs::read_to_string(temp_dir.path().join("new.txt")).unwrap(), "content\n");
}

#[test]
fn test_copy_without_destination_twice() {
    let temp_dir = tempdir().unwrap();
    let mut registry = registry_in(&temp_dir);
    registry.new_file("fm_test.txt").unwrap();
    registry.write(0, "Hello world!\n", WriteMode::Truncate).unwrap();

    let first = registry.copy(0, None).unwrap();
    let second = registry.copy(0, None).unwrap();

    assert_ne!(first, second);
    assert!(first.to_string_lossy().ends_with("fm_test.txt_1"));
    assert!(second.to_string_lossy().ends_with("fm_test.txt_2"));
    assert_eq!(fs::read_to_string(&first).unwrap(), "Hello world!\n");
    assert_eq!(registry.get(0).unwrap().duplicate_count(), 2);
}

#[test]
fn test_copy_to_explicit_destination() {
    let temp_dir = tempdir().unwrap();
    let target_dir = tempdir().unwrap();
    let mut registry = registry_in(&temp_dir);
    registry.new_file("src.txt").unwrap();
    registry.write(0, "a\nb\n", WriteMode::Truncate).unwrap();

    let destination = target_dir.path().join("dst.txt");
    let copied = registry.copy(0, Some(destination.to_str().unwrap())).unwrap();

    assert_eq!(copied, destination);
    assert_eq!(fs::read_to_string(&destination).unwrap(), "a\nb\n");
    // 元のレコードはそのまま
    assert_eq!(registry.path(0).unwrap(), temp_dir.path().join("src.txt"));
}

#[test]
fn test_move_file() {
    let temp_dir = tempdir().unwrap();
    let target_dir = tempdir().unwrap();
    let mut registry = registry_in(&temp_dir);
    registry.new_file("fm_test.txt").unwrap();
    registry
        .write(0, "Hello world!\n", WriteMode::Truncate)
        .unwrap()
        .write(0, "Hello world!\n", WriteMode::Append)
        .unwrap();

    let destination = target_dir.path().join("fm_test2.txt");
    registry.move_file(0, destination.to_str().unwrap()).unwrap();

    assert_eq!(registry.name(0).unwrap(), "fm_test2.txt");
    assert_eq!(registry.path(0).unwrap(), destination);
    assert!(!temp_dir.path().join("fm_test.txt").exists());
    assert_eq!(registry.read(0).unwrap().len(), 2);

    // 移動先のファイルも削除で消える
    registry.delete_file(0).unwrap();
    assert!(!destination.exists());
}

#[test]
fn test_move_onto_registered_name_conflicts() {
    let temp_dir = tempdir().unwrap();
    let other_dir = tempdir().unwrap();
    let mut registry = registry_in(&temp_dir);
    registry.new_file("a.txt").unwrap().new_file("b.txt").unwrap();

    let destination = other_dir.path().join("b.txt");
    let err = registry.move_file(0, destination.to_str().unwrap()).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::NameConflict);
    assert!(temp_dir.path().join("a.txt").exists());
    assert!(!destination.exists());
}

#[test]
fn test_reload_picks_up_external_changes() {
    let temp_dir = tempdir().unwrap();
    let mut registry = registry_in(&temp_dir);
    registry.new_file("ext.txt").unwrap();

    fs::write(temp_dir.path().join("ext.txt"), "x\ny\nz").unwrap();
    assert_eq!(registry.line_count(0).unwrap(), 0);

    registry.reload(0).unwrap();
    assert_eq!(registry.line_count(0).unwrap(), 3);
    assert_eq!(registry.size(0).unwrap(), 5);
}

#[test]
fn test_read_uses_configured_line_length() {
    let temp_dir = tempdir().unwrap();
    let config = RegistryConfig::default()
        .with_base_dir(temp_dir.path())
        .with_max_line_length(5);
    let mut registry: FileRegistry = FileRegistry::with_config(config);
    registry.new_file("wide.txt").unwrap();
    registry.write(0, "abcdefgh\nij\n", WriteMode::Truncate).unwrap();

    // 行数は2なので、長い行が分割されると2スロットで打ち切られる
    assert_eq!(registry.read(0).unwrap(), ["abcd", "efgh"]);
    assert_eq!(registry.read_with(0, 1024).unwrap(), ["abcdefgh\n", "ij\n"]);
}

#[test]
fn test_iter_and_destroy() {
    let temp_dir = tempdir().unwrap();
    let mut registry: FileRegistry<String> =
        FileRegistry::with_config(RegistryConfig::default().with_base_dir(temp_dir.path()));
    registry.set_user_data(Some("owner".to_string()));
    registry
        .new_file("one.txt")
        .unwrap()
        .new_file("two.txt")
        .unwrap()
        .new_file("three.txt")
        .unwrap();
    registry.delete_file(1).unwrap();

    let listed: Vec<(usize, String)> = registry
        .iter()
        .map(|(index, record)| (index, record.name().to_string()))
        .collect();
    assert_eq!(listed, vec![(0, "one.txt".to_string()), (2, "three.txt".to_string())]);
    assert_eq!(registry.user_data().map(String::as_str), Some("owner"));

    registry.destroy().unwrap();
    assert!(fs::read_dir(temp_dir.path()).unwrap().next().is_none());
}

#[test]
fn test_empty_file_cannot_be_read() {
    let temp_dir = tempdir().unwrap();
    let mut registry = registry_in(&temp_dir);
    registry.new_file("empty.txt").unwrap();

    let err = registry.read(0).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::InvalidArgument);
}
