use std::fs;
use std::os::unix::fs::{symlink, MetadataExt, PermissionsExt};
use std::path::Path;

use toolbox_fs::*;

fn assert_epoch(path: &Path) {
    let meta = fs::symlink_metadata(path).unwrap();
    assert_eq!(meta.atime(), 0, "atime of {}", path.display());
    assert_eq!(meta.mtime(), 0, "mtime of {}", path.display());
}

#[test]
fn test_reset_tree_timestamps() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("tree");
    fs::create_dir_all(root.join("usr/lib")).unwrap();
    fs::write(root.join("usr/lib/libfoo.so"), b"elf").unwrap();
    fs::write(root.join("README"), b"hi").unwrap();

    let count = reset_tree_timestamps(&root).unwrap();

    assert_eq!(count, 5);
    for path in ["", "usr", "usr/lib", "usr/lib/libfoo.so", "README"] {
        assert_epoch(&root.join(path));
    }
}

#[test]
fn test_reset_tree_does_not_follow_symlinks() {
    let dir = tempfile::tempdir().unwrap();
    let outside = dir.path().join("outside");
    fs::write(&outside, b"keep").unwrap();
    let before = fs::metadata(&outside).unwrap().mtime();

    let root = dir.path().join("tree");
    fs::create_dir(&root).unwrap();
    symlink(&outside, root.join("link")).unwrap();

    let count = reset_tree_timestamps(&root).unwrap();

    assert_eq!(count, 2);
    assert_epoch(&root.join("link"));
    assert_eq!(fs::metadata(&outside).unwrap().mtime(), before);
    assert_ne!(before, 0);
}

#[test]
fn test_reset_tree_on_single_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("file");
    fs::write(&file, b"x").unwrap();

    assert_eq!(reset_tree_timestamps(&file).unwrap(), 1);
    assert_epoch(&file);
}

#[test]
fn test_reset_tree_missing_root() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing");

    let err = reset_tree_timestamps(&missing).unwrap_err();

    assert!(matches!(err, Error::OperationFailed { .. }));
    assert!(err.to_string().contains("missing"));
}

#[test]
fn test_reset_through_symlink_updates_target() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("target");
    fs::write(&target, b"x").unwrap();
    let link = dir.path().join("link");
    symlink(&target, &link).unwrap();

    reset_file_timestamp(&link).unwrap();

    let meta = fs::metadata(&target).unwrap();
    assert_eq!(meta.atime(), 0);
    assert_eq!(meta.mtime(), 0);
}

/// Check if running as root
fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

#[test]
fn test_reset_tree_unreadable_directory() {
    // Root can list any directory
    if is_root() {
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("tree");
    let locked = root.join("locked");
    fs::create_dir_all(&locked).unwrap();
    fs::write(locked.join("file"), b"x").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    let result = reset_tree_timestamps(&root);

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    let err = result.unwrap_err();
    assert!(matches!(err, Error::OperationFailed { .. }));
    assert_eq!(err.raw_os_error(), Some(libc::EACCES));
    assert!(err.to_string().contains(&locked.display().to_string()));
    assert_eq!(err.to_string().matches("Permission denied").count(), 1);
}
