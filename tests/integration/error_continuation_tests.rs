use dupsweep::actions::{resolve, ActionMode, DeleteMethod};
use dupsweep::duplicates::{DuplicateFinder, FinderConfig, FinderError};
use dupsweep::scanner::{FileRecord, ScanError};
use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tempfile::tempdir;

fn record(path: &Path, secs: u64) -> FileRecord {
    let size = fs::metadata(path).map(|m| m.len()).unwrap_or(5);
    FileRecord::new(
        path.to_path_buf(),
        size,
        SystemTime::UNIX_EPOCH + Duration::from_secs(secs),
    )
}

#[test]
fn test_open_failure_is_excluded_and_never_deleted() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a");
    let b = dir.path().join("b");
    fs::write(&a, b"same!").unwrap();
    fs::write(&b, b"same!").unwrap();
    // newest of the three, but never readable
    let vanished = dir.path().join("vanished");

    let records = vec![record(&a, 100), record(&b, 200), record(&vanished, 300)];
    let (index, summary) = DuplicateFinder::new(FinderConfig::default().with_worker_count(3))
        .find_duplicates_from_records(records)
        .unwrap();

    assert_eq!(summary.files_skipped, 1);
    assert!(index
        .buckets()
        .all(|(_, files)| files.iter().all(|f| f.path != vanished)));

    let report = resolve(index, ActionMode::Apply(DeleteMethod::Permanent));
    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.outcomes[0].path, b);
    assert!(a.exists());
}

#[cfg(unix)]
#[test]
fn test_read_failure_is_excluded() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a");
    let b = dir.path().join("b");
    fs::write(&a, b"same!").unwrap();
    fs::write(&b, b"same!").unwrap();
    // a directory opens fine on unix but fails on read
    let not_a_file = dir.path().join("subdir");
    fs::create_dir(&not_a_file).unwrap();

    let records = vec![record(&a, 100), record(&b, 200), record(&not_a_file, 300)];
    let (index, summary) = DuplicateFinder::new(FinderConfig::default().with_worker_count(2))
        .find_duplicates_from_records(records)
        .unwrap();

    assert_eq!(summary.files_skipped, 1);
    assert_eq!(index.record_count(), 2);

    let report = resolve(index, ActionMode::Apply(DeleteMethod::Permanent));
    assert!(report.outcomes.iter().all(|o| o.path != not_a_file));
    assert!(not_a_file.is_dir());
}

#[test]
fn test_size_mismatch_still_grouped() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a");
    let b = dir.path().join("b");
    fs::write(&a, b"grown content").unwrap();
    fs::write(&b, b"grown content").unwrap();

    // declared sizes are stale
    let records = vec![
        FileRecord::new(a, 1, SystemTime::UNIX_EPOCH),
        FileRecord::new(b, 2, SystemTime::UNIX_EPOCH + Duration::from_secs(1)),
    ];
    let (_, summary) = DuplicateFinder::new(FinderConfig::default().with_worker_count(2))
        .find_duplicates_from_records(records)
        .unwrap();

    assert_eq!(summary.size_mismatches, 2);
    assert_eq!(summary.duplicate_groups, 1);
}

#[test]
fn test_missing_root_is_fatal() {
    let result = DuplicateFinder::with_defaults()
        .find_duplicates(Path::new("/non/existent/path/that/really/should/not/exist"));

    match result {
        Err(FinderError::PathNotFound(path)) => {
            assert!(path.to_string_lossy().contains("really/should/not/exist"));
        }
        other => panic!("Expected PathNotFound error, got {:?}", other.map(|(_, s)| s)),
    }
}

#[test]
fn test_failed_deletion_does_not_block_later_groups() {
    let dir = tempdir().unwrap();
    let mut records = Vec::new();
    for (name, secs) in [("a_old", 100), ("a_new", 200), ("b_old", 100), ("b_new", 200)] {
        let path = dir.path().join(name);
        fs::write(&path, &name[..1]).unwrap();
        records.push(record(&path, secs));
    }

    let (index, _) = DuplicateFinder::new(FinderConfig::default().with_worker_count(2))
        .find_duplicates_from_records(records)
        .unwrap();
    // remove a candidate behind the pass's back
    fs::remove_file(dir.path().join("a_new")).unwrap();

    let report = resolve(index, ActionMode::Apply(DeleteMethod::Permanent));

    assert_eq!(report.failure_count(), 1);
    assert_eq!(report.deleted_count(), 1);
    assert!(!dir.path().join("b_new").exists());
    assert!(dir.path().join("a_old").exists());
    assert!(dir.path().join("b_old").exists());
}

/// Make `path` unlistable. Returns false, with permissions restored, when
/// the current user can read it anyway (root).
#[cfg(unix)]
fn lock_dir(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o000)).unwrap();
    if fs::read_dir(path).is_ok() {
        unlock_dir(path);
        return false;
    }
    true
}

#[cfg(unix)]
fn unlock_dir(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

#[cfg(unix)]
#[test]
fn test_unreadable_root_is_fatal() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("root");
    fs::create_dir(&root).unwrap();
    fs::write(root.join("a.txt"), "X").unwrap();
    fs::write(root.join("b.txt"), "X").unwrap();
    if !lock_dir(&root) {
        return;
    }

    let result = DuplicateFinder::with_defaults().find_duplicates(&root);
    unlock_dir(&root);

    match result {
        Err(FinderError::ScanError(ScanError::PermissionDenied(path))) => assert_eq!(path, root),
        other => panic!("Expected PermissionDenied, got {:?}", other.map(|(_, s)| s)),
    }
    assert!(root.join("a.txt").exists());
    assert!(root.join("b.txt").exists());
}

#[cfg(unix)]
#[test]
fn test_unreadable_subdirectory_is_skipped() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "X").unwrap();
    fs::write(dir.path().join("b.txt"), "X").unwrap();
    let locked = dir.path().join("locked");
    fs::create_dir(&locked).unwrap();
    fs::write(locked.join("c.txt"), "X").unwrap();
    if !lock_dir(&locked) {
        return;
    }

    let result = DuplicateFinder::new(FinderConfig::default().with_worker_count(4))
        .find_duplicates(dir.path());
    unlock_dir(&locked);

    let (index, summary) = result.unwrap();
    assert_eq!(summary.files_discovered, 2);
    assert_eq!(summary.duplicate_groups, 1);
    assert!(index
        .buckets()
        .all(|(_, files)| files.iter().all(|f| !f.path.starts_with(&locked))));
}
