use dupsweep::duplicates::{DuplicateFinder, DuplicateIndex, FinderConfig};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn finder(workers: usize) -> DuplicateFinder {
    DuplicateFinder::new(FinderConfig::default().with_worker_count(workers))
}

/// Every bucket as a sorted list of paths, the whole set sorted.
fn groupings(index: &DuplicateIndex) -> BTreeSet<Vec<PathBuf>> {
    index
        .buckets()
        .map(|(_, files)| {
            let mut paths: Vec<PathBuf> = files.iter().map(|f| f.path.clone()).collect();
            paths.sort();
            paths
        })
        .collect()
}

fn write(root: &Path, rel: &str, content: &[u8]) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();

    let (index, summary) = finder(4).find_duplicates(dir.path()).unwrap();

    assert!(index.is_empty());
    assert_eq!(summary.files_discovered, 0);
    assert_eq!(summary.duplicate_groups, 0);
}

#[test]
fn test_identical_content_shares_one_digest_across_directories() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "x/a.bin", b"payload");
    let b = write(dir.path(), "y/z/b.bin", b"payload");
    let c = write(dir.path(), "c.bin", b"payload");
    write(dir.path(), "other.bin", b"different");

    let (index, summary) = finder(8).find_duplicates(dir.path()).unwrap();

    assert_eq!(summary.files_discovered, 4);
    assert_eq!(summary.duplicate_groups, 1);

    let (_, files) = index.duplicate_buckets().next().unwrap();
    let mut paths: Vec<_> = files.iter().map(|f| f.path.clone()).collect();
    paths.sort();
    let mut expected = vec![a, b, c];
    expected.sort();
    assert_eq!(paths, expected);
}

#[test]
fn test_unique_files_never_share_a_bucket() {
    let dir = tempdir().unwrap();
    for i in 0..20 {
        write(dir.path(), &format!("f{i}.txt"), format!("unique {i}").as_bytes());
    }

    let (index, summary) = finder(4).find_duplicates(dir.path()).unwrap();

    assert_eq!(summary.digest_buckets, 20);
    assert!(index.buckets().all(|(_, files)| files.len() == 1));
    assert_eq!(index.duplicate_buckets().count(), 0);
}

#[test]
fn test_single_file_bucket() {
    let dir = tempdir().unwrap();
    let c = write(dir.path(), "c.txt", b"Y");

    let (index, _) = finder(2).find_duplicates(dir.path()).unwrap();

    assert_eq!(index.len(), 1);
    let (_, files) = index.buckets().next().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].path, c);
}

#[test]
fn test_worker_count_does_not_change_groupings() {
    let dir = tempdir().unwrap();
    for i in 0..120 {
        let content = format!("content-{}", i % 7);
        write(dir.path(), &format!("d{}/f{i}.dat", i % 5), content.as_bytes());
    }

    let (single, single_summary) = finder(1).find_duplicates(dir.path()).unwrap();
    let (many, many_summary) = finder(64).find_duplicates(dir.path()).unwrap();

    assert_eq!(groupings(&single), groupings(&many));
    assert_eq!(single_summary.duplicate_groups, 7);
    assert_eq!(many_summary.duplicate_groups, 7);
    assert_eq!(single.record_count(), 120);
    assert_eq!(many.record_count(), 120);
}

#[test]
fn test_more_workers_than_files() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a", b"1");
    write(dir.path(), "b", b"1");

    let (index, summary) = finder(128).find_duplicates(dir.path()).unwrap();

    assert_eq!(summary.files_digested, 2);
    assert_eq!(index.duplicate_buckets().count(), 1);
}

#[test]
fn test_empty_files_are_duplicates_of_each_other() {
    let dir = tempdir().unwrap();
    write(dir.path(), "empty1", b"");
    write(dir.path(), "empty2", b"");

    let (_, summary) = finder(2).find_duplicates(dir.path()).unwrap();

    assert_eq!(summary.duplicate_groups, 1);
    assert_eq!(summary.reclaimable_space, 0);
}

#[test]
fn test_every_record_carries_its_bucket_digest() {
    let dir = tempdir().unwrap();
    for i in 0..30 {
        write(dir.path(), &format!("f{i}"), format!("{}", i % 3).as_bytes());
    }

    let (index, _) = finder(16).find_duplicates(dir.path()).unwrap();

    for (digest, files) in index.buckets() {
        assert_eq!(digest.len(), 64);
        assert!(files.iter().all(|f| f.digest.as_deref() == Some(digest)));
    }
    assert_eq!(index.record_count(), 30);
}
