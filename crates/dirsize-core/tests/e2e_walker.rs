/// End-to-end walker tests against real temporary directory trees.
///
/// Expected values are computed from `symlink_metadata` of every entry, so
/// the assertions hold regardless of how the host filesystem sizes
/// directories.
use dirsize_core::scanner::{DirWalker, IoBudget, VolumeRule};
use dirsize_core::fs::LocalFs;
use dirsize_core::{DirectorySnapshot, ScanReconciler, SnapshotSink};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

// ── Helpers ──────────────────────────────────────────────────────────────────

/// ```text
/// home/
///   notes.txt      (100 bytes)
///   src/
///     main.rs      (200 bytes)
///     deep/
///       blob.bin   (300 bytes)
///   empty/
/// ```
fn build_home(root: &Path) {
    let deep = root.join("src").join("deep");
    fs::create_dir_all(&deep).unwrap();
    fs::create_dir_all(root.join("empty")).unwrap();
    write_bytes(&root.join("notes.txt"), 100);
    write_bytes(&root.join("src").join("main.rs"), 200);
    write_bytes(&deep.join("blob.bin"), 300);
}

fn write_bytes(path: &Path, n: usize) {
    let mut f = fs::File::create(path).unwrap();
    f.write_all(&vec![0u8; n]).unwrap();
}

/// Ground truth: (total size, entry count, oldest mtime, latest mtime),
/// with links measured unresolved.
fn expected_totals(root: &Path) -> (u64, u64, SystemTime, SystemTime) {
    let meta = fs::symlink_metadata(root).unwrap();
    let mtime = meta.modified().unwrap();
    let mut totals = (meta.len(), 1u64, mtime, mtime);

    for entry in fs::read_dir(root).unwrap() {
        let path = entry.unwrap().path();
        let meta = fs::symlink_metadata(&path).unwrap();
        if meta.is_dir() {
            let (size, count, oldest, latest) = expected_totals(&path);
            totals.0 += size;
            totals.1 += count;
            totals.2 = totals.2.min(oldest);
            totals.3 = totals.3.max(latest);
        } else {
            let m = meta.modified().unwrap();
            totals.0 += meta.len();
            totals.1 += 1;
            totals.2 = totals.2.min(m);
            totals.3 = totals.3.max(m);
        }
    }
    totals
}

#[derive(Default)]
struct SizeSink(BTreeMap<String, u64>);

impl SnapshotSink for SizeSink {
    fn publish(&mut self, name: &str, snapshot: DirectorySnapshot) {
        self.0.insert(name.to_owned(), snapshot.total_size_bytes);
    }

    fn retract(&mut self, name: &str) -> bool {
        self.0.remove(name).is_some()
    }
}

fn set_mtime(path: &Path, t: SystemTime) {
    fs::File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(t)
        .unwrap();
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[test]
fn measure_matches_ground_truth() {
    let tmp = TempDir::new().unwrap();
    let home = tmp.path().join("alice");
    build_home(&home);

    let snap = DirWalker::new(100_000).measure(&home).unwrap().unwrap();
    let (size, count, oldest, latest) = expected_totals(&home);

    assert_eq!(snap.name, "alice");
    assert_eq!(snap.total_size_bytes, size);
    assert!(snap.total_size_bytes >= 600);
    // alice, notes.txt, src, main.rs, deep, blob.bin, empty
    assert_eq!(snap.entry_count, 7);
    assert_eq!(snap.entry_count, count);
    assert_eq!(snap.oldest_modified, oldest);
    assert_eq!(snap.latest_modified, latest);
    assert!(snap.oldest_modified <= snap.latest_modified);
}

#[test]
fn mtime_bounds_track_file_timestamps() {
    let tmp = TempDir::new().unwrap();
    let home = tmp.path().join("bob");
    build_home(&home);

    let ancient = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000);
    set_mtime(&home.join("src").join("deep").join("blob.bin"), ancient);

    let snap = DirWalker::new(100_000).measure(&home).unwrap().unwrap();
    assert_eq!(snap.oldest_modified, ancient);
    assert_eq!(snap.latest_modified, expected_totals(&home).3);
}

#[test]
fn empty_directory_is_a_single_entry() {
    let tmp = TempDir::new().unwrap();
    let snap = DirWalker::new(100).measure(tmp.path()).unwrap().unwrap();
    assert_eq!(snap.entry_count, 1);
    assert_eq!(snap.total_size_bytes, fs::metadata(tmp.path()).unwrap().len());
}

#[test]
fn missing_directory_is_absent() {
    let tmp = TempDir::new().unwrap();
    let result = DirWalker::new(100).measure(&tmp.path().join("deleted")).unwrap();
    assert!(result.is_none());
}

#[cfg(unix)]
#[test]
fn symlinks_count_once_and_are_not_followed() {
    let tmp = TempDir::new().unwrap();
    let home = tmp.path().join("carol");
    build_home(&home);

    // A link to a large file outside the tree and a link to a directory
    // inside it. Neither target may be counted through the link.
    let outside = tmp.path().join("huge.bin");
    write_bytes(&outside, 1_000_000);
    std::os::unix::fs::symlink(&outside, home.join("huge-link")).unwrap();
    std::os::unix::fs::symlink(home.join("src"), home.join("src-link")).unwrap();

    let snap = DirWalker::new(100_000).measure(&home).unwrap().unwrap();
    let (size, count, _, _) = expected_totals(&home);

    assert_eq!(snap.total_size_bytes, size);
    assert_eq!(snap.entry_count, 9);
    assert_eq!(snap.entry_count, count);
    assert!(snap.total_size_bytes < 1_000_000);
}

#[test]
fn volume_reports_payload_size_under_its_own_name() {
    let tmp = TempDir::new().unwrap();
    let volume = tmp.path().join("tlon_sampel");
    let payload = volume.join("sampel");
    fs::create_dir_all(payload.join(".urb")).unwrap();
    write_bytes(&payload.join(".urb").join("log"), 2_000);
    write_bytes(&volume.join("wrapper-junk.bin"), 50_000);

    let mut walker = DirWalker::new(100_000);
    let direct = walker.measure(&payload).unwrap().unwrap();
    let (name, snap) = walker
        .measure_top_level_entry(tmp.path(), "tlon_sampel")
        .unwrap()
        .unwrap();

    assert_eq!(name, "tlon_sampel");
    assert_eq!(snap.name, "tlon_sampel");
    assert_eq!(snap.total_size_bytes, direct.total_size_bytes);
    assert_eq!(snap.entry_count, direct.entry_count);
    assert!(snap.total_size_bytes < 50_000);
}

#[test]
fn volume_without_payload_marker_is_measured_whole() {
    let tmp = TempDir::new().unwrap();
    let volume = tmp.path().join("tlon_bus");
    build_home(&volume);

    let mut walker = DirWalker::new(100_000);
    let whole = walker.measure(&volume).unwrap().unwrap();
    let (_, snap) = walker
        .measure_top_level_entry(tmp.path(), "tlon_bus")
        .unwrap()
        .unwrap();

    assert_eq!(snap.total_size_bytes, whole.total_size_bytes);
    assert_eq!(snap.entry_count, whole.entry_count);
}

#[test]
fn custom_volume_rule_redirects() {
    let tmp = TempDir::new().unwrap();
    let volume = tmp.path().join("pvc-1234");
    fs::create_dir_all(volume.join("data").join("PAYLOAD")).unwrap();
    write_bytes(&volume.join("outer.bin"), 10_000);

    let mut walker = DirWalker::with_parts(
        LocalFs,
        IoBudget::new(100_000),
        VolumeRule::new("pvc-", "PAYLOAD"),
    );
    let direct = walker.measure(&volume.join("data")).unwrap().unwrap();
    let (name, snap) = walker
        .measure_top_level_entry(tmp.path(), "pvc-1234")
        .unwrap()
        .unwrap();
    assert_eq!(name, "pvc-1234");
    assert_eq!(snap.total_size_bytes, direct.total_size_bytes);
}

#[test]
fn top_level_entries_lists_only_directories() {
    let tmp = TempDir::new().unwrap();
    build_home(&tmp.path().join("alice"));
    fs::create_dir(tmp.path().join("bob")).unwrap();
    write_bytes(&tmp.path().join("stray.txt"), 10);

    let mut walker = DirWalker::new(100_000);
    let entries: Vec<_> = walker
        .top_level_entries(tmp.path())
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    let names: Vec<&str> = entries.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["alice", "bob"]);
    assert_eq!(entries[0].1.entry_count, 7);
    assert_eq!(entries[1].1.entry_count, 1);
}

#[test]
fn tiny_budget_still_completes() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir(tmp.path().join("one")).unwrap();

    // root: stat + list + classify, one: stat + list = 5 ops; budget 1 means
    // at least one forced wait.
    let mut walker = DirWalker::new(1);
    let snap = walker.measure(tmp.path()).unwrap().unwrap();
    assert_eq!(snap.entry_count, 2);
    assert!(walker.budget().total_waited() > Duration::ZERO);
}

#[cfg(unix)]
#[test]
fn self_linked_top_level_entry_does_not_abort_the_cycle() {
    let tmp = TempDir::new().unwrap();
    build_home(&tmp.path().join("alice"));
    std::os::unix::fs::symlink("loop", tmp.path().join("loop")).unwrap();

    let mut sink = SizeSink::default();
    let summary = ScanReconciler::new()
        .run_cycle(&mut DirWalker::new(100_000), tmp.path(), &mut sink)
        .unwrap();

    assert_eq!(summary.published, vec!["alice"]);
    let (size, _, _, _) = expected_totals(&tmp.path().join("alice"));
    assert_eq!(sink.0.get("alice"), Some(&size));
    assert!(!sink.0.contains_key("loop"));
}

#[cfg(unix)]
#[test]
fn self_linked_children_inside_a_volume_fall_back_to_the_volume() {
    let tmp = TempDir::new().unwrap();
    let volume = tmp.path().join("tlon_zod");
    let inner = volume.join("zod");
    fs::create_dir_all(&inner).unwrap();
    write_bytes(&inner.join("pier.bin"), 700);
    write_bytes(&volume.join("outer.bin"), 3_000);
    // One loop where a payload candidate is expected, one where its
    // marker is expected.
    std::os::unix::fs::symlink("cyc", volume.join("cyc")).unwrap();
    std::os::unix::fs::symlink(".urb", inner.join(".urb")).unwrap();

    let mut walker = DirWalker::new(100_000);
    let whole = walker.measure(&volume).unwrap().unwrap();
    let (name, snap) = walker
        .measure_top_level_entry(tmp.path(), "tlon_zod")
        .unwrap()
        .unwrap();

    assert_eq!(name, "tlon_zod");
    assert_eq!(snap.total_size_bytes, whole.total_size_bytes);
    assert_eq!(snap.entry_count, whole.entry_count);
    assert!(snap.total_size_bytes > 3_000);
}
