/// The aggregated result of measuring one directory subtree.
///
/// A snapshot is built bottom-up: every directory starts from its own
/// metadata and folds in each live child as it is measured. Totals only
/// ever grow during folding, a child is never re-read once it has
/// contributed.
use compact_str::CompactString;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, PartialEq)]
pub struct DirectorySnapshot {
    /// Basename of the measured entity.
    ///
    /// For redirected volume directories this is the outer directory's
    /// name, not the payload directory that was actually walked.
    pub name: CompactString,

    /// Directory metadata size plus every file, link and subdirectory
    /// below it. Symbolic links contribute their own size only.
    pub total_size_bytes: u64,

    /// Newest modification time across the directory and its descendants.
    pub latest_modified: SystemTime,

    /// Oldest modification time across the directory and its descendants.
    pub oldest_modified: SystemTime,

    /// The directory itself plus every descendant file, link and directory.
    /// Always at least 1.
    pub entry_count: u64,

    /// Wall-clock time spent producing this snapshot.
    pub scan_duration: Duration,
}

impl DirectorySnapshot {
    /// Start an aggregate from the directory's own metadata.
    pub fn new_dir(name: CompactString, own_size: u64, modified: SystemTime) -> Self {
        Self {
            name,
            total_size_bytes: own_size,
            latest_modified: modified,
            oldest_modified: modified,
            entry_count: 1,
            scan_duration: Duration::ZERO,
        }
    }

    /// Fold a single file-like entry (regular file or unresolved link).
    pub fn add_file(&mut self, size: u64, modified: SystemTime) {
        self.total_size_bytes += size;
        self.entry_count += 1;
        self.widen_times(modified, modified);
    }

    /// Fold a fully measured child directory.
    pub fn add_subtree(&mut self, child: &DirectorySnapshot) {
        self.total_size_bytes += child.total_size_bytes;
        self.entry_count += child.entry_count;
        self.widen_times(child.oldest_modified, child.latest_modified);
    }

    fn widen_times(&mut self, oldest: SystemTime, latest: SystemTime) {
        if latest > self.latest_modified {
            self.latest_modified = latest;
        }
        if oldest < self.oldest_modified {
            self.oldest_modified = oldest;
        }
    }
}

/// Convert a timestamp to fractional seconds since the unix epoch.
///
/// Timestamps before the epoch come back negative rather than failing.
pub fn unix_seconds(t: SystemTime) -> f64 {
    match t.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs_f64(),
        Err(e) => -e.duration().as_secs_f64(),
    }
}
