/// Scan reconciliation — one full cycle over the parent directory.
///
/// Each cycle publishes a snapshot per measured subdirectory, then retracts
/// every name that was active last cycle but produced nothing this cycle.
/// The active set is replaced wholesale at the end of a completed cycle.
use crate::error::ScanResult;
use crate::fs::Filesystem;
use crate::model::size::{format_count, format_size};
use crate::model::DirectorySnapshot;
use crate::scanner::{Clock, DirWalker};
use compact_str::CompactString;
use std::collections::HashSet;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Receiver of measurement results, usually the metrics registry.
pub trait SnapshotSink {
    /// Publish (or overwrite) all series for `name`.
    fn publish(&mut self, name: &str, snapshot: DirectorySnapshot);

    /// Remove all series for `name`. Returns `false` if there were none;
    /// retracting an unknown name is not an error.
    fn retract(&mut self, name: &str) -> bool;
}

/// What one completed cycle did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleSummary {
    pub published: Vec<CompactString>,
    pub retracted: Vec<CompactString>,
    /// Directories that vanished or became unreadable before measurement.
    pub skipped: usize,
    pub total_size_bytes: u64,
    pub io_ops: u64,
    pub io_wait: Duration,
    pub elapsed: Duration,
}

#[derive(Debug, Default)]
pub struct ScanReconciler {
    active: HashSet<CompactString>,
}

impl ScanReconciler {
    /// Starts with no active names, so the first cycle never retracts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Names that produced a snapshot in the last completed cycle.
    pub fn active_names(&self) -> &HashSet<CompactString> {
        &self.active
    }

    /// `previous − current`, sorted.
    pub fn stale_names(&self, current: &HashSet<CompactString>) -> Vec<CompactString> {
        let mut stale: Vec<CompactString> = self.active.difference(current).cloned().collect();
        stale.sort();
        stale
    }

    /// Close a cycle: return the stale names and make `current` the active set.
    pub fn finish_cycle(&mut self, current: HashSet<CompactString>) -> Vec<CompactString> {
        let stale = self.stale_names(&current);
        self.active = current;
        stale
    }

    /// Measure every subdirectory of `parent`, publish the results to
    /// `sink`, and retract the series of names that disappeared.
    ///
    /// A fatal filesystem error aborts the cycle before any retraction and
    /// leaves the active set untouched.
    pub fn run_cycle<F, C, S>(
        &mut self,
        walker: &mut DirWalker<F, C>,
        parent: &Path,
        sink: &mut S,
    ) -> ScanResult<CycleSummary>
    where
        F: Filesystem,
        C: Clock,
        S: SnapshotSink + ?Sized,
    {
        let started = Instant::now();
        let mut summary = CycleSummary::default();
        let mut current: HashSet<CompactString> = HashSet::new();

        let mut entries = walker.top_level_entries(parent)?;
        for entry in entries.by_ref() {
            let (name, snapshot) = entry?;
            info!(
                "Updated values for {name} ({}, {} entries, {:?})",
                format_size(snapshot.total_size_bytes),
                format_count(snapshot.entry_count),
                snapshot.scan_duration,
            );
            summary.total_size_bytes += snapshot.total_size_bytes;
            sink.publish(&name, snapshot);
            summary.published.push(name.clone());
            current.insert(name);
        }
        summary.skipped = entries.skipped();
        drop(entries);

        for name in self.finish_cycle(current) {
            if sink.retract(&name) {
                info!("Cleaned up stale metrics for {name}");
            } else {
                debug!("No series to retract for {name}");
            }
            summary.retracted.push(name);
        }

        summary.io_ops = walker.budget().total_ops();
        summary.io_wait = walker.budget().total_waited();
        summary.elapsed = started.elapsed();
        Ok(summary)
    }
}
