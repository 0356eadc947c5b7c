/// Budgeted recursive directory walker.
///
/// Every filesystem query goes through [`DirWalker::query`], which charges
/// it against the [`IoBudget`] and turns benign races (vanished entries,
/// stale NFS handles, permission denied) into "absent" results. Only
/// genuinely unexpected failures come back as [`ScanError`].
///
/// Symbolic links inside a tree are never followed: they count as one
/// entry and contribute their own size and mtime, so a link into the same
/// tree is not double counted.
use crate::error::{classify_io_error, FsOp, ScanError, ScanResult};
use crate::fs::{EntryKind, Filesystem, LocalFs};
use crate::model::DirectorySnapshot;
use crate::scanner::budget::{Clock, IoBudget, SystemClock};
use crate::scanner::volume::VolumeRule;
use compact_str::CompactString;
use std::ffi::{OsStr, OsString};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::debug;

pub struct DirWalker<F: Filesystem = LocalFs, C: Clock = SystemClock> {
    fs: F,
    budget: IoBudget<C>,
    volume_rule: VolumeRule,
}

impl DirWalker<LocalFs, SystemClock> {
    /// A walker over the local filesystem with the default volume rule.
    pub fn new(iops_budget: u64) -> Self {
        Self::with_parts(LocalFs, IoBudget::new(iops_budget), VolumeRule::default())
    }
}

impl<F: Filesystem, C: Clock> DirWalker<F, C> {
    pub fn with_parts(fs: F, budget: IoBudget<C>, volume_rule: VolumeRule) -> Self {
        Self {
            fs,
            budget,
            volume_rule,
        }
    }

    pub fn budget(&self) -> &IoBudget<C> {
        &self.budget
    }

    /// Run one charged filesystem query.
    ///
    /// `Ok(None)` means the entity is absent for this cycle: removed since
    /// it was listed, behind a stale handle, or unreadable.
    pub(crate) fn query<T>(
        &mut self,
        op: FsOp,
        path: &Path,
        f: impl FnOnce(&F, &Path) -> io::Result<T>,
    ) -> ScanResult<Option<T>> {
        let fs = &self.fs;
        match self.budget.charge(|| f(fs, path)) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                let disposition = classify_io_error(&err);
                if !disposition.is_benign() {
                    return Err(ScanError::io(op, path, err));
                }
                debug!(
                    "Skipping {} during {op}: {disposition:?} ({err})",
                    path.display()
                );
                Ok(None)
            }
        }
    }

    /// Charged "is this a directory?" check that follows symbolic links.
    ///
    /// Any failure, including a symlink loop, means "not a directory".
    pub(crate) fn is_dir_following_links(&mut self, path: &Path) -> bool {
        let fs = &self.fs;
        match self.budget.charge(|| fs.metadata(path)) {
            Ok(stat) => stat.kind.is_dir(),
            Err(err) => {
                debug!("Treating {} as not a directory: {err}", path.display());
                false
            }
        }
    }

    /// Measure the subtree rooted at `path`.
    ///
    /// Returns `Ok(None)` if the directory disappeared (or could not be
    /// listed) before it was measured.
    pub fn measure(&mut self, path: &Path) -> ScanResult<Option<DirectorySnapshot>> {
        let started = Instant::now();

        let Some(own) = self.query(FsOp::Stat, path, |fs, p| fs.metadata(p))? else {
            return Ok(None);
        };
        let Some(mut names) = self.query(FsOp::List, path, |fs, p| fs.read_dir_names(p))? else {
            return Ok(None);
        };
        names.sort();

        let mut snapshot = DirectorySnapshot::new_dir(display_name(path), own.len, own.modified);

        let mut files: Vec<PathBuf> = Vec::new();
        let mut subdirs: Vec<PathBuf> = Vec::new();
        for name in names {
            let child = path.join(name);
            let Some(stat) = self.query(FsOp::Classify, &child, |fs, p| fs.symlink_metadata(p))?
            else {
                continue;
            };
            match stat.kind {
                EntryKind::File | EntryKind::Symlink => files.push(child),
                EntryKind::Dir => subdirs.push(child),
                EntryKind::Other => {}
            }
        }

        for file in files {
            // Re-queried on purpose: the size folded in is the one seen at
            // stat time, not at classification time.
            if let Some(stat) = self.query(FsOp::Lstat, &file, |fs, p| fs.symlink_metadata(p))? {
                snapshot.add_file(stat.len, stat.modified);
            }
        }

        for dir in subdirs {
            if let Some(child) = self.measure(&dir)? {
                snapshot.add_subtree(&child);
            }
        }

        snapshot.scan_duration = started.elapsed();
        Ok(Some(snapshot))
    }

    /// Measure one immediate child of the parent directory, applying the
    /// volume rule. The result is always named after `child_name`.
    pub fn measure_top_level_entry(
        &mut self,
        parent: &Path,
        child_name: impl AsRef<OsStr>,
    ) -> ScanResult<Option<(CompactString, DirectorySnapshot)>> {
        let child_name = child_name.as_ref();
        let label = CompactString::new(child_name.to_string_lossy());
        let entry = parent.join(child_name);

        let target = if self.volume_rule.is_volume(&label) {
            let rule = self.volume_rule.clone();
            rule.find_payload(self, &entry)?.unwrap_or(entry)
        } else {
            entry
        };

        let Some(mut snapshot) = self.measure(&target)? else {
            return Ok(None);
        };
        snapshot.name = label.clone();
        Ok(Some((label, snapshot)))
    }

    /// Lazily measure every directory directly inside `parent`.
    ///
    /// The parent is listed once up front; each directory is measured only
    /// when the iterator reaches it. Entries that turn out to be absent are
    /// skipped. An unreadable parent yields an empty sequence.
    pub fn top_level_entries(&mut self, parent: &Path) -> ScanResult<TopLevelEntries<'_, F, C>> {
        let mut names = self
            .query(FsOp::List, parent, |fs, p| fs.read_dir_names(p))?
            .unwrap_or_default();
        names.sort();

        Ok(TopLevelEntries {
            walker: self,
            parent: parent.to_path_buf(),
            names: names.into_iter(),
            skipped: 0,
        })
    }
}

/// One-shot iterator over measured top-level directories.
pub struct TopLevelEntries<'w, F: Filesystem, C: Clock> {
    walker: &'w mut DirWalker<F, C>,
    parent: PathBuf,
    names: std::vec::IntoIter<OsString>,
    skipped: usize,
}

impl<F: Filesystem, C: Clock> TopLevelEntries<'_, F, C> {
    /// Directories seen so far that came back absent and were dropped.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl<F: Filesystem, C: Clock> Iterator for TopLevelEntries<'_, F, C> {
    type Item = ScanResult<(CompactString, DirectorySnapshot)>;

    fn next(&mut self) -> Option<Self::Item> {
        for name in self.names.by_ref() {
            let path = self.parent.join(&name);

            // Top-level entries follow links, so a symlinked tenant
            // directory is still measured.
            if !self.walker.is_dir_following_links(&path) {
                continue;
            }

            match self.walker.measure_top_level_entry(&self.parent, &name) {
                Ok(Some(entry)) => return Some(Ok(entry)),
                Ok(None) => {
                    self.skipped += 1;
                    debug!("{} vanished before it was measured", path.display());
                }
                Err(err) => return Some(Err(err)),
            }
        }
        None
    }
}

/// Basename of `path`, or the whole path for roots like `/`.
fn display_name(path: &Path) -> CompactString {
    match path.file_name() {
        Some(name) => CompactString::new(name.to_string_lossy()),
        None => CompactString::new(path.to_string_lossy()),
    }
}
