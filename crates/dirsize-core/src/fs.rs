/// Filesystem collaborator — the only place the walker touches the OS.
///
/// Every method is a single filesystem query so the walker can charge each
/// one against the IO budget individually.
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// What kind of entity a path names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Symlink,
    Dir,
    /// Sockets, fifos, device nodes. Neither file-like nor directory-like.
    Other,
}

impl EntryKind {
    /// Regular files and unresolved symbolic links.
    pub fn is_file_like(self) -> bool {
        matches!(self, EntryKind::File | EntryKind::Symlink)
    }

    pub fn is_dir(self) -> bool {
        self == EntryKind::Dir
    }
}

/// The subset of metadata the walker aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryStat {
    pub kind: EntryKind,
    pub len: u64,
    pub modified: SystemTime,
}

impl From<&fs::Metadata> for EntryStat {
    fn from(meta: &fs::Metadata) -> Self {
        let ft = meta.file_type();
        let kind = if ft.is_symlink() {
            EntryKind::Symlink
        } else if ft.is_dir() {
            EntryKind::Dir
        } else if ft.is_file() {
            EntryKind::File
        } else {
            EntryKind::Other
        };
        Self {
            kind,
            len: meta.len(),
            // Filesystems without mtime support report the epoch.
            modified: meta.modified().unwrap_or(UNIX_EPOCH),
        }
    }
}

/// Filesystem queries used during a scan.
pub trait Filesystem {
    /// Names of the entries directly inside `path`.
    fn read_dir_names(&self, path: &Path) -> io::Result<Vec<OsString>>;

    /// Metadata of `path`, following symbolic links.
    fn metadata(&self, path: &Path) -> io::Result<EntryStat>;

    /// Metadata of `path` itself, without following symbolic links.
    fn symlink_metadata(&self, path: &Path) -> io::Result<EntryStat>;
}

/// [`Filesystem`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl Filesystem for LocalFs {
    fn read_dir_names(&self, path: &Path) -> io::Result<Vec<OsString>> {
        fs::read_dir(path)?
            .map(|entry| entry.map(|e| e.file_name()))
            .collect()
    }

    fn metadata(&self, path: &Path) -> io::Result<EntryStat> {
        fs::metadata(path).map(|m| EntryStat::from(&m))
    }

    fn symlink_metadata(&self, path: &Path) -> io::Result<EntryStat> {
        fs::symlink_metadata(path).map(|m| EntryStat::from(&m))
    }
}
