//! Error types for directory scanning.
//!
//! A live tree mutates underneath the walker, so most filesystem failures
//! are expected and handled where they occur:
//! - `NotFound`: the entity was removed between listing and querying
//! - `ESTALE`: an NFS client replaced the inode behind our handle
//! - `EACCES`: the entity is owned in a way we cannot read
//!
//! Anything else is a [`ScanError`] and aborts the current cycle.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// `ESTALE` on Linux.
pub const ESTALE: i32 = 116;

/// `EACCES` on Linux and the BSDs.
pub const EACCES: i32 = 13;

/// Result alias for scan operations.
pub type ScanResult<T> = Result<T, ScanError>;

/// Filesystem operation that failed, for error context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsOp {
    /// Listing the entries of a directory.
    List,
    /// Determining whether a path is a file, link or directory.
    Classify,
    /// Metadata query that follows symbolic links.
    Stat,
    /// Metadata query that does not follow symbolic links.
    Lstat,
}

impl fmt::Display for FsOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FsOp::List => "list",
            FsOp::Classify => "classify",
            FsOp::Stat => "stat",
            FsOp::Lstat => "lstat",
        };
        f.write_str(s)
    }
}

/// A filesystem failure that could not be treated as a benign race.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("failed to {op} '{}': {source}", .path.display())]
    Io {
        op: FsOp,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ScanError {
    pub fn io(op: FsOp, path: &Path, source: io::Error) -> Self {
        ScanError::Io {
            op,
            path: path.to_path_buf(),
            source,
        }
    }

    /// Raw OS error code, if the failure carried one.
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            ScanError::Io { source, .. } => source.raw_os_error(),
        }
    }
}

/// How a failed filesystem query should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoDisposition {
    /// Removed since it was listed. Treat as absent.
    Vanished,
    /// Stale NFS file handle. Treat as absent, a later cycle will catch it.
    StaleHandle,
    /// Not readable by us. Treat as absent.
    PermissionDenied,
    /// Propagate and abort the cycle.
    Fatal,
}

impl IoDisposition {
    pub fn is_benign(self) -> bool {
        !matches!(self, IoDisposition::Fatal)
    }
}

/// Classify an IO error into a benign race or a fatal failure.
pub fn classify_io_error(err: &io::Error) -> IoDisposition {
    match err.raw_os_error() {
        Some(ESTALE) => return IoDisposition::StaleHandle,
        Some(EACCES) => return IoDisposition::PermissionDenied,
        _ => {}
    }
    match err.kind() {
        io::ErrorKind::NotFound => IoDisposition::Vanished,
        io::ErrorKind::PermissionDenied => IoDisposition::PermissionDenied,
        _ => IoDisposition::Fatal,
    }
}
