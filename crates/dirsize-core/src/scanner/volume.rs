/// Volume directory redirection.
///
/// Some managed volumes keep their real data one level below a fixed
/// wrapper directory. A top-level directory whose name contains the volume
/// marker is searched for the first child directory holding the payload
/// marker directory; that child is measured instead, and the result is
/// reported under the wrapper's name so series stay stable across
/// re-provisioning.
use crate::error::{FsOp, ScanResult};
use crate::fs::Filesystem;
use crate::scanner::budget::Clock;
use crate::scanner::walker::DirWalker;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Marker substring of volume directory names.
pub const DEFAULT_VOLUME_MARKER: &str = "tlon_";

/// Name of the directory identifying a volume's payload.
pub const DEFAULT_PAYLOAD_MARKER: &str = ".urb";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeRule {
    pub volume_marker: String,
    pub payload_marker: String,
}

impl Default for VolumeRule {
    fn default() -> Self {
        Self::new(DEFAULT_VOLUME_MARKER, DEFAULT_PAYLOAD_MARKER)
    }
}

impl VolumeRule {
    pub fn new(volume_marker: impl Into<String>, payload_marker: impl Into<String>) -> Self {
        Self {
            volume_marker: volume_marker.into(),
            payload_marker: payload_marker.into(),
        }
    }

    /// Whether a top-level directory name follows the volume convention.
    pub fn is_volume(&self, dir_name: &str) -> bool {
        dir_name.contains(self.volume_marker.as_str())
    }

    /// Find the first child directory of `volume_dir` containing the payload
    /// marker directory. Children are visited in name order.
    ///
    /// Returns `None` when the volume has no payload, or when the volume
    /// itself disappeared or became unreadable.
    pub fn find_payload<F: Filesystem, C: Clock>(
        &self,
        walker: &mut DirWalker<F, C>,
        volume_dir: &Path,
    ) -> ScanResult<Option<PathBuf>> {
        let Some(mut names) = walker.query(FsOp::List, volume_dir, |fs, p| fs.read_dir_names(p))?
        else {
            return Ok(None);
        };
        names.sort();

        for name in names {
            let candidate = volume_dir.join(&name);
            if !walker.is_dir_following_links(&candidate) {
                continue;
            }

            let marker = candidate.join(&self.payload_marker);
            if walker.is_dir_following_links(&marker) {
                debug!(
                    "Volume {} redirects to payload {}",
                    volume_dir.display(),
                    candidate.display()
                );
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }
}
