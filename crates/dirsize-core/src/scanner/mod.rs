/// Scanner module — budgeted measurement of directory subtrees.
///
/// - [`budget`]: the per-window IO ceiling every filesystem query is charged against.
/// - [`volume`]: the volume-directory redirection rule.
/// - [`walker`]: depth-first aggregation of size, entry count and mtime bounds.
///
/// A scan is single-threaded. Recursion follows the filesystem tree and the
/// only suspension point is the budget's deliberate sleep.
pub mod budget;
pub mod volume;
pub mod walker;

pub use budget::{Clock, IoBudget, SystemClock};
pub use volume::VolumeRule;
pub use walker::{DirWalker, TopLevelEntries};
