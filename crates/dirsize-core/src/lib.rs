/// dirsize core — budgeted directory measurement and scan reconciliation.
///
/// This crate contains all scanning logic with zero networking dependencies.
/// The metrics endpoint and polling loop live in `dirsize-server`.
///
/// # Modules
///
/// - [`model`] — `DirectorySnapshot` and size formatting helpers.
/// - [`fs`] — The filesystem collaborator trait and its `std::fs` implementation.
/// - [`scanner`] — IO budget throttle, volume rule, and the recursive walker.
/// - [`reconcile`] — Per-cycle orchestration and stale-name computation.
/// - [`error`] — Scan errors and benign-race classification.
pub mod error;
pub mod fs;
pub mod model;
pub mod reconcile;
pub mod scanner;

pub use error::{ScanError, ScanResult};
pub use model::DirectorySnapshot;
pub use reconcile::{CycleSummary, ScanReconciler, SnapshotSink};
pub use scanner::{DirWalker, IoBudget, VolumeRule};
