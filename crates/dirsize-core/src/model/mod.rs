/// Data model for directory measurements.
pub mod size;
pub mod snapshot;

pub use snapshot::{unix_seconds, DirectorySnapshot};
