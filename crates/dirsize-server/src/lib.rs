/// dirsize server — the metrics side of dirsize-exporter.
///
/// # Modules
///
/// - [`config`] — CLI arguments and validated runtime configuration.
/// - [`registry`] — Labeled gauge storage fed by scan cycles.
/// - [`exposition`] — Prometheus text format rendering.
/// - [`http`] — The `/metrics` endpoint.
/// - [`poller`] — The scan loop that keeps the registry current.
/// - [`error`] — Configuration and server errors.
pub mod config;
pub mod error;
pub mod exposition;
pub mod http;
pub mod poller;
pub mod registry;

pub use config::{CliArgs, ExporterConfig};
pub use poller::{start_poller, PollerHandle};
pub use registry::MetricsRegistry;
