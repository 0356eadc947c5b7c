//! Error types for the exporter's configuration and metrics endpoint.

use std::path::PathBuf;
use thiserror::Error;

/// Invalid command line configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Parent directory '{}' does not exist", .0.display())]
    ParentMissing(PathBuf),

    #[error("'{}' is not a directory", .0.display())]
    ParentNotDirectory(PathBuf),

    #[error("Invalid {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Failures of the metrics HTTP endpoint.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to bind metrics endpoint on {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Metrics endpoint stopped: {0}")]
    Io(#[from] std::io::Error),
}
