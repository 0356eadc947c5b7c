//! Configuration for dirsize-exporter
//!
//! CLI arguments are parsed once with clap and validated into an
//! [`ExporterConfig`], which is immutable for the life of the process.

use crate::error::ConfigError;
use clap::Parser;
use dirsize_core::scanner::volume::{DEFAULT_PAYLOAD_MARKER, DEFAULT_VOLUME_MARKER};
use dirsize_core::VolumeRule;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Default port of the metrics endpoint.
pub const DEFAULT_PORT: u16 = 8000;

/// Export per-subdirectory disk usage as Prometheus metrics
#[derive(Parser, Debug, Clone)]
#[command(
    name = "dirsize-exporter",
    version,
    about = "Export per-subdirectory disk usage as Prometheus metrics",
    long_about = "Periodically walks every immediate subdirectory of PARENT_DIR, limiting \
                  filesystem operations to IOPS_BUDGET per second, and exports size, entry \
                  count and modification time bounds as gauges labeled by directory.",
    after_help = "EXAMPLES:\n    \
        dirsize-exporter /home 200 30\n    \
        dirsize-exporter /srv/volumes 50 60 --port 9101 --enable-detailed-processing-time-metric"
)]
pub struct CliArgs {
    /// The directory whose subdirectories will have their information exported
    #[arg(value_name = "PARENT_DIR")]
    pub parent_dir: PathBuf,

    /// Number of IO operations allowed per second
    #[arg(value_name = "IOPS_BUDGET", value_parser = clap::value_parser!(u64).range(1..))]
    pub iops_budget: u64,

    /// Number of minutes to wait between data collection runs
    #[arg(value_name = "WAIT_TIME_MINUTES")]
    pub wait_time_minutes: u64,

    /// Report the time it took to process each directory
    #[arg(long)]
    pub enable_detailed_processing_time_metric: bool,

    /// Port for the metrics server to listen on
    #[arg(long, default_value_t = DEFAULT_PORT, value_name = "PORT")]
    pub port: u16,

    /// Address for the metrics server to bind
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED), value_name = "ADDR")]
    pub bind: IpAddr,

    /// Substring marking a top-level directory as a volume
    #[arg(long, default_value = DEFAULT_VOLUME_MARKER, value_name = "MARKER")]
    pub volume_marker: String,

    /// Directory name identifying a volume's payload directory
    #[arg(long, default_value = DEFAULT_PAYLOAD_MARKER, value_name = "NAME")]
    pub payload_marker: String,

    /// Verbose output (log skipped entries and budget waits)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// Validated runtime configuration.
#[derive(Debug, Clone)]
pub struct ExporterConfig {
    pub parent_dir: PathBuf,
    pub iops_budget: u64,
    pub wait_time: Duration,
    pub detailed_processing_time: bool,
    pub listen_addr: SocketAddr,
    pub volume_rule: VolumeRule,
}

impl ExporterConfig {
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        let meta = std::fs::metadata(&args.parent_dir)
            .map_err(|_| ConfigError::ParentMissing(args.parent_dir.clone()))?;
        if !meta.is_dir() {
            return Err(ConfigError::ParentNotDirectory(args.parent_dir));
        }

        if args.iops_budget == 0 {
            return Err(ConfigError::InvalidValue {
                field: "iops budget",
                reason: "must be at least 1".into(),
            });
        }
        if args.volume_marker.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "volume marker",
                reason: "must not be empty".into(),
            });
        }
        if args.payload_marker.is_empty() || args.payload_marker.contains('/') {
            return Err(ConfigError::InvalidValue {
                field: "payload marker",
                reason: "must be a single, non-empty path component".into(),
            });
        }

        let wait_secs = args.wait_time_minutes.checked_mul(60).ok_or_else(|| {
            ConfigError::InvalidValue {
                field: "wait time",
                reason: format!("{} minutes is out of range", args.wait_time_minutes),
            }
        })?;

        Ok(Self {
            parent_dir: args.parent_dir,
            iops_budget: args.iops_budget,
            wait_time: Duration::from_secs(wait_secs),
            detailed_processing_time: args.enable_detailed_processing_time_metric,
            listen_addr: SocketAddr::new(args.bind, args.port),
            volume_rule: VolumeRule::new(args.volume_marker, args.payload_marker),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str], parent: &std::path::Path) -> CliArgs {
        let mut argv = vec!["dirsize-exporter", parent.to_str().unwrap(), "100", "5"];
        argv.extend_from_slice(extra);
        CliArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn positional_arguments_and_defaults() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = ExporterConfig::from_args(parse(&[], tmp.path())).unwrap();

        assert_eq!(config.iops_budget, 100);
        assert_eq!(config.wait_time, Duration::from_secs(300));
        assert!(!config.detailed_processing_time);
        assert_eq!(config.listen_addr.port(), DEFAULT_PORT);
        assert_eq!(config.volume_rule, VolumeRule::default());
    }

    #[test]
    fn flags_override_defaults() {
        let tmp = tempfile::TempDir::new().unwrap();
        let args = parse(
            &[
                "--enable-detailed-processing-time-metric",
                "--port",
                "9101",
                "--bind",
                "127.0.0.1",
                "--volume-marker",
                "vol-",
                "--payload-marker",
                "data",
            ],
            tmp.path(),
        );
        let config = ExporterConfig::from_args(args).unwrap();

        assert!(config.detailed_processing_time);
        assert_eq!(config.listen_addr, "127.0.0.1:9101".parse::<SocketAddr>().unwrap());
        assert_eq!(config.volume_rule, VolumeRule::new("vol-", "data"));
    }

    #[test]
    fn zero_budget_is_rejected_by_the_parser() {
        let result = CliArgs::try_parse_from(["dirsize-exporter", "/tmp", "0", "5"]);
        assert!(result.is_err());
    }

    #[test]
    fn missing_parent_is_rejected() {
        let tmp = tempfile::TempDir::new().unwrap();
        let args = parse(&[], &tmp.path().join("nope"));
        assert!(matches!(
            ExporterConfig::from_args(args),
            Err(ConfigError::ParentMissing(_))
        ));
    }

    #[test]
    fn file_parent_is_rejected() {
        let tmp = tempfile::TempDir::new().unwrap();
        let file = tmp.path().join("f");
        std::fs::write(&file, b"x").unwrap();
        assert!(matches!(
            ExporterConfig::from_args(parse(&[], &file)),
            Err(ConfigError::ParentNotDirectory(_))
        ));
    }

    #[test]
    fn empty_markers_are_rejected() {
        let tmp = tempfile::TempDir::new().unwrap();
        let args = parse(&["--volume-marker", ""], tmp.path());
        assert!(matches!(
            ExporterConfig::from_args(args),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
