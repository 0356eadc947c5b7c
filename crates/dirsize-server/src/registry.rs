/// Labeled gauge storage for per-directory measurements.
///
/// The poller thread writes through [`SnapshotSink`]; the HTTP endpoint
/// reads on every scrape. Both hold clones of the same [`MetricsRegistry`],
/// which is a thin handle around an `Arc<RwLock<..>>`.
use crate::exposition::{render_gauges, GaugeFamily};
use chrono::{DateTime, Utc};
use compact_str::CompactString;
use dirsize_core::model::unix_seconds;
use dirsize_core::{DirectorySnapshot, SnapshotSink};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Prefix of every exported metric name.
pub const NAMESPACE: &str = "dirsize";

/// The single label every series carries.
pub const DIRECTORY_LABEL: &str = "directory";

/// Exported gauge families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gauge {
    TotalSize,
    LatestMtime,
    OldestMtime,
    EntriesCount,
    ProcessingTime,
    LastUpdated,
}

impl Gauge {
    pub const ALL: [Gauge; 6] = [
        Gauge::TotalSize,
        Gauge::LatestMtime,
        Gauge::OldestMtime,
        Gauge::EntriesCount,
        Gauge::ProcessingTime,
        Gauge::LastUpdated,
    ];

    fn suffix(self) -> &'static str {
        match self {
            Gauge::TotalSize => "total_size_bytes",
            Gauge::LatestMtime => "latest_mtime",
            Gauge::OldestMtime => "oldest_mtime",
            Gauge::EntriesCount => "entries_count",
            Gauge::ProcessingTime => "processing_time",
            // Historical name; the value is unix seconds.
            Gauge::LastUpdated => "last_updated_ns",
        }
    }

    pub fn help(self) -> &'static str {
        match self {
            Gauge::TotalSize => "Total Size of the Directory (in bytes)",
            Gauge::LatestMtime => "Newest modified file in the directory (as unix timestamp)",
            Gauge::OldestMtime => "Oldest modified file in the directory (as unix timestamp)",
            Gauge::EntriesCount => {
                "Total number of entries (files, directories & links) in the directory"
            }
            Gauge::ProcessingTime => "Time it took to process the directory (in seconds)",
            Gauge::LastUpdated => "Last time this directory was processed (as unix timestamp)",
        }
    }

    /// Fully qualified metric name, e.g. `dirsize_total_size_bytes`.
    pub fn metric_name(self) -> String {
        format!("{NAMESPACE}_{}", self.suffix())
    }
}

/// Current gauge values for one directory.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectorySeries {
    pub total_size_bytes: f64,
    pub latest_mtime: f64,
    pub oldest_mtime: f64,
    pub entries_count: f64,
    pub processing_time: f64,
    pub last_updated: f64,
}

impl DirectorySeries {
    pub fn from_snapshot(snapshot: &DirectorySnapshot, updated_at: DateTime<Utc>) -> Self {
        Self {
            total_size_bytes: snapshot.total_size_bytes as f64,
            latest_mtime: unix_seconds(snapshot.latest_modified),
            oldest_mtime: unix_seconds(snapshot.oldest_modified),
            entries_count: snapshot.entry_count as f64,
            processing_time: snapshot.scan_duration.as_secs_f64(),
            last_updated: updated_at.timestamp_millis() as f64 / 1000.0,
        }
    }

    pub fn value(&self, gauge: Gauge) -> f64 {
        match gauge {
            Gauge::TotalSize => self.total_size_bytes,
            Gauge::LatestMtime => self.latest_mtime,
            Gauge::OldestMtime => self.oldest_mtime,
            Gauge::EntriesCount => self.entries_count,
            Gauge::ProcessingTime => self.processing_time,
            Gauge::LastUpdated => self.last_updated,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetricsRegistry {
    series: Arc<RwLock<BTreeMap<CompactString, DirectorySeries>>>,
    detailed_processing_time: bool,
}

impl MetricsRegistry {
    /// `detailed_processing_time` enables the `dirsize_processing_time`
    /// family. It is off by default because the value is noisy and
    /// compresses badly in Prometheus.
    pub fn new(detailed_processing_time: bool) -> Self {
        Self {
            series: Arc::new(RwLock::new(BTreeMap::new())),
            detailed_processing_time,
        }
    }

    /// Gauge families this registry exports.
    pub fn gauges(&self) -> impl Iterator<Item = Gauge> + '_ {
        Gauge::ALL
            .into_iter()
            .filter(|g| *g != Gauge::ProcessingTime || self.detailed_processing_time)
    }

    /// Set every gauge for `name` from `snapshot`.
    pub fn set(&self, name: &str, snapshot: &DirectorySnapshot, updated_at: DateTime<Utc>) {
        let series = DirectorySeries::from_snapshot(snapshot, updated_at);
        self.series.write().insert(CompactString::new(name), series);
    }

    /// Remove every gauge for `name`. Unknown names are a no-op.
    pub fn remove(&self, name: &str) -> bool {
        self.series.write().remove(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<DirectorySeries> {
        self.series.read().get(name).cloned()
    }

    /// Directory names with published series, sorted.
    pub fn directories(&self) -> Vec<CompactString> {
        self.series.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.series.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.read().is_empty()
    }

    /// Render the registry in Prometheus text exposition format.
    pub fn render(&self) -> String {
        let families: Vec<GaugeFamily> = {
            let series = self.series.read();
            self.gauges()
                .map(|gauge| GaugeFamily {
                    name: gauge.metric_name(),
                    help: gauge.help(),
                    label: DIRECTORY_LABEL,
                    samples: series
                        .iter()
                        .map(|(dir, s)| (dir.to_string(), s.value(gauge)))
                        .collect(),
                })
                .collect()
        };
        render_gauges(&families)
    }
}

impl SnapshotSink for MetricsRegistry {
    fn publish(&mut self, name: &str, snapshot: DirectorySnapshot) {
        self.set(name, &snapshot, Utc::now());
    }

    fn retract(&mut self, name: &str) -> bool {
        self.remove(name)
    }
}
