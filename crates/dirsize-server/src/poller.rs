/// Poller — runs scan cycles on a background thread and keeps the
/// registry current.
///
/// Each cycle gets a fresh [`IoBudget`] and [`DirWalker`]; the
/// [`ScanReconciler`] is the only state carried between cycles. Cycles
/// start `wait_time` apart, or back-to-back when a cycle overruns. There is
/// no catch-up for missed starts.
///
/// The wait between cycles is a `recv_timeout` on the shutdown channel, so
/// [`PollerHandle::stop`] takes effect between cycles. A running cycle is
/// never interrupted.
use crate::config::ExporterConfig;
use crate::registry::MetricsRegistry;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use dirsize_core::fs::LocalFs;
use dirsize_core::model::size::format_size;
use dirsize_core::{CycleSummary, DirWalker, IoBudget, ScanReconciler, ScanResult};
use std::thread;
use std::time::Instant;
use tokio::sync::oneshot;
use tracing::{error, info, warn};

pub struct Poller {
    config: ExporterConfig,
    registry: MetricsRegistry,
    reconciler: ScanReconciler,
}

impl Poller {
    pub fn new(config: ExporterConfig, registry: MetricsRegistry) -> Self {
        Self {
            config,
            registry,
            reconciler: ScanReconciler::new(),
        }
    }

    /// Run one full scan cycle.
    pub fn run_once(&mut self) -> ScanResult<CycleSummary> {
        let mut walker = DirWalker::with_parts(
            LocalFs,
            IoBudget::new(self.config.iops_budget),
            self.config.volume_rule.clone(),
        );
        self.reconciler
            .run_cycle(&mut walker, &self.config.parent_dir, &mut self.registry)
    }

    /// Run cycles until `shutdown` receives a message or is disconnected.
    ///
    /// A fatal scan error ends the loop and is returned to the caller.
    pub fn run(mut self, shutdown: Receiver<()>) -> ScanResult<()> {
        loop {
            let started = Instant::now();
            let summary = self.run_once().inspect_err(|e| {
                error!("Scan of {} failed: {e}", self.config.parent_dir.display());
            })?;

            info!(
                "Cycle complete: {} directories ({}), {} skipped, {} retracted, {} IO ops, {:?} budget wait, {:?} elapsed",
                summary.published.len(),
                format_size(summary.total_size_bytes),
                summary.skipped,
                summary.retracted.len(),
                summary.io_ops,
                summary.io_wait,
                summary.elapsed,
            );

            let wait = self.config.wait_time.saturating_sub(started.elapsed());
            if wait.is_zero() && !self.config.wait_time.is_zero() {
                warn!(
                    "Cycle took {:?}, longer than the {:?} interval; starting next cycle now",
                    started.elapsed(),
                    self.config.wait_time
                );
            }

            match shutdown.recv_timeout(wait) {
                Err(RecvTimeoutError::Timeout) => continue,
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                    info!("Poller stopping");
                    return Ok(());
                }
            }
        }
    }
}

/// Handle to the background poller thread.
pub struct PollerHandle {
    /// Resolves with the poller's result once the thread exits.
    pub exited: oneshot::Receiver<ScanResult<()>>,
    shutdown_tx: Sender<()>,
    _thread: thread::JoinHandle<()>,
}

impl PollerHandle {
    /// Ask the poller to stop before its next cycle. Non-blocking.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.try_send(());
    }
}

/// Start the poller on a named background thread.
pub fn start_poller(
    config: ExporterConfig,
    registry: MetricsRegistry,
) -> std::io::Result<PollerHandle> {
    let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(1);
    let (exit_tx, exited) = oneshot::channel();

    let thread = thread::Builder::new()
        .name("dirsize-poller".into())
        .spawn(move || {
            info!(
                "Scanning subdirectories of {} every {:?} at {} IOPS",
                config.parent_dir.display(),
                config.wait_time,
                config.iops_budget
            );
            let result = Poller::new(config, registry).run(shutdown_rx);
            let _ = exit_tx.send(result);
        })?;

    Ok(PollerHandle {
        exited,
        shutdown_tx,
        _thread: thread,
    })
}
