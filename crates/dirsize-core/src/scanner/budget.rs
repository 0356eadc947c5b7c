/// IO budget throttle — caps filesystem operations per one-second window.
///
/// The budget is a per-window ceiling, not a token bucket: up to
/// `iops_budget + 1` operations run back-to-back at the start of a window,
/// then the caller sleeps until the window has fully elapsed. This bounds
/// the peak request rate seen by shared storage (NFS in particular).
///
/// A budget belongs to one scan on one thread. Parallel chargers would need
/// either one budget per branch or an atomic window, and the aggregate rate
/// guarantee changes with either choice.
use std::time::{Duration, Instant};
use tracing::trace;

/// Length of a budget window.
pub const WINDOW: Duration = Duration::from_secs(1);

/// Added to every forced wait so it always crosses the window boundary.
const WAIT_EPSILON: Duration = Duration::from_nanos(1);

/// Time source for the throttle, swappable in tests.
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&mut self, duration: Duration);
}

/// Wall-clock time and real thread sleeps.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Rate limiter that every filesystem query in a scan is charged through.
#[derive(Debug)]
pub struct IoBudget<C: Clock = SystemClock> {
    iops_budget: u64,
    clock: C,
    window_start: Instant,
    ops_in_window: u64,
    total_ops: u64,
    total_waited: Duration,
}

impl IoBudget<SystemClock> {
    pub fn new(iops_budget: u64) -> Self {
        Self::with_clock(iops_budget, SystemClock)
    }
}

impl<C: Clock> IoBudget<C> {
    pub fn with_clock(iops_budget: u64, clock: C) -> Self {
        let window_start = clock.now();
        Self {
            iops_budget,
            clock,
            window_start,
            ops_in_window: 0,
            total_ops: 0,
            total_waited: Duration::ZERO,
        }
    }

    /// Run `op` exactly once, sleeping first if the window is exhausted.
    pub fn charge<R>(&mut self, op: impl FnOnce() -> R) -> R {
        if self.clock.now().saturating_duration_since(self.window_start) > WINDOW {
            self.reset_window();
        }

        if self.ops_in_window > self.iops_budget {
            let elapsed = self.clock.now().saturating_duration_since(self.window_start);
            let wait = WINDOW.saturating_sub(elapsed) + WAIT_EPSILON;
            trace!(
                ops = self.ops_in_window,
                wait_ms = wait.as_millis() as u64,
                "IO budget exhausted, waiting for next window"
            );
            self.clock.sleep(wait);
            self.total_waited += wait;
            self.reset_window();
        }

        let result = op();
        self.ops_in_window += 1;
        self.total_ops += 1;
        result
    }

    /// Operations charged since this budget was created.
    pub fn total_ops(&self) -> u64 {
        self.total_ops
    }

    /// Time spent sleeping for the budget since creation.
    pub fn total_waited(&self) -> Duration {
        self.total_waited
    }

    fn reset_window(&mut self) {
        self.window_start = self.clock.now();
        self.ops_in_window = 0;
    }
}
