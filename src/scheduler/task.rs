/*!
 * Scheduler Task - Self-Re-Arming Round-Robin Loop
 *
 * A single background task sleeps for one quantum, runs a tick, then arms
 * the next sleep. The next sleep is only armed once the tick has returned,
 * so ticks never overlap.
 *
 * # Shutdown
 *
 * - `request_shutdown()` is cooperative: the flag is read at the end of a
 *   tick, so an already armed tick still runs once more.
 * - `shutdown().await` is the full teardown: it also cancels the pending
 *   sleep, waits for an in-flight tick to finish, resumes every process
 *   still parked in the registry (and the last `current`, which a deferred
 *   tick may have left paused) and frees all entries. It consumes self.
 * - `Drop` without `shutdown()` aborts the task and logs a warning.
 *
 * Ticks run inline on the runtime. A tick blocks a worker for at most one
 * registry lock wait (`lock_timeout_ms`) per registry call plus the
 * `/proc` probes of the queued pids.
 */

use super::round_robin::RoundRobin;
use super::stats::{AtomicSchedulerStats, SchedulerStats};
use crate::core::config::SchedulerConfig;
use crate::core::errors::{SchedulerError, SchedulerResult};
use crate::core::types::Pid;
use crate::process::ProcessRegistry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{info, warn};

/// State shared between the handle and the loop
struct Shared {
    /// Checked at the end of every tick
    shutdown_requested: AtomicBool,
    /// Abandon the pending sleep instead of ticking
    cancelled: AtomicBool,
    wake: Notify,
}

/// Handle to the scheduler background task
pub struct SchedulerTask {
    shared: Arc<Shared>,
    registry: Arc<ProcessRegistry>,
    stats: Arc<AtomicSchedulerStats>,
    handle: Option<tokio::task::JoinHandle<Option<Pid>>>,
    quantum: Duration,
}

impl SchedulerTask {
    /// Spawn the loop on the current tokio runtime
    ///
    /// Fails with `StartupFailed` when no runtime is available to host it.
    pub fn spawn(registry: Arc<ProcessRegistry>, config: &SchedulerConfig) -> SchedulerResult<Self> {
        config.validate()?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| SchedulerError::StartupFailed(e.to_string()))?;

        let quantum = config.quantum();
        let stats = Arc::new(AtomicSchedulerStats::new(quantum));
        let shared = Arc::new(Shared {
            shutdown_requested: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
            wake: Notify::new(),
        });

        let rr = RoundRobin::new(Arc::clone(&registry), Arc::clone(&stats))
            .with_gc_every(config.gc_every_ticks);
        let loop_shared = Arc::clone(&shared);
        let handle = runtime.spawn(run_scheduler_loop(rr, quantum, loop_shared));

        info!(?quantum, "Scheduler task spawned - round robin enabled");

        Ok(Self {
            shared,
            registry,
            stats,
            handle: Some(handle),
            quantum,
        })
    }

    /// Run a tick now instead of waiting for the quantum to elapse
    pub fn trigger(&self) {
        self.shared.wake.notify_one();
    }

    /// Stop re-arming after the next tick completes
    pub fn request_shutdown(&self) {
        self.shared.shutdown_requested.store(true, Ordering::SeqCst);
        info!("Scheduler shutdown requested");
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shared.shutdown_requested.load(Ordering::SeqCst)
    }

    /// Whether the loop has exited
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Pid currently granted execution
    pub fn current(&self) -> Option<Pid> {
        self.stats.current()
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats.snapshot()
    }

    pub fn quantum(&self) -> Duration {
        self.quantum
    }

    pub fn registry(&self) -> &Arc<ProcessRegistry> {
        &self.registry
    }

    /// Tear the scheduler down
    ///
    /// Returns the number of registry entries released.
    pub async fn shutdown(mut self) -> usize {
        self.shared.shutdown_requested.store(true, Ordering::SeqCst);
        self.shared.cancelled.store(true, Ordering::SeqCst);
        self.shared.wake.notify_one();

        // Drain the in-flight tick, if any
        let mut last = self.stats.current();
        if let Some(handle) = self.handle.take() {
            match handle.await {
                Ok(current) => last = current,
                Err(e) => warn!("Scheduler task shutdown error: {}", e),
            }
        }

        // Registration writes racing the teardown fail instead of blocking
        self.registry.interrupt();
        let entries = self.registry.drain();
        let controller = self.registry.controller();
        for pid in entries.iter().map(|e| e.pid).chain(last) {
            if controller.exists(pid) {
                controller.resume(pid);
            }
        }

        info!(released = entries.len(), "Scheduler task shutdown complete");
        entries.len()
    }
}

/// Sleep, tick, re-arm; returns the pid left as `current`
async fn run_scheduler_loop(mut rr: RoundRobin, quantum: Duration, shared: Arc<Shared>) -> Option<Pid> {
    info!(?quantum, "Scheduler loop started");

    loop {
        tokio::select! {
            _ = tokio::time::sleep(quantum) => {}
            _ = shared.wake.notified() => {}
        }

        if shared.cancelled.load(Ordering::SeqCst) {
            break;
        }

        rr.tick();

        if shared.shutdown_requested.load(Ordering::SeqCst) {
            break;
        }
    }

    rr.stop();
    rr.current()
}

impl Drop for SchedulerTask {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            warn!(
                "SchedulerTask dropped without calling shutdown() - aborting task immediately. \
                 Use `task.shutdown().await` for graceful cleanup."
            );
            handle.abort();
        }
    }
}
