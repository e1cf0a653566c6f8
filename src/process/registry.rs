/*!
 * Process Registry
 *
 * FIFO of tracked processes behind a single exclusive lock. Every operation,
 * readers included, runs under that lock; lock waits are bounded and can be
 * interrupted, in which case the operation fails with `LockInterrupted`
 * and leaves the registry untouched.
 *
 * Staleness is reconciled here: entries whose OS process has vanished are
 * demoted to `Terminated` whenever a scan passes over them, and purged by
 * `remove_terminated`.
 */

use super::controller::TaskController;
use super::types::{ProcessEntry, ProcessState};
use crate::core::errors::{SchedulerError, SchedulerResult};
use crate::core::limits::{DEFAULT_LOCK_TIMEOUT_MS, LOCK_WAIT_SLICE};
use crate::core::types::{Pid, PidSelector};
use parking_lot::{Mutex, MutexGuard};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

type Queue = VecDeque<ProcessEntry>;

/// Synchronized ordered collection of tracked processes
pub struct ProcessRegistry {
    queue: Mutex<Queue>,
    controller: Arc<dyn TaskController>,
    lock_timeout: Duration,
    interrupted: AtomicBool,
}

impl ProcessRegistry {
    pub fn new(controller: Arc<dyn TaskController>) -> Self {
        Self::with_lock_timeout(controller, Duration::from_millis(DEFAULT_LOCK_TIMEOUT_MS))
    }

    pub fn with_lock_timeout(controller: Arc<dyn TaskController>, lock_timeout: Duration) -> Self {
        info!(?lock_timeout, "Process registry initialized");
        Self {
            queue: Mutex::new(VecDeque::new()),
            controller,
            lock_timeout,
            interrupted: AtomicBool::new(false),
        }
    }

    /// Controller used to reconcile entries with the OS
    pub fn controller(&self) -> &Arc<dyn TaskController> {
        &self.controller
    }

    /// Acquire the registry lock, giving up on interrupt or timeout
    fn lock(&self) -> SchedulerResult<MutexGuard<'_, Queue>> {
        let deadline = Instant::now() + self.lock_timeout;
        loop {
            if self.interrupted.load(Ordering::Acquire) {
                debug!("Registry lock wait interrupted");
                return Err(SchedulerError::LockInterrupted);
            }
            let now = Instant::now();
            if now >= deadline {
                warn!(timeout = ?self.lock_timeout, "Registry lock wait timed out");
                return Err(SchedulerError::LockInterrupted);
            }
            if let Some(guard) = self.queue.try_lock_for(LOCK_WAIT_SLICE.min(deadline - now)) {
                return Ok(guard);
            }
        }
    }

    /// Abort pending and future lock waits with `LockInterrupted`
    pub fn interrupt(&self) {
        self.interrupted.store(true, Ordering::Release);
    }

    pub fn reset_interrupt(&self) {
        self.interrupted.store(false, Ordering::Release);
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::Acquire)
    }

    /// Append `pid` to the tail in state `Waiting`
    ///
    /// Returns `Ok(false)` if a non-terminated entry for `pid` is already
    /// queued. A terminated leftover for a reused pid is replaced.
    pub fn enqueue(&self, pid: Pid) -> SchedulerResult<bool> {
        let mut queue = self.lock()?;
        if !append(&mut queue, pid)? {
            debug!(pid, "Process already queued");
            return Ok(false);
        }
        info!(pid, queued = queue.len(), "Process added to registry");
        Ok(true)
    }

    /// Insert `pid` at the head so it is the next one selected
    pub fn requeue_front(&self, pid: Pid) -> SchedulerResult<bool> {
        let mut queue = self.lock()?;
        if is_queued(&queue, pid) {
            return Ok(false);
        }
        queue
            .try_reserve(1)
            .map_err(|_| SchedulerError::OutOfMemory { pid })?;
        queue.retain(|e| e.pid != pid);
        queue.push_front(ProcessEntry::new(pid));
        debug!(pid, "Process requeued at head");
        Ok(true)
    }

    /// Remove every entry for `pid`; returns how many were removed
    pub fn remove(&self, pid: Pid) -> SchedulerResult<usize> {
        let mut queue = self.lock()?;
        let before = queue.len();
        queue.retain(|e| e.pid != pid);
        let removed = before - queue.len();
        if removed > 0 {
            info!(pid, "Process removed from registry");
        }
        Ok(removed)
    }

    /// Purge every `Terminated` entry; returns how many were purged
    pub fn remove_terminated(&self) -> SchedulerResult<usize> {
        let mut queue = self.lock()?;
        let before = queue.len();
        queue.retain(|e| !e.state.is_terminated());
        let purged = before - queue.len();
        if purged > 0 {
            info!(purged, "Terminated processes purged");
        }
        Ok(purged)
    }

    /// Set the state of the selected entries, reconciling all entries
    ///
    /// Every entry, matching or not, is probed; entries whose process is
    /// gone become `Terminated`. `Terminated` is final: such entries are left
    /// alone even if the pid is alive again, and only `enqueue` replaces
    /// them. Returns how many entries took `state`.
    pub fn update_state(&self, target: PidSelector, state: ProcessState) -> SchedulerResult<usize> {
        let mut queue = self.lock()?;
        let mut updated = 0;
        for entry in queue.iter_mut() {
            if entry.state.is_terminated() {
                continue;
            }
            if !self.controller.exists(entry.pid) {
                debug!(pid = entry.pid, "Stale process marked terminated");
                entry.state = ProcessState::Terminated;
            } else if target.matches(entry.pid) {
                entry.state = state;
                updated += 1;
            }
        }
        debug!(%target, ?state, updated, "Registry state updated");
        Ok(updated)
    }

    /// Peek at the first entry whose process is alive
    pub fn first_live(&self) -> SchedulerResult<Option<Pid>> {
        let mut queue = self.lock()?;
        Ok(self.scan_live(&mut queue).map(|idx| queue[idx].pid))
    }

    /// Remove and return the first entry whose process is alive
    ///
    /// Selection and removal happen in one critical section.
    pub fn take_first_live(&self) -> SchedulerResult<Option<Pid>> {
        let mut queue = self.lock()?;
        let taken = self
            .scan_live(&mut queue)
            .and_then(|idx| queue.remove(idx))
            .map(|entry| entry.pid);
        if let Some(pid) = taken {
            debug!(pid, remaining = queue.len(), "Process taken from registry");
        }
        Ok(taken)
    }

    /// Put the outgoing process back (or drop it) and take its successor
    ///
    /// Re-append and selection share one critical section, so a lock
    /// failure leaves the queue exactly as it was.
    pub fn rotate(&self, outgoing: Pid, alive: bool) -> SchedulerResult<Option<Pid>> {
        let mut queue = self.lock()?;
        if alive {
            append(&mut queue, outgoing)?;
        } else {
            queue.retain(|e| e.pid != outgoing);
        }
        let next = self
            .scan_live(&mut queue)
            .and_then(|idx| queue.remove(idx))
            .map(|entry| entry.pid);
        debug!(outgoing, alive, ?next, remaining = queue.len(), "Registry rotated");
        Ok(next)
    }

    /// Index of the first live entry; stale entries passed over are demoted
    fn scan_live(&self, queue: &mut Queue) -> Option<usize> {
        for (idx, entry) in queue.iter_mut().enumerate() {
            if entry.state.is_terminated() {
                continue;
            }
            if self.controller.exists(entry.pid) {
                return Some(idx);
            }
            debug!(pid = entry.pid, "Stale process skipped");
            entry.state = ProcessState::Terminated;
        }
        None
    }

    /// Queued pids, head first
    pub fn snapshot(&self) -> SchedulerResult<Vec<Pid>> {
        Ok(self.lock()?.iter().map(|e| e.pid).collect())
    }

    /// Queued entries with their states, head first
    pub fn entries(&self) -> SchedulerResult<Vec<ProcessEntry>> {
        Ok(self.lock()?.iter().copied().collect())
    }

    pub fn contains(&self, pid: Pid) -> SchedulerResult<bool> {
        Ok(self.lock()?.iter().any(|e| e.pid == pid))
    }

    pub fn len(&self) -> SchedulerResult<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> SchedulerResult<bool> {
        Ok(self.lock()?.is_empty())
    }

    /// Remove and return every entry
    ///
    /// Used at teardown; waits for the lock regardless of interrupts since
    /// critical sections are bounded.
    pub fn drain(&self) -> Vec<ProcessEntry> {
        let drained: Vec<ProcessEntry> = self.queue.lock().drain(..).collect();
        info!(freed = drained.len(), "Process registry released");
        drained
    }
}

fn is_queued(queue: &Queue, pid: Pid) -> bool {
    queue.iter().any(|e| e.pid == pid && !e.state.is_terminated())
}

/// Push `pid` to the tail unless a live entry for it is already queued
fn append(queue: &mut Queue, pid: Pid) -> SchedulerResult<bool> {
    if is_queued(queue, pid) {
        return Ok(false);
    }
    queue
        .try_reserve(1)
        .map_err(|_| SchedulerError::OutOfMemory { pid })?;
    queue.retain(|e| e.pid != pid);
    queue.push_back(ProcessEntry::new(pid));
    Ok(true)
}
