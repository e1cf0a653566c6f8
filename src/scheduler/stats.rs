/*!
 * Lock-Free Scheduler Statistics
 * Uses atomic counters so the control surface can read stats without
 * touching the registry lock
 */

use crate::core::types::Pid;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI32, AtomicU64, Ordering};
use std::time::Duration;

/// Sentinel stored in `current` when nothing is running
const NO_PID: Pid = 0;

/// Point-in-time scheduler statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStats {
    pub ticks: u64,
    pub idle_ticks: u64,
    pub deferred_ticks: u64,
    pub context_switches: u64,
    pub purged: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<Pid>,
    pub quantum_micros: u64,
}

/// Atomic scheduler statistics for lock-free updates
///
/// All operations use relaxed ordering; counters may be momentarily
/// inconsistent with each other, which is fine for monitoring.
#[repr(C, align(64))]
pub struct AtomicSchedulerStats {
    ticks: AtomicU64,
    idle_ticks: AtomicU64,
    deferred_ticks: AtomicU64,
    context_switches: AtomicU64,
    purged: AtomicU64,
    current: AtomicI32,
    quantum_micros: u64,
}

impl AtomicSchedulerStats {
    pub fn new(quantum: Duration) -> Self {
        Self {
            ticks: AtomicU64::new(0),
            idle_ticks: AtomicU64::new(0),
            deferred_ticks: AtomicU64::new(0),
            context_switches: AtomicU64::new(0),
            purged: AtomicU64::new(0),
            current: AtomicI32::new(NO_PID),
            quantum_micros: quantum.as_micros() as u64,
        }
    }

    #[inline(always)]
    pub fn inc_ticks(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_idle(&self) {
        self.idle_ticks.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_deferred(&self) {
        self.deferred_ticks.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_context_switches(&self) {
        self.context_switches.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn add_purged(&self, count: usize) {
        self.purged.fetch_add(count as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn set_current(&self, pid: Option<Pid>) {
        self.current.store(pid.unwrap_or(NO_PID), Ordering::Relaxed);
    }

    #[inline]
    pub fn current(&self) -> Option<Pid> {
        match self.current.load(Ordering::Relaxed) {
            NO_PID => None,
            pid => Some(pid),
        }
    }

    pub fn snapshot(&self) -> SchedulerStats {
        SchedulerStats {
            ticks: self.ticks.load(Ordering::Relaxed),
            idle_ticks: self.idle_ticks.load(Ordering::Relaxed),
            deferred_ticks: self.deferred_ticks.load(Ordering::Relaxed),
            context_switches: self.context_switches.load(Ordering::Relaxed),
            purged: self.purged.load(Ordering::Relaxed),
            current: self.current(),
            quantum_micros: self.quantum_micros,
        }
    }
}
