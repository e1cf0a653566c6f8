/*!
 * Round-Robin Selection
 *
 * One tick pauses the process holding the CPU, puts it back at the tail of
 * the registry and resumes the first live process in line. The registry is
 * strict FIFO, so N live processes each get one quantum per N ticks.
 *
 * Pause, select and resume are strictly ordered within a tick. Re-append
 * and selection are one registry operation. A lock failure part-way
 * through leaves `current` describing what was committed (a paused
 * outgoing process stays `current`), and the next tick redoes the
 * remaining steps.
 */

use super::stats::AtomicSchedulerStats;
use crate::core::errors::SchedulerResult;
use crate::core::types::{Pid, PidSelector};
use crate::monitoring::TickSpan;
use crate::process::{ProcessRegistry, ProcessState, SetStateOutcome};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// Phase of the selection state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopPhase {
    /// Between ticks, or nothing to run
    Idle,
    /// Outgoing process chosen, about to pause it
    Selecting,
    /// Outgoing paused, choosing and resuming the successor
    Switching,
    /// Shutdown observed; no further ticks
    Stopped,
}

/// What a single tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Registry empty (or all stale) and nothing running; no directives issued
    Idle,
    /// `from` was paused and `to` (if any) resumed
    Switched { from: Pid, to: Option<Pid> },
    /// Registry lock unavailable; the work is retried next tick
    Deferred,
}

/// Round-robin selection state
pub struct RoundRobin {
    registry: Arc<ProcessRegistry>,
    stats: Arc<AtomicSchedulerStats>,
    current: Option<Pid>,
    phase: LoopPhase,
    gc_every_ticks: u32,
    ticks: u64,
}

impl RoundRobin {
    pub fn new(registry: Arc<ProcessRegistry>, stats: Arc<AtomicSchedulerStats>) -> Self {
        Self {
            registry,
            stats,
            current: None,
            phase: LoopPhase::Idle,
            gc_every_ticks: 0,
            ticks: 0,
        }
    }

    /// Reconcile and purge the registry every `every` ticks (0 disables)
    pub fn with_gc_every(mut self, every: u32) -> Self {
        self.gc_every_ticks = every;
        self
    }

    /// Pid currently granted execution
    pub fn current(&self) -> Option<Pid> {
        self.current
    }

    pub fn phase(&self) -> LoopPhase {
        self.phase
    }

    pub fn registry(&self) -> &Arc<ProcessRegistry> {
        &self.registry
    }

    /// Mark the machine terminal
    pub fn stop(&mut self) {
        self.phase = LoopPhase::Stopped;
        info!(current = ?self.current, "Round-robin loop stopped");
    }

    /// Run one scheduling round
    pub fn tick(&mut self) -> TickOutcome {
        self.ticks += 1;
        self.stats.inc_ticks();
        let span = TickSpan::new(self.ticks);
        let _entered = span.enter();

        let outcome = match self.round() {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, current = ?self.current, "Tick deferred");
                self.stats.inc_deferred();
                TickOutcome::Deferred
            }
        };

        self.phase = LoopPhase::Idle;
        self.stats.set_current(self.current);

        if self.gc_every_ticks > 0 && self.ticks % u64::from(self.gc_every_ticks) == 0 {
            self.collect_garbage();
        }

        trace!(?outcome, current = ?self.current, "Tick complete");
        outcome
    }

    fn round(&mut self) -> SchedulerResult<TickOutcome> {
        // Peek only: the entry stays queued until the destructive selection below
        let outgoing = match self.current {
            Some(pid) => pid,
            None => match self.registry.first_live()? {
                Some(pid) => pid,
                None => {
                    self.stats.inc_idle();
                    return Ok(TickOutcome::Idle);
                }
            },
        };
        self.current = Some(outgoing);
        self.phase = LoopPhase::Selecting;

        let controller = Arc::clone(self.registry.controller());
        let paused = controller.set_state(outgoing, ProcessState::Waiting);
        self.phase = LoopPhase::Switching;

        // A live outgoing process keeps its position if still queued from the peek
        if !paused.exists() {
            debug!(pid = outgoing, "Outgoing process gone, dropping it");
        }
        let next = self.registry.rotate(outgoing, paused.exists())?;
        let resumed = next.filter(|&pid| {
            let alive = controller.set_state(pid, ProcessState::Running).exists();
            if !alive {
                debug!(pid, "Successor exited before it could be resumed");
            }
            alive
        });

        self.current = match paused {
            SetStateOutcome::Exists => resumed,
            // No successor is inherited; the resumed process goes back to the
            // head so it stays tracked and is picked up by the next tick
            SetStateOutcome::Terminated => match resumed {
                Some(pid) => match self.registry.requeue_front(pid) {
                    Ok(_) => None,
                    Err(e) => {
                        warn!(pid, error = %e, "Could not requeue successor, keeping it current");
                        Some(pid)
                    }
                },
                None => None,
            },
        };

        if resumed.is_some_and(|pid| pid != outgoing) {
            self.stats.inc_context_switches();
        }
        debug!(from = outgoing, to = ?resumed, "Context switch");

        Ok(TickOutcome::Switched {
            from: outgoing,
            to: resumed,
        })
    }

    fn collect_garbage(&self) {
        let result = self
            .registry
            .update_state(PidSelector::All, ProcessState::Waiting)
            .and_then(|_| self.registry.remove_terminated());
        match result {
            Ok(purged) => self.stats.add_purged(purged),
            Err(e) => warn!(error = %e, "Registry purge skipped"),
        }
    }
}
