/*!
 * Process Types
 * Lifecycle states and registry entries
 */

use crate::core::types::Pid;
use serde::{Deserialize, Serialize};

/// Logical lifecycle state of a tracked process
///
/// The ordering follows the lifecycle, not scheduling priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessState {
    /// Known but never scheduled
    Created,
    /// Granted the CPU for the current quantum
    Running,
    /// Paused, waiting for its turn
    Waiting,
    /// Reserved for future policies; no OS directive is issued for it
    Blocked,
    /// OS process is gone; excluded from scheduling until purged
    Terminated,
}

impl ProcessState {
    #[inline]
    pub fn is_terminated(&self) -> bool {
        matches!(self, ProcessState::Terminated)
    }
}

/// One queued process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessEntry {
    pub pid: Pid,
    pub state: ProcessState,
}

impl ProcessEntry {
    /// New entries enter the queue paused
    pub fn new(pid: Pid) -> Self {
        Self {
            pid,
            state: ProcessState::Waiting,
        }
    }
}

/// Result of driving an OS process towards a state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetStateOutcome {
    /// Process is alive; the directive (if any) was issued
    Exists,
    /// Process no longer exists; the caller should drop the pid
    Terminated,
}

impl SetStateOutcome {
    #[inline]
    pub fn exists(&self) -> bool {
        matches!(self, SetStateOutcome::Exists)
    }
}
