/*!
 * Task Controller
 *
 * Bridges logical process state with the OS process table. Pausing and
 * resuming use SIGSTOP/SIGCONT; existence is probed with the null signal.
 */

use super::types::{ProcessState, SetStateOutcome};
use crate::core::types::Pid;
use tracing::{debug, trace, warn};

#[cfg(unix)]
use nix::errno::Errno;
#[cfg(unix)]
use nix::sys::signal::{kill, Signal as UnixSignal};
#[cfg(unix)]
use nix::unistd::Pid as NixPid;

/// Capability to inspect and steer external processes
///
/// Implementors only provide the three primitives; [`set_state`] layers the
/// existence check and the state-to-directive mapping on top.
///
/// [`set_state`]: TaskController::set_state
pub trait TaskController: Send + Sync {
    /// Whether `pid` denotes a live process. Fails closed.
    fn exists(&self, pid: Pid) -> bool;

    /// Suspend execution. Returns false if the directive was not delivered.
    fn pause(&self, pid: Pid) -> bool;

    /// Continue execution. Returns false if the directive was not delivered.
    fn resume(&self, pid: Pid) -> bool;

    /// Drive `pid` towards `target`
    ///
    /// Never signals a process that is already gone. `Blocked` and
    /// `Terminated` are logical only and issue no directive.
    fn set_state(&self, pid: Pid, target: ProcessState) -> SetStateOutcome {
        if !self.exists(pid) {
            debug!(pid, ?target, "Process gone before state change");
            return SetStateOutcome::Terminated;
        }

        let delivered = match target {
            ProcessState::Running => self.resume(pid),
            ProcessState::Waiting => self.pause(pid),
            ProcessState::Created | ProcessState::Blocked | ProcessState::Terminated => true,
        };

        // The process may exit between the probe and the signal
        if !delivered && !self.exists(pid) {
            debug!(pid, ?target, "Process exited while being signalled");
            return SetStateOutcome::Terminated;
        }

        trace!(pid, ?target, delivered, "State directive issued");
        SetStateOutcome::Exists
    }
}

/// Controller backed by real OS signals
#[derive(Debug, Default, Clone, Copy)]
pub struct SignalController;

impl SignalController {
    pub fn new() -> Self {
        Self
    }

    #[cfg(unix)]
    fn send(&self, pid: Pid, signal: UnixSignal) -> bool {
        // 0 and negative values address process groups, never a single task
        if pid <= 0 {
            return false;
        }
        match kill(NixPid::from_raw(pid), signal) {
            Ok(_) => true,
            Err(e) => {
                warn!(pid, ?signal, error = %e, "Failed to signal process");
                false
            }
        }
    }
}

#[cfg(unix)]
impl TaskController for SignalController {
    fn exists(&self, pid: Pid) -> bool {
        if pid <= 0 {
            return false;
        }
        match kill(NixPid::from_raw(pid), None) {
            // EPERM: alive but owned by someone else
            Ok(_) | Err(Errno::EPERM) => !is_zombie(pid),
            Err(_) => false,
        }
    }

    fn pause(&self, pid: Pid) -> bool {
        self.send(pid, UnixSignal::SIGSTOP)
    }

    fn resume(&self, pid: Pid) -> bool {
        self.send(pid, UnixSignal::SIGCONT)
    }
}

/// Non-Unix stubs
#[cfg(not(unix))]
impl TaskController for SignalController {
    fn exists(&self, pid: Pid) -> bool {
        warn!(pid, "Process probing not supported on this platform");
        false
    }

    fn pause(&self, pid: Pid) -> bool {
        warn!(pid, "Process preemption not supported on this platform");
        false
    }

    fn resume(&self, pid: Pid) -> bool {
        warn!(pid, "Process resumption not supported on this platform");
        false
    }
}

/// A zombie still answers the null signal but will never run again
#[cfg(target_os = "linux")]
fn is_zombie(pid: Pid) -> bool {
    let Ok(stat) = std::fs::read_to_string(format!("/proc/{}/stat", pid)) else {
        return false;
    };
    // Field 3 follows the parenthesised command name, which may contain spaces
    stat.rfind(')')
        .and_then(|idx| stat[idx + 1..].split_whitespace().next())
        .map(|state| state == "Z" || state == "X")
        .unwrap_or(false)
}

#[cfg(all(unix, not(target_os = "linux")))]
fn is_zombie(_pid: Pid) -> bool {
    false
}
