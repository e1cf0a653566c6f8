/*!
 * Simulated Task Controller
 * In-memory process table for tests and dry runs; records every directive
 */

use super::controller::TaskController;
use crate::core::types::Pid;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Directive recorded by [`SimulatedController`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    Pause(Pid),
    Resume(Pid),
}

#[derive(Debug, Default)]
struct SimState {
    /// Live pids and whether each is currently stopped
    live: HashMap<Pid, bool>,
    log: Vec<Directive>,
}

/// Controller that simulates process lifetimes without touching the OS
#[derive(Debug, Default)]
pub struct SimulatedController {
    state: Mutex<SimState>,
}

impl SimulatedController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Controller whose given pids are alive and running
    pub fn with_live<I: IntoIterator<Item = Pid>>(pids: I) -> Self {
        let ctrl = Self::new();
        for pid in pids {
            ctrl.spawn(pid);
        }
        ctrl
    }

    /// Bring a process into existence (running)
    pub fn spawn(&self, pid: Pid) {
        self.state.lock().live.insert(pid, false);
    }

    /// Make a process vanish underneath the scheduler
    pub fn kill(&self, pid: Pid) {
        self.state.lock().live.remove(&pid);
    }

    /// Whether a live process is currently stopped
    pub fn is_stopped(&self, pid: Pid) -> Option<bool> {
        self.state.lock().live.get(&pid).copied()
    }

    /// Live pids that are not stopped
    pub fn running(&self) -> Vec<Pid> {
        let state = self.state.lock();
        let mut pids: Vec<Pid> = state
            .live
            .iter()
            .filter(|(_, stopped)| !**stopped)
            .map(|(pid, _)| *pid)
            .collect();
        pids.sort_unstable();
        pids
    }

    /// All directives issued so far, in order
    pub fn directives(&self) -> Vec<Directive> {
        self.state.lock().log.clone()
    }

    /// Return and forget the recorded directives
    pub fn take_directives(&self) -> Vec<Directive> {
        std::mem::take(&mut self.state.lock().log)
    }
}

impl TaskController for SimulatedController {
    fn exists(&self, pid: Pid) -> bool {
        self.state.lock().live.contains_key(&pid)
    }

    fn pause(&self, pid: Pid) -> bool {
        let mut state = self.state.lock();
        match state.live.get_mut(&pid) {
            Some(stopped) => {
                *stopped = true;
                state.log.push(Directive::Pause(pid));
                true
            }
            None => false,
        }
    }

    fn resume(&self, pid: Pid) -> bool {
        let mut state = self.state.lock();
        match state.live.get_mut(&pid) {
            Some(stopped) => {
                *stopped = false;
                state.log.push(Directive::Resume(pid));
                true
            }
            None => false,
        }
    }
}
