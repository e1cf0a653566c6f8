/*!
 * Signal Controller Tests
 * Pause/resume real child processes (Linux only)
 */

use rr_sched::{Pid, ProcessRegistry, ProcessState, RoundRobin, SetStateOutcome, SignalController, TaskController};
use rr_sched::scheduler::AtomicSchedulerStats;
use std::process::{Child, Command};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// State letter from /proc/<pid>/stat
fn proc_state(pid: Pid) -> Option<char> {
    let stat = std::fs::read_to_string(format!("/proc/{}/stat", pid)).ok()?;
    let idx = stat.rfind(')')?;
    stat[idx + 1..].split_whitespace().next()?.chars().next()
}

fn wait_for_state(pid: Pid, want: impl Fn(char) -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if proc_state(pid).map_or(false, &want) {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    false
}

struct Children(Vec<Child>);

impl Children {
    fn spawn(n: usize) -> Self {
        Self(
            (0..n)
                .map(|_| Command::new("sleep").arg("30").spawn().unwrap())
                .collect(),
        )
    }

    fn pids(&self) -> Vec<Pid> {
        self.0.iter().map(|c| c.id() as Pid).collect()
    }
}

impl Drop for Children {
    fn drop(&mut self) {
        for child in &mut self.0 {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

#[test]
fn test_pause_and_resume_child() {
    let children = Children::spawn(1);
    let pid = children.pids()[0];
    let ctrl = SignalController::new();

    assert!(ctrl.exists(pid));
    assert_eq!(ctrl.set_state(pid, ProcessState::Waiting), SetStateOutcome::Exists);
    assert!(wait_for_state(pid, |s| s == 'T'));

    assert_eq!(ctrl.set_state(pid, ProcessState::Running), SetStateOutcome::Exists);
    assert!(wait_for_state(pid, |s| s != 'T'));
}

#[test]
fn test_reaped_child_is_gone() {
    let mut child = Command::new("true").spawn().unwrap();
    let pid = child.id() as Pid;
    child.wait().unwrap();

    let ctrl = SignalController::new();
    assert!(!ctrl.exists(pid));
    assert_eq!(ctrl.set_state(pid, ProcessState::Running), SetStateOutcome::Terminated);
}

#[test]
fn test_unreaped_child_counts_as_gone() {
    let mut child = Command::new("true").spawn().unwrap();
    let pid = child.id() as Pid;

    // Exited but not yet waited for: a zombie
    assert!(wait_for_state(pid, |s| s == 'Z'));
    assert!(!SignalController::new().exists(pid));
    child.wait().unwrap();
}

#[test]
fn test_round_robin_over_real_processes() {
    let children = Children::spawn(2);
    let pids = children.pids();
    let registry = Arc::new(ProcessRegistry::new(Arc::new(SignalController::new())));
    for pid in &pids {
        registry.enqueue(*pid).unwrap();
    }
    let stats = Arc::new(AtomicSchedulerStats::new(Duration::from_millis(10)));
    let mut rr = RoundRobin::new(Arc::clone(&registry), stats);

    rr.tick();
    rr.tick();

    // Second tick paused the first child and resumed the second
    assert_eq!(rr.current(), Some(pids[1]));
    assert!(wait_for_state(pids[0], |s| s == 'T'));
    assert!(wait_for_state(pids[1], |s| s != 'T'));
    assert_eq!(registry.snapshot().unwrap(), vec![pids[0]]);
}
