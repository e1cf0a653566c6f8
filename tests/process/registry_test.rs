/*!
 * Process Registry Tests
 * Ordering, purging and staleness reconciliation
 */

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rr_sched::{Pid, PidSelector, ProcessRegistry, ProcessState, SimulatedController};
use std::collections::HashSet;
use std::sync::Arc;

fn registry(live: &[Pid]) -> (Arc<SimulatedController>, ProcessRegistry) {
    let ctrl = Arc::new(SimulatedController::with_live(live.iter().copied()));
    let registry = ProcessRegistry::new(ctrl.clone());
    (ctrl, registry)
}

fn states(registry: &ProcessRegistry) -> Vec<(Pid, ProcessState)> {
    registry
        .entries()
        .unwrap()
        .into_iter()
        .map(|e| (e.pid, e.state))
        .collect()
}

proptest! {
    #[test]
    fn prop_snapshot_preserves_enqueue_order(pids in proptest::collection::hash_set(1..100_000i32, 0..64)) {
        let pids: Vec<Pid> = pids.into_iter().collect();
        let (_, registry) = registry(&pids);
        for pid in &pids {
            prop_assert!(registry.enqueue(*pid).unwrap());
        }
        prop_assert_eq!(registry.snapshot().unwrap(), pids);
    }

    #[test]
    fn prop_no_pid_queued_twice(pids in proptest::collection::vec(1..20i32, 0..100)) {
        let (_, registry) = registry(&pids);
        for pid in &pids {
            registry.enqueue(*pid).unwrap();
        }
        let snapshot = registry.snapshot().unwrap();
        let unique: HashSet<Pid> = snapshot.iter().copied().collect();
        prop_assert_eq!(unique.len(), snapshot.len());
    }
}

#[test]
fn test_purge_is_idempotent() {
    let (ctrl, registry) = registry(&[1, 2, 3, 4]);
    for pid in 1..=4 {
        registry.enqueue(pid).unwrap();
    }
    ctrl.kill(2);
    ctrl.kill(4);
    registry
        .update_state(PidSelector::All, ProcessState::Waiting)
        .unwrap();

    assert_eq!(registry.remove_terminated().unwrap(), 2);
    let after_first = registry.snapshot().unwrap();
    assert_eq!(registry.remove_terminated().unwrap(), 0);
    assert_eq!(registry.snapshot().unwrap(), after_first);
    assert_eq!(after_first, vec![1, 3]);
}

#[test]
fn test_broadcast_update_demotes_vanished() {
    let (ctrl, registry) = registry(&[10, 20, 30]);
    for pid in [10, 20, 30] {
        registry.enqueue(pid).unwrap();
    }
    registry
        .update_state(PidSelector::Pid(10), ProcessState::Blocked)
        .unwrap();
    ctrl.kill(20);

    let updated = registry
        .update_state(PidSelector::All, ProcessState::Waiting)
        .unwrap();
    assert_eq!(updated, 2);
    assert_eq!(
        states(&registry),
        vec![
            (10, ProcessState::Waiting),
            (20, ProcessState::Terminated),
            (30, ProcessState::Waiting),
        ]
    );
}

#[test]
fn test_stale_entry_excluded_then_purged() {
    let (ctrl, registry) = registry(&[1, 2]);
    registry.enqueue(1).unwrap();
    registry.enqueue(2).unwrap();
    ctrl.kill(1);

    // The peek skips and demotes the stale head
    assert_eq!(registry.first_live().unwrap(), Some(2));
    assert_eq!(states(&registry)[0], (1, ProcessState::Terminated));

    // A dead process that comes back under the same pid is not resurrected
    ctrl.spawn(1);
    assert_eq!(registry.first_live().unwrap(), Some(2));

    registry.remove_terminated().unwrap();
    assert_eq!(registry.snapshot().unwrap(), vec![2]);
}

#[test]
fn test_remove_absent_is_noop() {
    let (_, registry) = registry(&[1]);
    registry.enqueue(1).unwrap();
    assert_eq!(registry.remove(77).unwrap(), 0);
    assert_eq!(registry.snapshot().unwrap(), vec![1]);
}

#[test]
fn test_take_first_live_exhausts_queue() {
    let (_, registry) = registry(&[1, 2]);
    registry.enqueue(1).unwrap();
    registry.enqueue(2).unwrap();

    assert_eq!(registry.take_first_live().unwrap(), Some(1));
    assert_eq!(registry.take_first_live().unwrap(), Some(2));
    assert_eq!(registry.take_first_live().unwrap(), None);
    assert!(registry.is_empty().unwrap());
}
