/*!
 * System Limits and Constants
 *
 * Centralized location for scheduler-wide defaults and thresholds.
 */

use std::time::Duration;

// =============================================================================
// SCHEDULING
// =============================================================================

/// Default time quantum in seconds
pub const DEFAULT_QUANTUM_SECS: f64 = 1.0;

/// Run the reconcile + purge pass every N ticks by default
pub const DEFAULT_GC_EVERY_TICKS: u32 = 1;

// =============================================================================
// REGISTRY LOCKING
// =============================================================================

/// Default bound on a registry lock wait before reporting LockInterrupted
/// Keeps a tick well inside its quantum when the control channel is busy
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 50;

/// Granularity of an interruptible lock wait
/// [PERF] Short enough for prompt teardown, long enough to avoid spinning
pub const LOCK_WAIT_SLICE: Duration = Duration::from_millis(5);

// =============================================================================
// CONTROL CHANNEL
// =============================================================================

/// Default path of the control socket
pub const DEFAULT_SOCKET_PATH: &str = "/tmp/rr-sched.sock";

/// Maximum accepted length of one control request line
/// [SECURITY] A pid never needs more than a handful of digits
pub const MAX_CONTROL_LINE: usize = 64;
