/*!
 * Scheduler Module
 * Round-robin selection and the background task that drives it
 */

pub mod round_robin;
pub mod stats;
pub mod task;

// Re-export public API
pub use round_robin::{LoopPhase, RoundRobin, TickOutcome};
pub use stats::{AtomicSchedulerStats, SchedulerStats};
pub use task::SchedulerTask;
