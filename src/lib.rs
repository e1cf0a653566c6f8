/*!
 * Round-Robin Process Scheduler Library
 *
 * Time-slices external processes by pausing and resuming them on a fixed
 * quantum, in the order they wait in a synchronized FIFO registry.
 */

pub mod api;
pub mod core;
pub mod monitoring;
pub mod process;
pub mod scheduler;

// Re-exports
pub use api::{ControlChannel, ControlServer};
pub use crate::core::{Pid, PidSelector, ReadMode, SchedulerConfig, SchedulerError, SchedulerResult};
pub use monitoring::init_tracing;
pub use process::{
    ProcessEntry, ProcessRegistry, ProcessState, SetStateOutcome, SignalController,
    SimulatedController, TaskController,
};
pub use scheduler::{RoundRobin, SchedulerStats, SchedulerTask, TickOutcome};
