/*!
 * Process Module
 * Tracked process state, OS process control and the process registry
 */

pub mod controller;
pub mod registry;
pub mod simulated;
pub mod types;

// Re-export public API
pub use controller::{SignalController, TaskController};
pub use registry::ProcessRegistry;
pub use simulated::{Directive, SimulatedController};
pub use types::{ProcessEntry, ProcessState, SetStateOutcome};
