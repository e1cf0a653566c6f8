/*!
 * Core Module
 * Shared types, errors, configuration and limits
 */

pub mod config;
pub mod errors;
pub mod limits;
pub mod types;

pub use config::{ReadMode, SchedulerConfig};
pub use errors::{SchedulerError, SchedulerResult};
pub use types::{Pid, PidSelector};
