/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use crate::core::types::Pid;
use miette::Diagnostic;
use nix::errno::Errno;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Scheduler operation result
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Scheduler errors with serialization support
///
/// A vanished OS process is deliberately absent from this enum: it is
/// reported as [`SetStateOutcome::Terminated`](crate::process::SetStateOutcome)
/// and handled inside the registry/controller pair.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum SchedulerError {
    #[error("Out of memory while queueing process {pid}")]
    #[diagnostic(
        code(scheduler::out_of_memory),
        help("The registry entry could not be allocated. The registry is unchanged.")
    )]
    OutOfMemory { pid: Pid },

    #[error("Registry lock wait was interrupted")]
    #[diagnostic(
        code(scheduler::lock_interrupted),
        help("The registry was busy or shutting down. Retry the whole operation.")
    )]
    LockInterrupted,

    #[error("Invalid input: {0}")]
    #[diagnostic(
        code(scheduler::invalid_input),
        help("Write a single decimal process identifier, e.g. `echo 1234`.")
    )]
    InvalidInput(String),

    #[error("Scheduler startup failed: {0}")]
    #[diagnostic(
        code(scheduler::startup_failed),
        help("The scheduling task could not be created. Check runtime resources.")
    )]
    StartupFailed(String),

    #[error("Invalid configuration: {0}")]
    #[diagnostic(
        code(scheduler::invalid_config),
        help("Check RR_SCHED_* environment variables and the RR_SCHED_CONFIG file.")
    )]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    #[diagnostic(code(scheduler::io))]
    Io(String),
}

impl SchedulerError {
    /// Errno reported to control channel clients
    pub fn errno(&self) -> Errno {
        match self {
            SchedulerError::OutOfMemory { .. } => Errno::ENOMEM,
            SchedulerError::LockInterrupted => Errno::EINTR,
            SchedulerError::InvalidInput(_) => Errno::EINVAL,
            SchedulerError::StartupFailed(_) => Errno::EAGAIN,
            SchedulerError::InvalidConfig(_) => Errno::EINVAL,
            SchedulerError::Io(_) => Errno::EIO,
        }
    }

    /// Whether retrying the same operation may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, SchedulerError::LockInterrupted)
    }
}

impl From<std::io::Error> for SchedulerError {
    fn from(err: std::io::Error) -> Self {
        SchedulerError::Io(err.to_string())
    }
}
