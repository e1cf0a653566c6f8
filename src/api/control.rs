/*!
 * Control Channel
 *
 * Registration surface in front of the process registry. A write carries a
 * decimal pid; a read returns either the queue or its first live pid,
 * depending on the configured mode.
 */

use crate::core::config::ReadMode;
use crate::core::errors::{SchedulerError, SchedulerResult};
use crate::core::types::Pid;
use crate::process::ProcessRegistry;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Registration and diagnostic endpoint
#[derive(Clone)]
pub struct ControlChannel {
    registry: Arc<ProcessRegistry>,
    mode: ReadMode,
}

impl ControlChannel {
    pub fn new(registry: Arc<ProcessRegistry>, mode: ReadMode) -> Self {
        Self { registry, mode }
    }

    pub fn mode(&self) -> ReadMode {
        self.mode
    }

    /// Register the pid in `payload`; returns the number of bytes consumed
    ///
    /// Malformed payloads are rejected before the registry is touched.
    pub fn write(&self, payload: &[u8]) -> SchedulerResult<usize> {
        let pid = parse_pid(payload)?;
        match self.registry.enqueue(pid) {
            Ok(true) => info!(pid, "Process registered"),
            Ok(false) => debug!(pid, "Process already registered"),
            Err(e) => {
                warn!(pid, error = %e, "Registration failed");
                return Err(e);
            }
        }
        Ok(payload.len())
    }

    /// Diagnostic read; an empty registry yields an empty string
    pub fn read(&self) -> SchedulerResult<String> {
        match self.mode {
            ReadMode::Queue => Ok(self
                .registry
                .snapshot()?
                .iter()
                .map(|pid| pid.to_string())
                .collect::<Vec<_>>()
                .join("\n")),
            ReadMode::Head => Ok(self
                .registry
                .first_live()?
                .map(|pid| pid.to_string())
                .unwrap_or_default()),
        }
    }
}

/// Parse a decimal pid, tolerating surrounding whitespace
pub fn parse_pid(payload: &[u8]) -> SchedulerResult<Pid> {
    let text = std::str::from_utf8(payload)
        .map_err(|_| SchedulerError::InvalidInput("payload is not UTF-8".into()))?
        .trim();
    let pid: Pid = text
        .parse()
        .map_err(|e| SchedulerError::InvalidInput(format!("'{}': {}", text, e)))?;
    if pid <= 0 {
        return Err(SchedulerError::InvalidInput(format!(
            "'{}': pid must be positive",
            text
        )));
    }
    Ok(pid)
}
