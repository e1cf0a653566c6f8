/*!
 * Core Types
 * Common types used across the scheduler
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// Process (or thread) identifier as seen by the OS
pub type Pid = i32;

/// Target of a registry state update
///
/// `All` is the broadcast key. It is a separate variant rather than a
/// reserved integer so it can never collide with a real pid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PidSelector {
    /// Apply to every tracked entry
    All,
    /// Apply to the entry with this pid
    Pid(Pid),
}

impl PidSelector {
    /// Whether this selector addresses the given pid
    #[inline]
    pub fn matches(&self, pid: Pid) -> bool {
        match self {
            PidSelector::All => true,
            PidSelector::Pid(p) => *p == pid,
        }
    }
}

impl From<Pid> for PidSelector {
    fn from(pid: Pid) -> Self {
        PidSelector::Pid(pid)
    }
}

impl fmt::Display for PidSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PidSelector::All => write!(f, "ALL"),
            PidSelector::Pid(pid) => write!(f, "{}", pid),
        }
    }
}
