/*!
 * Scheduler Configuration
 *
 * Defaults, optional JSON file and environment overrides.
 *
 * Environment variables:
 * - RR_SCHED_CONFIG: path of a JSON config file
 * - RR_SCHED_QUANTUM_SECS: time quantum in seconds (fractional allowed)
 * - RR_SCHED_LOCK_TIMEOUT_MS: registry lock wait bound
 * - RR_SCHED_GC_EVERY_TICKS: reconcile + purge period in ticks (0 = off)
 * - RR_SCHED_READ_MODE: `queue` or `head`
 * - RR_SCHED_SOCKET: control socket path
 */

use super::errors::{SchedulerError, SchedulerResult};
use super::limits::{
    DEFAULT_GC_EVERY_TICKS, DEFAULT_LOCK_TIMEOUT_MS, DEFAULT_QUANTUM_SECS, DEFAULT_SOCKET_PATH,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

/// What a diagnostic read of the control channel returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadMode {
    /// Every queued pid, head first
    #[default]
    Queue,
    /// Only the first live pid
    Head,
}

impl FromStr for ReadMode {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "queue" => Ok(ReadMode::Queue),
            "head" => Ok(ReadMode::Head),
            other => Err(SchedulerError::InvalidConfig(format!(
                "unknown read mode '{}'",
                other
            ))),
        }
    }
}

/// Scheduler configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub quantum_secs: f64,
    pub lock_timeout_ms: u64,
    pub gc_every_ticks: u32,
    pub read_mode: ReadMode,
    pub socket_path: PathBuf,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            quantum_secs: DEFAULT_QUANTUM_SECS,
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
            gc_every_ticks: DEFAULT_GC_EVERY_TICKS,
            read_mode: ReadMode::default(),
            socket_path: PathBuf::from(DEFAULT_SOCKET_PATH),
        }
    }
}

impl SchedulerConfig {
    /// Load from defaults, `RR_SCHED_CONFIG` and `RR_SCHED_*` overrides
    pub fn load() -> SchedulerResult<Self> {
        let mut config = match std::env::var("RR_SCHED_CONFIG") {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        info!(?config, "Scheduler configuration loaded");
        Ok(config)
    }

    /// Parse a JSON config file; missing fields take their defaults
    pub fn from_file(path: impl AsRef<Path>) -> SchedulerResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            SchedulerError::InvalidConfig(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|e| {
            SchedulerError::InvalidConfig(format!("cannot parse {}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), "Config file parsed");
        Ok(config)
    }

    /// Apply overrides from a key lookup (the process environment in production)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> SchedulerResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("RR_SCHED_QUANTUM_SECS") {
            self.quantum_secs = parse_var("RR_SCHED_QUANTUM_SECS", &v)?;
        }
        if let Some(v) = lookup("RR_SCHED_LOCK_TIMEOUT_MS") {
            self.lock_timeout_ms = parse_var("RR_SCHED_LOCK_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = lookup("RR_SCHED_GC_EVERY_TICKS") {
            self.gc_every_ticks = parse_var("RR_SCHED_GC_EVERY_TICKS", &v)?;
        }
        if let Some(v) = lookup("RR_SCHED_READ_MODE") {
            self.read_mode = v.parse()?;
        }
        if let Some(v) = lookup("RR_SCHED_SOCKET") {
            self.socket_path = PathBuf::from(v);
        }
        Ok(())
    }

    pub fn validate(&self) -> SchedulerResult<()> {
        if !self.quantum_secs.is_finite() || self.quantum_secs <= 0.0 {
            return Err(SchedulerError::InvalidConfig(format!(
                "quantum must be a positive number of seconds, got {}",
                self.quantum_secs
            )));
        }
        if self.lock_timeout_ms == 0 {
            return Err(SchedulerError::InvalidConfig(
                "lock timeout must be at least 1ms".into(),
            ));
        }
        Ok(())
    }

    #[inline]
    pub fn quantum(&self) -> Duration {
        Duration::from_secs_f64(self.quantum_secs)
    }

    #[inline]
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

fn parse_var<T: FromStr>(key: &str, value: &str) -> SchedulerResult<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| SchedulerError::InvalidConfig(format!("{}='{}': {}", key, value, e)))
}
