/*!
 * Structured Tracing
 * Subscriber setup and per-tick spans using the tracing crate
 */

use std::time::{Duration, Instant};
use tracing::{debug, info, span, warn, Level};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// A tick slower than this is reported as a warning
const SLOW_TICK: Duration = Duration::from_millis(10);

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - RR_SCHED_TRACE_JSON: Enable JSON output (default: false)
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var("RR_SCHED_TRACE_JSON")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_names(true)
                    .with_current_span(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_names(true)
                    .compact(),
            )
            .try_init()
    };

    if installed.is_ok() {
        info!(json = use_json, "Structured tracing initialized");
    }
}

/// Span covering one scheduling tick; reports its duration on drop
pub struct TickSpan {
    span: tracing::Span,
    start: Instant,
    tick: u64,
}

impl TickSpan {
    pub fn new(tick: u64) -> Self {
        let span = span!(Level::TRACE, "tick", tick, duration_us = tracing::field::Empty);
        Self {
            span,
            start: Instant::now(),
            tick,
        }
    }

    /// Enter the span context
    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }
}

impl Drop for TickSpan {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        self.span.record("duration_us", duration.as_micros() as u64);
        if duration > SLOW_TICK {
            warn!(
                tick = self.tick,
                duration_ms = duration.as_millis() as u64,
                "slow scheduling tick"
            );
        } else {
            debug!(
                tick = self.tick,
                duration_us = duration.as_micros() as u64,
                "tick completed"
            );
        }
    }
}
