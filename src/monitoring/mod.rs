/*!
 * Monitoring
 * Structured logging setup and tracing spans
 */

mod tracer;

pub use tracer::{init_tracing, TickSpan};
