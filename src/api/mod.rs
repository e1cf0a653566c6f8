/*!
 * API Module
 * Control channel and its Unix socket front end
 */

pub mod control;
pub mod server;

pub use control::{parse_pid, ControlChannel};
pub use server::{handle_request, ControlServer};
