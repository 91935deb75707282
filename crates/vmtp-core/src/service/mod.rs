//! High-level services.
//!
//! These bridge the CLI with the protocol library: sending one composed
//! message, and running a server that logs what it receives.

pub mod receive;
pub mod send;

pub use receive::{LoggingHandler, serve};
pub use send::send_message;
