//! Lifecycle management.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     ConfigWatcher::stop / drop → trigger → watch loop leaves its select
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → binary stops the watcher and exits
//! ```
//!
//! # Design Decisions
//! - One broadcast channel per background task owner; late subscribers still
//!   see a shutdown that already happened
//! - A reparse in progress is never interrupted, cancellation is only
//!   observed at wait points

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
