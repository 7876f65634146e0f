//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Library internals:
//!     → tracing events (registration, construction, reloads)
//!     → metrics.rs (reload outcomes, client constructions)
//!
//! Constructed clients:
//!     → logging.rs::emit(live LoggingConfig, ...)
//!     → one tracing target per enabled LogTo destination
//! ```
//!
//! # Design Decisions
//! - Library code only emits; installing a subscriber or exporter is the
//!   binary's job
//! - Client log routing reads the live policy on every call, so a reload is
//!   visible to clients built before it

pub mod logging;
pub mod metrics;
