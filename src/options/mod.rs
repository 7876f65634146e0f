//! Client construction options.
//!
//! # Data Flow
//! ```text
//! ConfigSnapshot
//!     → parse.rs (parse_from: keys → typed values, errors name the key)
//!     → OptionsRecord (immutable)
//!     → registry.rs (process-wide default, set once at startup)
//!     → registration::ServiceBinder (default vs override precedence)
//! ```
//!
//! # Design Decisions
//! - OptionsRecord is a value; "changing" it means building a new one
//! - Logging fields may indirect through `GlobalSettings` so a live reload
//!   reaches records already handed out, everything else stays frozen
//! - Parsing is a pure function of the snapshot

pub mod logging;
pub mod parse;
pub mod record;
pub mod registry;

pub use logging::{LogTo, LoggingConfig, ResponseLogging, UnknownLogDestination, UnknownResponseLogging};
pub use parse::{parse_from, ConfigParseError};
pub use record::{CredentialRef, InvalidRegion, OptionsRecord, Region, ServiceOverride};
pub use registry::OptionsRegistry;
