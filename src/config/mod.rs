//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (JSON/TOML)
//!     → loader.rs (read, pick format by extension, optional section)
//!     → ConfigSnapshot (case-insensitive key/value tree)
//!     → options::parse_from (typed OptionsRecord, validation.rs for values)
//!
//! On file change:
//!     watcher.rs detects change (notify, debounced)
//!     → loader.rs + parse_from reparse
//!     → on error: log, keep last good settings
//!     → on success: atomic swap of the GlobalSettings snapshot
//! ```
//!
//! # Design Decisions
//! - A snapshot is parsed once at startup into the default OptionsRecord
//! - Only the global subset (logging policy) is reloaded live
//! - Reload failures never take the watcher down; the next change retries

pub mod loader;
pub mod snapshot;
pub mod validation;
pub mod watcher;

pub use loader::{load_snapshot, ConfigError, Format};
pub use snapshot::ConfigSnapshot;
pub use watcher::{ConfigWatcher, WatchEvent, WatchMode, WatchOptions, WatchSubscriptionError, WatcherState};
