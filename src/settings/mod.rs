//! Process-wide, live-reloadable settings.
//!
//! # Data Flow
//! ```text
//! ConfigWatcher (single writer)
//!     → GlobalSettings::replace(new logging policy)
//!     → ArcSwap store of a fresh GlobalSnapshot
//!
//! Clients / OptionsRecord (many readers)
//!     → GlobalSettings::load() → Arc<GlobalSnapshot>
//! ```
//!
//! # Design Decisions
//! - Copy-on-write: every change publishes a whole new snapshot, readers
//!   never see a half-applied update and never take a lock
//! - Only the logging policy lives here; region and credentials are frozen
//!   into each client when it is constructed
//! - One process-wide instance is available via [`GlobalSettings::process`];
//!   explicitly owned instances exist for embedding and tests

use std::sync::Arc;

use arc_swap::ArcSwap;
use once_cell::sync::Lazy;

use crate::options::logging::{LogTo, LoggingConfig};
use crate::options::OptionsRecord;

/// An immutable view of the global settings at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalSnapshot {
    pub logging: LoggingConfig,
    /// Incremented on every successful swap, starting at 0.
    pub generation: u64,
}

/// Shared handle to the live global settings.
///
/// Cloning the handle shares the same underlying snapshot slot.
#[derive(Debug, Clone)]
pub struct GlobalSettings {
    inner: Arc<ArcSwap<GlobalSnapshot>>,
}

static PROCESS: Lazy<GlobalSettings> = Lazy::new(|| GlobalSettings::new(LoggingConfig::default()));

impl GlobalSettings {
    /// Create an explicitly owned settings slot.
    pub fn new(logging: LoggingConfig) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(GlobalSnapshot {
                logging,
                generation: 0,
            })),
        }
    }

    /// The process-wide instance.
    pub fn process() -> &'static GlobalSettings {
        &PROCESS
    }

    /// Current snapshot.
    pub fn load(&self) -> Arc<GlobalSnapshot> {
        self.inner.load_full()
    }

    /// Current log destinations.
    pub fn log_to(&self) -> LogTo {
        self.inner.load().logging.log_to
    }

    pub fn generation(&self) -> u64 {
        self.inner.load().generation
    }

    /// True if both handles share the same slot.
    pub fn ptr_eq(&self, other: &GlobalSettings) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Publish the logging policy parsed into `options`.
    ///
    /// Used to seed the slot from a freshly loaded configuration before any
    /// client is resolved. Returns the new generation, or `None` if the
    /// policy was already current.
    pub fn seed_from(&self, options: &OptionsRecord) -> Option<u64> {
        self.replace(options.parsed_logging().clone())
    }

    /// Publish a new logging policy.
    ///
    /// Returns the new generation, or `None` when the policy is identical to
    /// the current one and nothing was swapped. Callers must serialize
    /// writes; after startup the config watcher is the only writer.
    pub(crate) fn replace(&self, logging: LoggingConfig) -> Option<u64> {
        let current = self.inner.load();
        if current.logging == logging {
            return None;
        }
        let generation = current.generation + 1;
        self.inner.store(Arc::new(GlobalSnapshot { logging, generation }));
        Some(generation)
    }
}
