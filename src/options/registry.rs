//! Process-wide default options.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::config::loader::{load_snapshot, ConfigError};
use crate::config::snapshot::ConfigSnapshot;
use crate::options::parse::{parse_from, ConfigParseError};
use crate::options::record::OptionsRecord;

/// Holds the default [`OptionsRecord`] and mediates lookups.
///
/// The default is expected to be set during startup, before the first
/// client is resolved. Replacing it afterwards is allowed but clients that
/// were already built keep the options they were built with; which of the
/// two defaults a client resolved concurrently with the replacement sees is
/// unspecified.
#[derive(Debug, Default)]
pub struct OptionsRegistry {
    default: ArcSwapOption<OptionsRecord>,
    resolved: AtomicBool,
}

impl OptionsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the process-wide default. Last writer wins.
    pub fn set_default(&self, options: OptionsRecord) {
        if self.resolved.load(Ordering::Acquire) {
            tracing::warn!(
                region = ?options.region(),
                "Default options replaced after a client already resolved them; existing clients keep the previous options"
            );
        }
        self.default.store(Some(Arc::new(options)));
    }

    /// The current default, or `None` if never set.
    pub fn get_default(&self) -> Option<OptionsRecord> {
        self.default.load_full().map(|options| (*options).clone())
    }

    pub fn has_default(&self) -> bool {
        self.default.load().is_some()
    }

    /// Parse a configuration snapshot into an options record.
    pub fn parse_from(snapshot: &ConfigSnapshot) -> Result<OptionsRecord, ConfigParseError> {
        parse_from(snapshot)
    }

    /// Read, optionally narrow to a section, and parse a configuration file.
    pub fn load_file(path: &Path, section: Option<&str>) -> Result<OptionsRecord, ConfigError> {
        let snapshot = load_snapshot(path, section)?;
        Ok(parse_from(&snapshot)?)
    }

    /// Default lookup on behalf of a client resolution.
    pub(crate) fn default_for_resolution(&self) -> Option<OptionsRecord> {
        let options = self.get_default();
        if options.is_some() {
            self.resolved.store(true, Ordering::Release);
        }
        options
    }
}
