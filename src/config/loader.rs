//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::snapshot::ConfigSnapshot;
use crate::options::parse::ConfigParseError;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Section '{0}' not found in configuration")]
    MissingSection(String),

    #[error(transparent)]
    Parse(#[from] ConfigParseError),
}

/// Source format of a configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Toml,
}

impl Format {
    /// Pick a format from the file extension; anything but `.toml` is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Format::Toml,
            _ => Format::Json,
        }
    }
}

/// Parse file content in the given format.
pub fn parse_snapshot(content: &str, format: Format) -> Result<ConfigSnapshot, ConfigError> {
    let snapshot = match format {
        Format::Json => ConfigSnapshot::from_json_str(content)?,
        Format::Toml => ConfigSnapshot::from_toml_str(content)?,
    };
    Ok(snapshot)
}

/// Read a configuration file and optionally narrow it to a section.
pub fn load_snapshot(path: &Path, section: Option<&str>) -> Result<ConfigSnapshot, ConfigError> {
    let content = fs::read_to_string(path)?;
    let snapshot = parse_snapshot(&content, Format::from_path(path))?;

    match section {
        Some(name) => snapshot
            .section(name)
            .ok_or_else(|| ConfigError::MissingSection(name.to_string())),
        None => Ok(snapshot),
    }
}
