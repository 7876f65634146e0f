//! Snapshot → OptionsRecord parsing.
//!
//! # Recognized keys
//! ```text
//! Region                 string region code
//! Profile                credential profile name
//! ProfilesLocation       path to the credential profiles file
//! ServiceURL             explicit endpoint
//! LogTo                  "Console,Log4Net" or ["Console", "Log4Net"]
//! LogResponses           Never | OnError | Always
//! LogResponsesSizeLimit  non-negative integer
//! LogMetrics             bool
//! Services.<name>        { Region, ServiceURL, Profile }
//! ```
//! Unknown keys are ignored. Keys are matched case-insensitively.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::snapshot::{lookup, ConfigSnapshot};
use crate::config::validation::validate_service_url;
use crate::options::logging::{LogTo, LoggingConfig, ResponseLogging};
use crate::options::record::{CredentialRef, OptionsRecord, Region, ServiceOverride};

/// A configuration value was malformed or of the wrong type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid value for configuration key `{key}`: {message}")]
pub struct ConfigParseError {
    /// Dotted path of the offending key, e.g. `Services.S3.Region`.
    pub key: String,
    pub message: String,
}

impl ConfigParseError {
    fn new(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Parse a snapshot into an options record.
///
/// Deterministic: the same snapshot always yields an equal record.
pub fn parse_from(snapshot: &ConfigSnapshot) -> Result<OptionsRecord, ConfigParseError> {
    let root = snapshot
        .as_object()
        .ok_or_else(|| ConfigParseError::new("<root>", "expected an object"))?;

    let mut record = OptionsRecord::new();

    if let Some(region) = parse_region(root, "Region", "Region")? {
        record = record.with_region(region);
    }

    let mut credentials = match string_value(root, "Profile", "Profile")? {
        Some(profile) => CredentialRef::profile(profile),
        None => CredentialRef::ambient(),
    };
    if let Some(location) = string_value(root, "ProfilesLocation", "ProfilesLocation")? {
        credentials = credentials.with_location(location);
    }
    record = record.with_credentials(credentials);

    if let Some(url) = parse_service_url(root, "ServiceURL", "ServiceURL")? {
        record = record.with_service_url(url);
    }

    record = record.with_logging(parse_logging(root)?);

    if let Some(services) = lookup(root, "Services") {
        let services = services
            .as_object()
            .ok_or_else(|| ConfigParseError::new("Services", "expected an object keyed by service name"))?;
        for (name, block) in services {
            let path = format!("Services.{}", name);
            let block = block
                .as_object()
                .ok_or_else(|| ConfigParseError::new(path.clone(), "expected an object"))?;
            record = record.with_service(name.clone(), parse_service_block(block, &path)?);
        }
    }

    Ok(record)
}

fn parse_logging(root: &Map<String, Value>) -> Result<LoggingConfig, ConfigParseError> {
    let mut logging = LoggingConfig::default();

    if let Some(value) = lookup(root, "LogTo") {
        logging.log_to = parse_log_to(value)?;
    }

    if let Some(policy) = string_value(root, "LogResponses", "LogResponses")? {
        logging.log_responses = policy
            .parse::<ResponseLogging>()
            .map_err(|e| ConfigParseError::new("LogResponses", e.to_string()))?;
    }

    if let Some(value) = lookup(root, "LogResponsesSizeLimit") {
        logging.log_responses_size_limit = parse_size(value)
            .ok_or_else(|| ConfigParseError::new("LogResponsesSizeLimit", "expected a non-negative integer"))?;
    }

    if let Some(value) = lookup(root, "LogMetrics") {
        logging.log_metrics = parse_bool(value)
            .ok_or_else(|| ConfigParseError::new("LogMetrics", "expected true or false"))?;
    }

    Ok(logging)
}

fn parse_log_to(value: &Value) -> Result<LogTo, ConfigParseError> {
    match value {
        Value::String(list) => list
            .parse::<LogTo>()
            .map_err(|e| ConfigParseError::new("LogTo", e.to_string())),
        Value::Array(items) if !items.is_empty() => {
            let mut set = LogTo::NONE;
            for item in items {
                let token = item
                    .as_str()
                    .ok_or_else(|| ConfigParseError::new("LogTo", "expected a list of strings"))?;
                set |= LogTo::parse_token(token)
                    .ok_or_else(|| ConfigParseError::new("LogTo", format!("unknown log destination '{}'", token)))?;
            }
            Ok(set)
        }
        _ => Err(ConfigParseError::new(
            "LogTo",
            "expected a comma-separated string or a non-empty list",
        )),
    }
}

fn parse_service_block(block: &Map<String, Value>, path: &str) -> Result<ServiceOverride, ConfigParseError> {
    Ok(ServiceOverride {
        region: parse_region(block, "Region", &format!("{}.Region", path))?,
        service_url: parse_service_url(block, "ServiceURL", &format!("{}.ServiceURL", path))?,
        profile: string_value(block, "Profile", &format!("{}.Profile", path))?,
    })
}

fn parse_region(map: &Map<String, Value>, key: &str, path: &str) -> Result<Option<Region>, ConfigParseError> {
    match string_value(map, key, path)? {
        Some(code) => Region::parse(&code)
            .map(Some)
            .map_err(|e| ConfigParseError::new(path, e.0)),
        None => Ok(None),
    }
}

fn parse_service_url(map: &Map<String, Value>, key: &str, path: &str) -> Result<Option<String>, ConfigParseError> {
    match string_value(map, key, path)? {
        Some(url) => {
            validate_service_url(&url).map_err(|e| ConfigParseError::new(path, e))?;
            Ok(Some(url))
        }
        None => Ok(None),
    }
}

fn string_value(map: &Map<String, Value>, key: &str, path: &str) -> Result<Option<String>, ConfigParseError> {
    match lookup(map, key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(ConfigParseError::new(
            path,
            format!("expected a string, got {}", type_name(other)),
        )),
    }
}

/// Numbers may arrive as JSON numbers or as numeric strings.
fn parse_size(value: &Value) -> Option<usize> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn parse_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) if s.trim().eq_ignore_ascii_case("true") => Some(true),
        Value::String(s) if s.trim().eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
