//! Configuration value validation.
//!
//! # Responsibilities
//! - Semantic checks on scalar values (serde only checks shape)
//! - Region code format
//! - Service endpoint URL format
//!
//! # Design Decisions
//! - Pure functions: `&str → Result<(), String>`; callers attach the key name
//! - Lenient on region names: any `area-location-N` style code passes, so new
//!   regions do not need a crate release

/// Validate a region code such as `us-west-2` or `us-gov-east-1`.
pub fn validate_region(code: &str) -> Result<(), String> {
    if code.is_empty() {
        return Err("region must not be empty".to_string());
    }
    if code.trim() != code {
        return Err(format!("region '{}' has surrounding whitespace", code));
    }

    let parts: Vec<&str> = code.split('-').collect();
    if parts.len() < 3 {
        return Err(format!("region '{}' is not of the form area-location-number", code));
    }
    if parts.iter().any(|p| p.is_empty()) {
        return Err(format!("region '{}' contains an empty segment", code));
    }

    let (last, head) = parts.split_last().ok_or_else(|| format!("invalid region '{}'", code))?;
    if !last.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!("region '{}' must end in a number", code));
    }
    for part in head {
        if !part.chars().all(|c| c.is_ascii_lowercase()) {
            return Err(format!("region '{}' must be lowercase letters and digits", code));
        }
    }
    Ok(())
}

/// Validate an explicit service endpoint.
pub fn validate_service_url(url: &str) -> Result<(), String> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .ok_or_else(|| format!("service URL '{}' must start with http:// or https://", url))?;

    let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
    if host.is_empty() {
        return Err(format!("service URL '{}' has no host", url));
    }
    if url.chars().any(char::is_whitespace) {
        return Err(format!("service URL '{}' contains whitespace", url));
    }
    Ok(())
}
