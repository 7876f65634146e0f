//! The immutable options record used to construct clients.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

use crate::config::validation::validate_region;
use crate::options::logging::{LogTo, LoggingConfig};
use crate::settings::GlobalSettings;

/// Environment variable consulted for the built-in default region.
pub const REGION_ENV_VAR: &str = "CLIENT_SETUP_REGION";

/// Environment variable consulted for the built-in default credential profile.
pub const PROFILE_ENV_VAR: &str = "CLIENT_SETUP_PROFILE";

/// Returned when a string is not a valid region code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid region: {0}")]
pub struct InvalidRegion(pub String);

/// A validated region code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Region(String);

impl Region {
    pub fn parse(code: &str) -> Result<Self, InvalidRegion> {
        validate_region(code).map_err(InvalidRegion)?;
        Ok(Self(code.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Region {
    type Err = InvalidRegion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Region::parse(s)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque reference to the credentials a client should use.
///
/// Resolving the reference into actual credentials is the job of the
/// client's own credential chain; this crate only carries the handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CredentialRef {
    profile: Option<String>,
    profiles_location: Option<PathBuf>,
}

impl CredentialRef {
    /// Use whatever the ambient credential chain finds.
    pub fn ambient() -> Self {
        Self::default()
    }

    pub fn profile(name: impl Into<String>) -> Self {
        Self {
            profile: Some(name.into()),
            profiles_location: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<PathBuf>) -> Self {
        self.profiles_location = Some(location.into());
        self
    }

    pub fn profile_name(&self) -> Option<&str> {
        self.profile.as_deref()
    }

    pub fn profiles_location(&self) -> Option<&PathBuf> {
        self.profiles_location.as_ref()
    }

    pub fn is_ambient(&self) -> bool {
        self.profile.is_none() && self.profiles_location.is_none()
    }
}

/// Per-service override block.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ServiceOverride {
    pub region: Option<Region>,
    pub service_url: Option<String>,
    pub profile: Option<String>,
}

/// Immutable bundle of client construction parameters.
///
/// The logging fields can be attached to a [`GlobalSettings`] slot with
/// [`OptionsRecord::with_global_settings`]; once attached, [`logging`] and
/// [`log_to`] read the live policy while region and credentials stay fixed.
///
/// [`logging`]: OptionsRecord::logging
/// [`log_to`]: OptionsRecord::log_to
#[derive(Debug, Clone, Default)]
pub struct OptionsRecord {
    region: Option<Region>,
    credentials: CredentialRef,
    service_url: Option<String>,
    logging: LoggingConfig,
    services: BTreeMap<String, ServiceOverride>,
    live: Option<GlobalSettings>,
}

impl OptionsRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in default: region and profile discovered from the environment.
    pub fn from_environment() -> Self {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Built-in default using a custom variable lookup.
    ///
    /// An unset or invalid region variable leaves the region unset.
    pub fn from_env_with<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let region = lookup(REGION_ENV_VAR).and_then(|code| match Region::parse(code.trim()) {
            Ok(region) => Some(region),
            Err(e) => {
                tracing::warn!(variable = REGION_ENV_VAR, error = %e, "Ignoring region from environment");
                None
            }
        });
        let credentials = lookup(PROFILE_ENV_VAR)
            .filter(|p| !p.trim().is_empty())
            .map(CredentialRef::profile)
            .unwrap_or_default();

        Self {
            region,
            credentials,
            ..Self::default()
        }
    }

    pub fn with_region(mut self, region: Region) -> Self {
        self.region = Some(region);
        self
    }

    pub fn with_credentials(mut self, credentials: CredentialRef) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_service_url(mut self, url: impl Into<String>) -> Self {
        self.service_url = Some(url.into());
        self
    }

    pub fn with_logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = logging;
        self
    }

    pub fn with_service(mut self, name: impl Into<String>, block: ServiceOverride) -> Self {
        self.services.insert(name.into(), block);
        self
    }

    /// Make the logging fields of this record follow `settings`.
    pub fn with_global_settings(mut self, settings: GlobalSettings) -> Self {
        self.live = Some(settings);
        self
    }

    pub fn region(&self) -> Option<&Region> {
        self.region.as_ref()
    }

    pub fn credentials(&self) -> &CredentialRef {
        &self.credentials
    }

    pub fn service_url(&self) -> Option<&str> {
        self.service_url.as_deref()
    }

    /// Logging policy as parsed, ignoring any live attachment.
    pub fn parsed_logging(&self) -> &LoggingConfig {
        &self.logging
    }

    /// Effective logging policy.
    pub fn logging(&self) -> LoggingConfig {
        match &self.live {
            Some(settings) => settings.load().logging.clone(),
            None => self.logging.clone(),
        }
    }

    /// Effective log destinations.
    pub fn log_to(&self) -> LogTo {
        match &self.live {
            Some(settings) => settings.log_to(),
            None => self.logging.log_to,
        }
    }

    pub fn global_settings(&self) -> Option<&GlobalSettings> {
        self.live.as_ref()
    }

    pub fn services(&self) -> &BTreeMap<String, ServiceOverride> {
        &self.services
    }

    pub fn service(&self, name: &str) -> Option<&ServiceOverride> {
        self.services.get(name)
    }

    /// This record with the named service block applied on top.
    ///
    /// Missing blocks and unset block fields leave the record unchanged.
    pub fn for_service(&self, name: &str) -> OptionsRecord {
        let mut resolved = self.clone();
        if let Some(block) = self.services.get(name) {
            if let Some(region) = &block.region {
                resolved.region = Some(region.clone());
            }
            if let Some(url) = &block.service_url {
                resolved.service_url = Some(url.clone());
            }
            if let Some(profile) = &block.profile {
                resolved.credentials.profile = Some(profile.clone());
            }
        }
        resolved
    }
}

impl PartialEq for OptionsRecord {
    /// Field equality; a live settings attachment is not part of the value.
    fn eq(&self, other: &Self) -> bool {
        self.region == other.region
            && self.credentials == other.credentials
            && self.service_url == other.service_url
            && self.logging == other.logging
            && self.services == other.services
    }
}

impl Eq for OptionsRecord {}
