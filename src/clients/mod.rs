//! Service clients.
//!
//! # Responsibilities
//! - Define the generic `ServiceClient` capability
//! - Provide `GenericClient`, the built-in implementation
//!
//! # Design Decisions
//! - Region, endpoint and credentials are frozen at construction
//! - Logging reads the options' live policy on every call, so clients pick up
//!   a reload without being rebuilt
//! - Transport, signing and retries belong to concrete service clients and
//!   are out of scope here

use std::sync::Arc;

use crate::observability::logging::{emit, truncate_response};
use crate::options::{LogTo, OptionsRecord, Region};
use crate::registration::{Capability, Provider};

/// A client for some remote service.
pub trait ServiceClient: Send + Sync {
    fn service_name(&self) -> &str;

    fn options(&self) -> &OptionsRecord;

    fn region(&self) -> Option<&Region> {
        self.options().region()
    }

    /// Log an operation call. Returns the destinations written to.
    fn log_call(&self, operation: &str) -> LogTo {
        let logging = self.options().logging();
        emit(&logging, self.service_name(), &format!("calling {}", operation))
    }

    /// Log a response body according to the response-logging policy.
    fn record_response(&self, operation: &str, is_error: bool, body: &str) -> LogTo {
        let logging = self.options().logging();
        if !logging.should_log_response(is_error) {
            return LogTo::NONE;
        }
        let body = truncate_response(&logging, body);
        emit(
            &logging,
            self.service_name(),
            &format!("{} response (error: {}): {}", operation, is_error, body),
        )
    }
}

impl Capability for dyn ServiceClient {
    const SERVICE_NAME: &'static str = "Default";

    fn builtin_provider() -> Option<Provider<Self>> {
        Some(GenericClient::provider(<dyn ServiceClient as Capability>::SERVICE_NAME))
    }
}

/// A client that carries its options and nothing else.
#[derive(Debug, Clone)]
pub struct GenericClient {
    service: String,
    options: OptionsRecord,
}

impl GenericClient {
    pub fn new(service: impl Into<String>, options: OptionsRecord) -> Self {
        let service = service.into();
        tracing::debug!(
            service = %service,
            region = ?options.region(),
            endpoint = ?options.service_url(),
            "Generic client created"
        );
        Self { service, options }
    }

    /// Provider building a `GenericClient` for `service`.
    pub fn provider(service: &'static str) -> Provider<dyn ServiceClient> {
        Arc::new(move |options: OptionsRecord| Arc::new(GenericClient::new(service, options)) as Arc<dyn ServiceClient>)
    }
}

impl ServiceClient for GenericClient {
    fn service_name(&self) -> &str {
        &self.service
    }

    fn options(&self) -> &OptionsRecord {
        &self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{LoggingConfig, ResponseLogging};
    use crate::registration::Container;
    use crate::settings::GlobalSettings;

    #[test]
    fn test_builtin_provider_resolves_without_registration() {
        let container = Container::new();
        container.set_default_options(OptionsRecord::new().with_region(Region::parse("us-west-2").unwrap()));

        let client = container.resolve::<dyn ServiceClient>().unwrap();
        assert_eq!(client.service_name(), "Default");
        assert_eq!(client.region().unwrap().as_str(), "us-west-2");

        let again = container.resolve::<dyn ServiceClient>().unwrap();
        assert!(Arc::ptr_eq(&client, &again));
    }

    #[test]
    fn test_logging_follows_live_settings() {
        let parsed = LoggingConfig {
            log_to: LogTo::CONSOLE,
            log_responses: ResponseLogging::Always,
            ..LoggingConfig::default()
        };
        let settings = GlobalSettings::new(parsed.clone());
        let client = GenericClient::new(
            "S3",
            OptionsRecord::new()
                .with_logging(parsed.clone())
                .with_global_settings(settings.clone()),
        );
        assert_eq!(client.log_call("ListBuckets"), LogTo::CONSOLE);

        settings.replace(LoggingConfig {
            log_to: LogTo::NONE,
            ..parsed
        });
        assert_eq!(client.log_call("ListBuckets"), LogTo::NONE);
        assert_eq!(client.record_response("ListBuckets", false, "{}"), LogTo::NONE);
    }
}
