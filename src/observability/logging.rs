//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber for the binary
//! - Route client log lines to the destinations enabled in `LogTo`

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::options::{LogTo, LoggingConfig};

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "client_setup=info";

/// Install the global tracing subscriber. Safe to call more than once; later
/// calls are ignored.
pub fn init_tracing(default_filter: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Write a client log line to every destination enabled in `logging`.
///
/// Returns the destinations written to.
pub fn emit(logging: &LoggingConfig, service: &str, message: &str) -> LogTo {
    let mut written = LogTo::NONE;
    for destination in logging.log_to.iter() {
        match destination {
            LogTo::CONSOLE => tracing::info!(target: "client_setup::console", service, "{}", message),
            LogTo::LOG4NET => tracing::info!(target: "client_setup::log4net", service, "{}", message),
            LogTo::SYSTEM_DIAGNOSTICS => {
                tracing::info!(target: "client_setup::system_diagnostics", service, "{}", message)
            }
            _ => continue,
        }
        written |= destination;
    }
    written
}

/// Truncate a response body to the configured size limit for logging.
pub fn truncate_response<'a>(logging: &LoggingConfig, body: &'a str) -> &'a str {
    let limit = logging.log_responses_size_limit;
    if body.len() <= limit {
        return body;
    }
    let mut end = limit;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
