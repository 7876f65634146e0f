//! Logging policy values shared by every constructed client.
//!
//! # Responsibilities
//! - Represent the set of log destinations as a bit-set
//! - Parse destination and response-logging tokens from configuration
//! - Decide whether a response should be logged under the current policy

use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::str::FromStr;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Set of destinations client log output is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LogTo(u8);

impl LogTo {
    pub const NONE: LogTo = LogTo(0);
    pub const LOG4NET: LogTo = LogTo(1);
    pub const SYSTEM_DIAGNOSTICS: LogTo = LogTo(1 << 1);
    pub const CONSOLE: LogTo = LogTo(1 << 4);

    const NAMED: [(&'static str, LogTo); 3] = [
        ("Log4Net", LogTo::LOG4NET),
        ("SystemDiagnostics", LogTo::SYSTEM_DIAGNOSTICS),
        ("Console", LogTo::CONSOLE),
    ];

    /// Raw bit representation.
    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True if every destination in `other` is also in `self`.
    pub fn contains(self, other: LogTo) -> bool {
        self.0 & other.0 == other.0
    }

    /// Iterate the individual destinations in this set.
    pub fn iter(self) -> impl Iterator<Item = LogTo> {
        Self::NAMED
            .into_iter()
            .map(|(_, flag)| flag)
            .filter(move |flag| self.contains(*flag))
    }

    /// Configuration token for a single destination.
    pub fn name(self) -> Option<&'static str> {
        Self::NAMED
            .iter()
            .find(|(_, flag)| *flag == self)
            .map(|(name, _)| *name)
    }

    /// Parse a single destination token, case-insensitively.
    pub fn parse_token(token: &str) -> Option<LogTo> {
        let token = token.trim();
        if token.eq_ignore_ascii_case("None") {
            return Some(LogTo::NONE);
        }
        Self::NAMED
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(token))
            .map(|(_, flag)| *flag)
    }
}

impl BitOr for LogTo {
    type Output = LogTo;

    fn bitor(self, rhs: LogTo) -> LogTo {
        LogTo(self.0 | rhs.0)
    }
}

impl BitOrAssign for LogTo {
    fn bitor_assign(&mut self, rhs: LogTo) {
        self.0 |= rhs.0;
    }
}

/// Error returned when a destination list contains an unknown token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown log destination '{0}'")]
pub struct UnknownLogDestination(pub String);

/// Error returned for a response-logging policy other than Never, OnError or Always.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected Never, OnError or Always, got '{0}'")]
pub struct UnknownResponseLogging(pub String);

impl FromStr for LogTo {
    type Err = UnknownLogDestination;

    /// Parses a comma-separated list such as `Console,Log4Net`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(UnknownLogDestination(String::new()));
        }
        let mut set = LogTo::NONE;
        for token in s.split(',') {
            set |= LogTo::parse_token(token)
                .ok_or_else(|| UnknownLogDestination(token.trim().to_string()))?;
        }
        Ok(set)
    }
}

impl fmt::Display for LogTo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("None");
        }
        let names: Vec<&str> = self.iter().filter_map(LogTo::name).collect();
        f.write_str(&names.join(","))
    }
}

impl Serialize for LogTo {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// When responses from a remote service are logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum ResponseLogging {
    #[default]
    Never,
    OnError,
    Always,
}

impl FromStr for ResponseLogging {
    type Err = UnknownResponseLogging;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("Never") {
            Ok(ResponseLogging::Never)
        } else if s.eq_ignore_ascii_case("OnError") {
            Ok(ResponseLogging::OnError)
        } else if s.eq_ignore_ascii_case("Always") {
            Ok(ResponseLogging::Always)
        } else {
            Err(UnknownResponseLogging(s.to_string()))
        }
    }
}

/// Default cap on the number of response bytes written to a log.
pub const DEFAULT_RESPONSE_SIZE_LIMIT: usize = 1024;

/// The logging subset of a configuration snapshot.
///
/// This is the part of the configuration that applies process-wide and is
/// swapped live by the config watcher.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct LoggingConfig {
    pub log_to: LogTo,
    pub log_responses: ResponseLogging,
    pub log_responses_size_limit: usize,
    pub log_metrics: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_to: LogTo::NONE,
            log_responses: ResponseLogging::Never,
            log_responses_size_limit: DEFAULT_RESPONSE_SIZE_LIMIT,
            log_metrics: false,
        }
    }
}

impl LoggingConfig {
    /// Whether a response with the given outcome should be logged.
    pub fn should_log_response(&self, is_error: bool) -> bool {
        if self.log_to.is_empty() {
            return false;
        }
        match self.log_responses {
            ResponseLogging::Never => false,
            ResponseLogging::OnError => is_error,
            ResponseLogging::Always => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list() {
        let set: LogTo = "Console,Log4Net".parse().unwrap();
        assert_eq!(set, LogTo::CONSOLE | LogTo::LOG4NET);

        let set: LogTo = " console , systemdiagnostics ".parse().unwrap();
        assert_eq!(set, LogTo::CONSOLE | LogTo::SYSTEM_DIAGNOSTICS);

        assert_eq!("None".parse::<LogTo>().unwrap(), LogTo::NONE);
    }

    #[test]
    fn test_parse_rejects_unknown_and_empty() {
        let err = "Console,Syslog".parse::<LogTo>().unwrap_err();
        assert_eq!(err.0, "Syslog");
        assert!("".parse::<LogTo>().is_err());
    }

    #[test]
    fn test_parse_errors_are_std_errors() {
        let err: Box<dyn std::error::Error> = Box::new("Syslog".parse::<LogTo>().unwrap_err());
        assert_eq!(err.to_string(), "unknown log destination 'Syslog'");

        let err = " sometimes ".parse::<ResponseLogging>().unwrap_err();
        assert_eq!(err, UnknownResponseLogging("sometimes".to_string()));
        let err: Box<dyn std::error::Error> = Box::new(err);
        assert_eq!(err.to_string(), "expected Never, OnError or Always, got 'sometimes'");
        assert_eq!("onerror".parse::<ResponseLogging>().unwrap(), ResponseLogging::OnError);
    }

    #[test]
    fn test_display_round_trip() {
        let set = LogTo::CONSOLE | LogTo::LOG4NET;
        assert_eq!(set.to_string(), "Log4Net,Console");
        assert_eq!(LogTo::NONE.to_string(), "None");
    }

    #[test]
    fn test_response_policy() {
        let mut logging = LoggingConfig {
            log_to: LogTo::CONSOLE,
            log_responses: ResponseLogging::OnError,
            ..LoggingConfig::default()
        };
        assert!(logging.should_log_response(true));
        assert!(!logging.should_log_response(false));

        logging.log_to = LogTo::NONE;
        assert!(!logging.should_log_response(true));
    }
}
