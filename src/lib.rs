//! Configuration-driven client registration.
//!
//! Registers default options for a family of service clients, lets each
//! client type override them, and keeps process-wide settings in sync with a
//! watched configuration file.

pub mod clients;
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod options;
pub mod registration;
pub mod settings;

pub use config::{ConfigSnapshot, ConfigWatcher, WatchOptions};
pub use options::{OptionsRecord, OptionsRegistry};
pub use registration::{Capability, Container, ServiceBinder};
pub use settings::GlobalSettings;
