//! Capability types: the registration key for clients.

use std::sync::Arc;

use crate::options::OptionsRecord;

/// Builds a client for capability `T` from resolved options.
pub type Provider<T> = Arc<dyn Fn(OptionsRecord) -> Arc<T> + Send + Sync>;

/// An abstract client interface that can be registered and resolved.
///
/// Usually implemented for a trait object:
///
/// ```
/// use client_setup::registration::Capability;
///
/// pub trait ObjectStore: Send + Sync {
///     fn bucket_count(&self) -> usize;
/// }
///
/// impl Capability for dyn ObjectStore {
///     const SERVICE_NAME: &'static str = "S3";
/// }
/// ```
pub trait Capability: Send + Sync + 'static {
    /// Service name used to pick the per-service block of the default options.
    const SERVICE_NAME: &'static str;

    /// Options used when neither an override nor a registered default exists.
    fn builtin_options() -> OptionsRecord {
        OptionsRecord::from_environment()
    }

    /// Provider used when nothing was registered for this capability.
    fn builtin_provider() -> Option<Provider<Self>> {
        None
    }
}
