//! Client construction.

use std::any::TypeId;
use std::sync::Arc;

use thiserror::Error;

use crate::observability::metrics;
use crate::options::OptionsRecord;
use crate::registration::bindings::{BindingTable, Bound};
use crate::registration::capability::{Capability, Provider};

/// Resolution requested for a capability with no provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no provider registered for capability `{capability}`")]
pub struct UnregisteredCapabilityError {
    pub capability: &'static str,
}

impl UnregisteredCapabilityError {
    pub fn of<T: ?Sized>() -> Self {
        Self {
            capability: std::any::type_name::<T>(),
        }
    }
}

/// Invokes registered providers. Never memoizes; identity is the
/// container's concern.
pub struct ClientFactory {
    table: Arc<BindingTable>,
}

impl ClientFactory {
    pub(crate) fn new(table: Arc<BindingTable>) -> Self {
        Self { table }
    }

    /// Build a fresh `T` from `options` using its registered provider, or
    /// its built-in provider if none is registered.
    pub fn create<T: Capability + ?Sized>(&self, options: OptionsRecord) -> Result<Arc<T>, UnregisteredCapabilityError> {
        let registered = self
            .table
            .get(&TypeId::of::<T>())
            .and_then(|binding| match binding.view::<T>() {
                Some(Bound::Provider { provider, .. }) => Some(provider),
                _ => None,
            });

        let provider = registered
            .or_else(T::builtin_provider)
            .ok_or_else(UnregisteredCapabilityError::of::<T>)?;
        Ok(self.build(&provider, options))
    }

    pub(crate) fn build<T: Capability + ?Sized>(&self, provider: &Provider<T>, options: OptionsRecord) -> Arc<T> {
        tracing::debug!(
            capability = std::any::type_name::<T>(),
            service = T::SERVICE_NAME,
            region = options.region().map(|r| r.as_str()).unwrap_or("<unset>"),
            "Constructing client"
        );
        metrics::record_client_construction(T::SERVICE_NAME);
        provider(options)
    }
}
