//! The dependency container: owns registrations and memoized clients.

use std::any::{Any, TypeId};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::options::{OptionsRecord, OptionsRegistry};
use crate::registration::binder::ServiceBinder;
use crate::registration::bindings::{BindingTable, Bound, Lifetime, OptionsSource};
use crate::registration::capability::Capability;
use crate::registration::factory::{ClientFactory, UnregisteredCapabilityError};

/// Memo key for clients built by a capability's built-in provider.
const BUILTIN_BINDING: u64 = 0;

struct Memo {
    binding_id: u64,
    /// Holds an `Arc<T>`.
    instance: Box<dyn Any + Send + Sync>,
}

/// Wires the options registry, binder and factory together and memoizes
/// singleton clients.
///
/// A memoized client is tied to the binding it was built from; rebinding a
/// capability makes the next resolution build from the new binding.
pub struct Container {
    options: Arc<OptionsRegistry>,
    binder: ServiceBinder,
    factory: ClientFactory,
    singletons: DashMap<TypeId, Memo>,
}

impl Container {
    pub fn new() -> Self {
        Self::with_options(Arc::new(OptionsRegistry::new()))
    }

    pub fn with_options(options: Arc<OptionsRegistry>) -> Self {
        let table = Arc::new(BindingTable::new());
        Self {
            binder: ServiceBinder::new(table.clone(), options.clone()),
            factory: ClientFactory::new(table),
            options,
            singletons: DashMap::new(),
        }
    }

    pub fn options(&self) -> &Arc<OptionsRegistry> {
        &self.options
    }

    pub fn binder(&self) -> &ServiceBinder {
        &self.binder
    }

    pub fn factory(&self) -> &ClientFactory {
        &self.factory
    }

    /// Shorthand for `options().set_default(..)`.
    pub fn set_default_options(&self, options: OptionsRecord) {
        self.options.set_default(options);
    }

    /// Resolve the client registered for `T`.
    ///
    /// Pre-registered instances are returned as is. Singletons are built on
    /// first use and shared; transients are built on every call. If nothing
    /// is registered, the capability's built-in provider is used as a
    /// singleton.
    pub fn resolve<T: Capability + ?Sized>(&self) -> Result<Arc<T>, UnregisteredCapabilityError> {
        match self.binder.bound::<T>() {
            Some(Bound::Instance { instance, .. }) => Ok(instance),
            Some(Bound::Provider { id, provider, source, lifetime }) => {
                let build = || self.factory.build(&provider, self.binder.options_for::<T>(&source));
                Ok(match lifetime {
                    Lifetime::Transient => build(),
                    Lifetime::Singleton => self.memoized::<T>(id, build),
                })
            }
            None => {
                let provider = T::builtin_provider().ok_or_else(|| {
                    tracing::error!(capability = std::any::type_name::<T>(), "Capability not registered");
                    UnregisteredCapabilityError::of::<T>()
                })?;
                Ok(self.memoized::<T>(BUILTIN_BINDING, || {
                    self.factory
                        .build(&provider, self.binder.options_for::<T>(&OptionsSource::Default))
                }))
            }
        }
    }

    /// Drop every memoized client; the next resolution rebuilds them.
    pub fn clear_singletons(&self) {
        self.singletons.clear();
    }

    fn cached<T: Capability + ?Sized>(memo: &Memo, binding_id: u64) -> Option<Arc<T>> {
        if memo.binding_id != binding_id {
            return None;
        }
        memo.instance.downcast_ref::<Arc<T>>().cloned()
    }

    /// The provider runs without any container lock held, so it may itself
    /// resolve other capabilities. Two racing first resolutions may both
    /// build; the first stored instance is the one everybody gets.
    fn memoized<T: Capability + ?Sized>(&self, binding_id: u64, build: impl FnOnce() -> Arc<T>) -> Arc<T> {
        let key = TypeId::of::<T>();
        if let Some(hit) = self
            .singletons
            .get(&key)
            .and_then(|memo| Self::cached::<T>(&memo, binding_id))
        {
            return hit;
        }

        let instance = build();
        match self.singletons.entry(key) {
            Entry::Occupied(mut existing) => {
                if let Some(winner) = Self::cached::<T>(existing.get(), binding_id) {
                    return winner;
                }
                existing.insert(Memo {
                    binding_id,
                    instance: Box::new(instance.clone()),
                });
            }
            Entry::Vacant(slot) => {
                slot.insert(Memo {
                    binding_id,
                    instance: Box::new(instance.clone()),
                });
            }
        }
        instance
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}
