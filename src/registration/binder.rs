//! Binding capabilities to providers.
//!
//! # Responsibilities
//! - Unconditional registration (`bind`), replacing any prior entry
//! - If-absent registration (`bind_if_absent`), never clobbering an entry
//! - Options precedence: override > registered default > built-in default

use std::any::TypeId;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;

use crate::options::{OptionsRecord, OptionsRegistry};
use crate::registration::bindings::{Binding, BindingTable, Bound, Lifetime, OptionsSource};
use crate::registration::capability::Capability;

/// Registers client capabilities against providers.
///
/// Check-then-act in the if-absent variants runs under the table's shard
/// lock, so concurrent registration after startup is safe.
pub struct ServiceBinder {
    table: Arc<BindingTable>,
    options: Arc<OptionsRegistry>,
}

impl ServiceBinder {
    pub(crate) fn new(table: Arc<BindingTable>, options: Arc<OptionsRegistry>) -> Self {
        Self { table, options }
    }

    /// Register `T` as a singleton, replacing any prior registration.
    pub fn bind<T: Capability + ?Sized>(
        &self,
        provider: impl Fn(OptionsRecord) -> Arc<T> + Send + Sync + 'static,
        options: Option<OptionsRecord>,
    ) {
        self.bind_with_lifetime(provider, options, Lifetime::Singleton);
    }

    /// Register `T`, replacing any prior registration.
    pub fn bind_with_lifetime<T: Capability + ?Sized>(
        &self,
        provider: impl Fn(OptionsRecord) -> Arc<T> + Send + Sync + 'static,
        options: Option<OptionsRecord>,
        lifetime: Lifetime,
    ) {
        let binding = Binding::provider::<T>(Arc::new(provider), options.into(), lifetime);
        self.insert::<T>(binding);
    }

    /// Register `T` as a singleton unless anything is already registered.
    ///
    /// Returns `true` if the registration took place. The provider is never
    /// invoked here in either case.
    pub fn bind_if_absent<T: Capability + ?Sized>(
        &self,
        provider: impl Fn(OptionsRecord) -> Arc<T> + Send + Sync + 'static,
        options: Option<OptionsRecord>,
    ) -> bool {
        self.bind_if_absent_with_lifetime(provider, options, Lifetime::Singleton)
    }

    pub fn bind_if_absent_with_lifetime<T: Capability + ?Sized>(
        &self,
        provider: impl Fn(OptionsRecord) -> Arc<T> + Send + Sync + 'static,
        options: Option<OptionsRecord>,
        lifetime: Lifetime,
    ) -> bool {
        self.insert_if_absent::<T>(|| Binding::provider::<T>(Arc::new(provider), options.into(), lifetime))
    }

    /// Pre-register a ready-made instance, replacing any prior registration.
    pub fn add_instance<T: Capability + ?Sized>(&self, instance: Arc<T>) {
        self.insert::<T>(Binding::instance(instance));
    }

    /// Pre-register a ready-made instance unless anything is already registered.
    pub fn try_add_instance<T: Capability + ?Sized>(&self, instance: Arc<T>) -> bool {
        self.insert_if_absent::<T>(|| Binding::instance(instance))
    }

    pub fn is_bound<T: Capability + ?Sized>(&self) -> bool {
        self.table.contains_key(&TypeId::of::<T>())
    }

    /// Remove any registration for `T`.
    pub fn unbind<T: Capability + ?Sized>(&self) -> bool {
        self.table.remove(&TypeId::of::<T>()).is_some()
    }

    /// Options a provider for `T` would receive right now.
    pub fn resolve_options<T: Capability + ?Sized>(&self) -> OptionsRecord {
        let source = match self.bound::<T>() {
            Some(Bound::Provider { source, .. }) => source,
            _ => OptionsSource::Default,
        };
        self.options_for::<T>(&source)
    }

    /// Apply the precedence rule to a binding's options source.
    pub(crate) fn options_for<T: Capability + ?Sized>(&self, source: &OptionsSource) -> OptionsRecord {
        match source {
            OptionsSource::Override(options) => options.clone(),
            OptionsSource::Default => match self.options.default_for_resolution() {
                Some(default) => default.for_service(T::SERVICE_NAME),
                None => {
                    tracing::debug!(service = T::SERVICE_NAME, "No default options registered, using built-in defaults");
                    T::builtin_options()
                }
            },
        }
    }

    pub(crate) fn bound<T: Capability + ?Sized>(&self) -> Option<Bound<T>> {
        self.table
            .get(&TypeId::of::<T>())
            .and_then(|binding| binding.view::<T>())
    }

    fn insert<T: Capability + ?Sized>(&self, binding: Binding) {
        let kind = binding.kind();
        match self.table.insert(TypeId::of::<T>(), binding) {
            Some(previous) => tracing::debug!(
                capability = std::any::type_name::<T>(),
                kind,
                replaced = previous.kind(),
                "Registration replaced"
            ),
            None => tracing::debug!(capability = std::any::type_name::<T>(), kind, "Registered"),
        }
    }

    fn insert_if_absent<T: Capability + ?Sized>(&self, make: impl FnOnce() -> Binding) -> bool {
        match self.table.entry(TypeId::of::<T>()) {
            Entry::Occupied(existing) => {
                tracing::debug!(
                    capability = std::any::type_name::<T>(),
                    existing = existing.get().kind(),
                    "Already registered, skipping"
                );
                false
            }
            Entry::Vacant(slot) => {
                let binding = make();
                tracing::debug!(capability = std::any::type_name::<T>(), kind = binding.kind(), "Registered");
                slot.insert(binding);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Region;

    trait Probe: Send + Sync {
        fn region(&self) -> Option<String>;
    }

    impl Capability for dyn Probe {
        const SERVICE_NAME: &'static str = "Probe";

        fn builtin_options() -> OptionsRecord {
            OptionsRecord::new().with_region(Region::parse("ap-northeast-1").unwrap())
        }
    }

    struct Fixed(Option<String>);

    impl Probe for Fixed {
        fn region(&self) -> Option<String> {
            self.0.clone()
        }
    }

    fn probe(options: OptionsRecord) -> Arc<dyn Probe> {
        Arc::new(Fixed(options.region().map(|r| r.to_string())))
    }

    fn binder() -> (ServiceBinder, Arc<OptionsRegistry>) {
        let options = Arc::new(OptionsRegistry::new());
        (ServiceBinder::new(Arc::new(BindingTable::new()), options.clone()), options)
    }

    fn region(code: &str) -> OptionsRecord {
        OptionsRecord::new().with_region(Region::parse(code).unwrap())
    }

    #[test]
    fn test_builtin_options_when_nothing_registered() {
        let (binder, _) = binder();
        binder.bind::<dyn Probe>(probe, None);
        assert_eq!(binder.resolve_options::<dyn Probe>().region().unwrap().as_str(), "ap-northeast-1");
    }

    #[test]
    fn test_default_then_override() {
        let (binder, registry) = binder();
        registry.set_default(region("us-west-2"));

        binder.bind::<dyn Probe>(probe, None);
        assert_eq!(binder.resolve_options::<dyn Probe>().region().unwrap().as_str(), "us-west-2");

        binder.bind::<dyn Probe>(probe, Some(region("eu-central-1")));
        assert_eq!(binder.resolve_options::<dyn Probe>().region().unwrap().as_str(), "eu-central-1");
    }

    #[test]
    fn test_override_wins_regardless_of_order() {
        let (binder, registry) = binder();
        binder.bind::<dyn Probe>(probe, Some(region("eu-central-1")));
        registry.set_default(region("us-west-2"));
        assert_eq!(binder.resolve_options::<dyn Probe>().region().unwrap().as_str(), "eu-central-1");
    }

    #[test]
    fn test_bind_if_absent_keeps_first() {
        let (binder, _) = binder();
        assert!(binder.bind_if_absent::<dyn Probe>(probe, Some(region("us-east-1"))));
        assert!(!binder.bind_if_absent::<dyn Probe>(probe, Some(region("eu-west-1"))));
        assert_eq!(binder.resolve_options::<dyn Probe>().region().unwrap().as_str(), "us-east-1");
    }

    #[test]
    fn test_instance_blocks_if_absent() {
        let (binder, _) = binder();
        binder.add_instance::<dyn Probe>(Arc::new(Fixed(None)));
        assert!(!binder.bind_if_absent::<dyn Probe>(probe, None));
        assert!(!binder.try_add_instance::<dyn Probe>(Arc::new(Fixed(None))));
        assert!(matches!(binder.bound::<dyn Probe>(), Some(Bound::Instance { .. })));

        assert!(binder.unbind::<dyn Probe>());
        assert!(!binder.is_bound::<dyn Probe>());
    }
}
