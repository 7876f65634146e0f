//! Type-keyed binding table shared by the binder, factory and container.

use std::any::{Any, TypeId};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use crate::options::OptionsRecord;
use crate::registration::capability::{Capability, Provider};

/// How long a resolved client lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lifetime {
    /// Built once on first resolution and shared afterwards.
    #[default]
    Singleton,
    /// Built on every resolution.
    Transient,
}

/// Where the options handed to a provider come from.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionsSource {
    /// Used verbatim.
    Override(OptionsRecord),
    /// Registered default, else the capability's built-in default.
    Default,
}

impl From<Option<OptionsRecord>> for OptionsSource {
    fn from(options: Option<OptionsRecord>) -> Self {
        match options {
            Some(options) => OptionsSource::Override(options),
            None => OptionsSource::Default,
        }
    }
}

/// A type-erased table entry.
pub(crate) enum Binding {
    /// A pre-built instance; holds an `Arc<T>`.
    Instance { instance: Box<dyn Any + Send + Sync> },
    /// A provider; holds a `Provider<T>`.
    Provider {
        id: u64,
        provider: Box<dyn Any + Send + Sync>,
        source: OptionsSource,
        lifetime: Lifetime,
    },
}

impl Binding {
    pub(crate) fn instance<T: Capability + ?Sized>(instance: Arc<T>) -> Self {
        Binding::Instance {
            instance: Box::new(instance),
        }
    }

    pub(crate) fn provider<T: Capability + ?Sized>(
        provider: Provider<T>,
        source: OptionsSource,
        lifetime: Lifetime,
    ) -> Self {
        Binding::Provider {
            id: next_binding_id(),
            provider: Box::new(provider),
            source,
            lifetime,
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Binding::Instance { .. } => "instance",
            Binding::Provider { .. } => "provider",
        }
    }

    /// Typed, owned view of this entry.
    pub(crate) fn view<T: Capability + ?Sized>(&self) -> Option<Bound<T>> {
        match self {
            Binding::Instance { instance } => instance
                .downcast_ref::<Arc<T>>()
                .map(|instance| Bound::Instance { instance: instance.clone() }),
            Binding::Provider { id, provider, source, lifetime } => provider
                .downcast_ref::<Provider<T>>()
                .map(|provider| Bound::Provider {
                    id: *id,
                    provider: provider.clone(),
                    source: source.clone(),
                    lifetime: *lifetime,
                }),
        }
    }
}

/// Typed copy of a binding, detached from the table.
pub(crate) enum Bound<T: ?Sized> {
    /// Returned as is; never memoized.
    Instance { instance: Arc<T> },
    Provider {
        id: u64,
        provider: Provider<T>,
        source: OptionsSource,
        lifetime: Lifetime,
    },
}

pub(crate) type BindingTable = DashMap<TypeId, Binding>;

/// Provider binding ids are never reused, so a memoized instance can tell
/// whether it was built from the current binding.
fn next_binding_id() -> u64 {
    static NEXT: AtomicU64 = AtomicU64::new(1);
    NEXT.fetch_add(1, Ordering::Relaxed)
}
