//! Client registration and resolution.
//!
//! # Data Flow
//! ```text
//! startup:
//!     Container::set_default_options(OptionsRecord)
//!     ServiceBinder::bind / bind_if_absent / add_instance
//!         → BindingTable (TypeId of the capability → binding)
//!
//! first use:
//!     Container::resolve::<dyn Capability>()
//!         → binding lookup
//!         → options: override > registered default (+ service block) > built-in
//!         → ClientFactory builds the client
//!         → memoized if singleton
//! ```
//!
//! # Design Decisions
//! - Capabilities are keyed by `TypeId`, usually of a trait object
//! - One binding per capability; `bind` replaces, `bind_if_absent` never does
//! - Options are resolved lazily at first resolution, not at bind time
//! - The factory never memoizes; the container owns client identity

pub mod binder;
pub mod bindings;
pub mod capability;
pub mod container;
pub mod factory;

pub use binder::ServiceBinder;
pub use bindings::{Lifetime, OptionsSource};
pub use capability::{Capability, Provider};
pub use container::Container;
pub use factory::{ClientFactory, UnregisteredCapabilityError};
