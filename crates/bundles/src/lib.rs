#![forbid(unsafe_code)]

//! Type-safe, permission-checked, observable property bundles.
//!
//! A [`Bundle`] maps [`Property`] handles to values. Each property names a
//! value type and a [`Permission`] kind; writes must present a matching
//! permission token, reads fall back to the property default, and every
//! effective change is published on [`Bundle::changed`] and pushed into any
//! live [`ReactiveValue`] for that property.
//!
//! ```
//! use bundles::prelude::*;
//!
//! let registry = PropertyRegistry::new();
//! let score: Property<i32> = registry.register_with_default("score", 0).unwrap();
//!
//! let mut bundle = create_bundle();
//! let live = bundle.get_reactive(&score).unwrap();
//! bundle.set(&Public, &score, 5).unwrap();
//! assert_eq!(live.get(), 5);
//! bundle.delete(&Public, &score).unwrap();
//! assert_eq!(live.get(), 0);
//! ```
//!
//! # Crates
//!
//! | Crate | Contents |
//! |-------|----------|
//! | `bundles-core` | properties, permissions, registry, type tags, config |
//! | `bundles-runtime` | bundles, change events, reactive values |
//! | `bundles-serde` | JSON encoding (feature `json`, on by default) |

pub mod api;
pub mod change_handlers;

pub use api::{create_bundle, create_bundle_from, create_bundle_with, init};
pub use bundles_core::{
    BundleError, BundlesConfig, DynValue, ErasedProperty, ErasedValue, LogFormat, Permission,
    PermissionKind, Property, PropertyRegistry, PropertySignature, PropertyValue, Public, TypeTag,
    runtime_type_safety, set_runtime_type_safety,
};
pub use bundles_runtime::{
    Bundle, BundleBuilder, BundleChange, BundleEntry, BundleId, EventStream, ReactiveValue,
    ReactiveVariable, Subscription,
};
#[cfg(feature = "json")]
pub use bundles_serde::{
    BundleRecord, BundleSerializer, EntryRecord, PropertyRecord, SerializeError, TypeCodecs,
    ValueCodec,
};
pub use change_handlers::{PropertyChangeHandler, PropertyChangeHandlers};

/// Common imports.
pub mod prelude {
    pub use crate::api::{create_bundle, create_bundle_from, create_bundle_with};
    pub use crate::change_handlers::PropertyChangeHandlers;
    pub use bundles_core::{
        BundleError, Permission, Property, PropertyRegistry, PropertyValue, Public,
    };
    pub use bundles_runtime::{Bundle, BundleChange, BundleEntry, ReactiveValue, Subscription};
    #[cfg(feature = "json")]
    pub use bundles_serde::{BundleSerializer, TypeCodecs};
}
