#![forbid(unsafe_code)]

//! Property registry: the name → signature table.
//!
//! Properties are looked up purely by name, so two unrelated features that
//! picked the same name would silently share a storage slot. The registry
//! closes that hole: the first registration of a name fixes its value type
//! and permission kind, and any later registration with a different signature
//! fails at registration time.
//!
//! # Invariants
//!
//! 1. At most one signature per name.
//! 2. Registering an identical signature is idempotent and yields a property
//!    equal to the first one.
//! 3. Every permission kind used by a registered property can be resolved by
//!    name through [`PropertyRegistry::permission_kind`].
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Conflict | Same name, other value type or permission | `ConflictingPropertyDefinition` naming both signatures |
//! | Untyped signature | `register_erased` given no value type | `UntypedRegistration`, table unchanged |
//! | Poisoned lock | A thread panicked while registering | Lock is recovered; the table is never left half-written |
//!
//! # Example
//!
//! ```
//! use bundles_core::{BundleError, Property, PropertyRegistry, Public};
//!
//! let registry = PropertyRegistry::new();
//! let score: Property<i32> = registry.register_with_default("score", 0).unwrap();
//! let again: Property<i32> = registry.register("score").unwrap();
//! assert_eq!(score, again);
//!
//! let clash = registry.register::<bool, Public>("score");
//! assert!(matches!(clash, Err(BundleError::ConflictingPropertyDefinition { .. })));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::{PoisonError, RwLock};

use tracing::{debug, warn};

use crate::error::BundleError;
use crate::permission::{Permission, PermissionKind, Public};
use crate::property::{ErasedProperty, Property, PropertySignature};
use crate::value::{ErasedValue, PropertyValue, TypeTag};

/// Injectable registry of type-safe properties and known permission kinds.
///
/// `Send + Sync`; share it behind an `Arc` when several components register
/// properties.
pub struct PropertyRegistry {
    properties: RwLock<HashMap<String, ErasedProperty>>,
    permissions: RwLock<HashMap<&'static str, PermissionKind>>,
}

impl Default for PropertyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PropertyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyRegistry")
            .field("properties", &self.len())
            .field(
                "permissions",
                &self
                    .permissions
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .len(),
            )
            .finish()
    }
}

impl PropertyRegistry {
    /// An empty registry that knows the [`Public`] permission.
    #[must_use]
    pub fn new() -> Self {
        let registry = Self {
            properties: RwLock::new(HashMap::new()),
            permissions: RwLock::new(HashMap::new()),
        };
        registry.register_permission::<Public>();
        registry
    }

    /// Register (or re-intern) a type-safe property without a default.
    pub fn register<T: PropertyValue, P: Permission>(
        &self,
        name: impl Into<String>,
    ) -> Result<Property<T, P>, BundleError> {
        self.register_typed(name.into(), None)
    }

    /// Register (or re-intern) a type-safe property with a default.
    ///
    /// The returned handle carries `default` even when the name was already
    /// registered with an identical signature.
    pub fn register_with_default<T: PropertyValue, P: Permission>(
        &self,
        name: impl Into<String>,
        default: T,
    ) -> Result<Property<T, P>, BundleError> {
        self.register_typed(name.into(), Some(ErasedValue::new(default)))
    }

    fn register_typed<T: PropertyValue, P: Permission>(
        &self,
        name: String,
        default: Option<ErasedValue>,
    ) -> Result<Property<T, P>, BundleError> {
        let permission = self.register_permission::<P>();
        let signature = PropertySignature::new(name, Some(TypeTag::of::<T>()), permission);
        self.register_erased(signature, default).map(Property::wrap)
    }

    /// Register a signature.
    ///
    /// - unseen name: stored, returned as is;
    /// - identical signature: the registered descriptor is returned, or a
    ///   handle with the same identity carrying `default` when one is given;
    /// - conflicting signature: [`BundleError::ConflictingPropertyDefinition`];
    /// - no value type: [`BundleError::UntypedRegistration`]. Simple
    ///   properties live outside the registry.
    pub fn register_erased(
        &self,
        signature: PropertySignature,
        default: Option<ErasedValue>,
    ) -> Result<ErasedProperty, BundleError> {
        if signature.value_type().is_none() {
            return Err(BundleError::UntypedRegistration {
                property: signature.name().to_owned(),
            });
        }
        self.remember_permission(signature.permission());
        let mut properties = self
            .properties
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        match properties.get(signature.name()) {
            Some(existing) if existing.signature() == &signature => Ok(match default {
                Some(default) => existing.with_default(Some(default)),
                None => existing.clone(),
            }),
            Some(existing) => {
                warn!(
                    property = signature.name(),
                    existing = %existing.signature(),
                    attempted = %signature,
                    "conflicting property definition"
                );
                Err(BundleError::ConflictingPropertyDefinition {
                    existing: existing.signature().clone(),
                    attempted: signature,
                })
            }
            None => {
                debug!(property = signature.name(), signature = %signature, "property registered");
                let property = ErasedProperty::new(signature, default);
                properties.insert(property.name().to_owned(), property.clone());
                Ok(property)
            }
        }
    }

    /// The registered property called `name`.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<ErasedProperty> {
        self.properties
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Typed lookup. `Ok(None)` when unregistered; an error when the
    /// registered signature is not `(T, P)`.
    pub fn lookup_typed<T: PropertyValue, P: Permission>(
        &self,
        name: &str,
    ) -> Result<Option<Property<T, P>>, BundleError> {
        self.lookup(name).map(Property::from_erased).transpose()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.properties
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.properties
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make `P` resolvable by its serialized name.
    pub fn register_permission<P: Permission>(&self) -> PermissionKind {
        let kind = PermissionKind::of::<P>();
        self.remember_permission(kind);
        kind
    }

    fn remember_permission(&self, kind: PermissionKind) {
        self.permissions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(kind.name())
            .or_insert(kind);
    }

    /// Resolve a serialized permission name.
    #[must_use]
    pub fn permission_kind(&self, name: &str) -> Option<PermissionKind> {
        self.permissions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct ReadOnly;
    impl Permission for ReadOnly {}

    #[test]
    fn registers_new_names() {
        let registry = PropertyRegistry::new();
        assert!(registry.is_empty());
        let p: Property<i32> = registry.register("test-property").unwrap();
        assert_eq!(p.name(), "test-property");
        assert!(registry.contains("test-property"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup("test-property").unwrap(), *p.erased());
    }

    #[test]
    fn identical_signature_is_idempotent() {
        let registry = PropertyRegistry::new();
        let a: Property<String> = registry.register("name").unwrap();
        let b: Property<String> = registry.register("name").unwrap();
        assert_eq!(a, b);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn different_value_type_conflicts() {
        let registry = PropertyRegistry::new();
        let _: Property<i32> = registry.register("p").unwrap();
        let err = registry.register::<bool, Public>("p").unwrap_err();
        match err {
            BundleError::ConflictingPropertyDefinition {
                existing,
                attempted,
            } => {
                assert_eq!(existing.value_type(), Some(TypeTag::of::<i32>()));
                assert_eq!(attempted.value_type(), Some(TypeTag::of::<bool>()));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn different_permission_conflicts() {
        let registry = PropertyRegistry::new();
        let _: Property<i32> = registry.register("p").unwrap();
        let err = registry.register::<i32, ReadOnly>("p").unwrap_err();
        assert!(matches!(
            err,
            BundleError::ConflictingPropertyDefinition { .. }
        ));
    }

    #[test]
    fn conflict_leaves_first_registration_in_place() {
        let registry = PropertyRegistry::new();
        let _: Property<i32> = registry.register_with_default("p", 7).unwrap();
        let _ = registry.register::<bool, Public>("p");
        let kept = registry.lookup("p").unwrap();
        assert_eq!(kept.value_type(), Some(TypeTag::of::<i32>()));
        assert_eq!(kept.default_value(), Some(&ErasedValue::new(7)));
    }

    #[test]
    fn reintern_keeps_or_replaces_default() {
        let registry = PropertyRegistry::new();
        let first: Property<i32> = registry.register_with_default("score", 0).unwrap();
        let plain: Property<i32> = registry.register("score").unwrap();
        assert_eq!(plain.default_value(), Some(&0));
        let other: Property<i32> = registry.register_with_default("score", 10).unwrap();
        assert_eq!(other.default_value(), Some(&10));
        assert_eq!(first, other);
        // The table still holds the first descriptor.
        assert_eq!(
            registry.lookup("score").unwrap().default_value(),
            Some(&ErasedValue::new(0))
        );
    }

    #[test]
    fn permissions_resolve_by_name() {
        let registry = PropertyRegistry::new();
        let public = PermissionKind::of::<Public>();
        assert_eq!(registry.permission_kind(public.name()), Some(public));

        let read_only = PermissionKind::of::<ReadOnly>();
        assert_eq!(registry.permission_kind(read_only.name()), None);
        let _: Property<u8, ReadOnly> = registry.register("guarded").unwrap();
        assert_eq!(registry.permission_kind(read_only.name()), Some(read_only));
    }

    #[test]
    fn untyped_signature_is_rejected() {
        let registry = PropertyRegistry::new();
        let simple = ErasedProperty::simple("loose", PermissionKind::of::<ReadOnly>(), None);
        let err = registry
            .register_erased(simple.signature().clone(), None)
            .unwrap_err();
        assert_eq!(
            err,
            BundleError::UntypedRegistration {
                property: "loose".into()
            }
        );
        assert_eq!(err.property(), Some("loose"));
        assert!(registry.is_empty());
        assert_eq!(
            registry.permission_kind(PermissionKind::of::<ReadOnly>().name()),
            None
        );
        let _: Property<bool> = registry.register("loose").unwrap();
    }

    #[test]
    fn typed_lookup() {
        let registry = PropertyRegistry::new();
        assert!(registry.lookup_typed::<i32, Public>("n").unwrap().is_none());
        let _: Property<i32> = registry.register("n").unwrap();
        assert!(registry.lookup_typed::<i32, Public>("n").unwrap().is_some());
        assert!(registry.lookup_typed::<u32, Public>("n").is_err());
    }

    #[test]
    fn shared_across_threads() {
        let registry = Arc::new(PropertyRegistry::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    let _: Property<u64> = registry.register("shared").unwrap();
                    let _: Property<u64> = registry.register(format!("own-{i}")).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.len(), 5);
    }
}
