#![forbid(unsafe_code)]

//! Property descriptors.
//!
//! # Design
//!
//! A property's descriptor (signature + default) lives in one shared,
//! immutable allocation. [`ErasedProperty`] is a cheap, clonable handle to it
//! and is what bundles key their entries by. [`Property<T, P>`] adds the value
//! type `T` and permission type `P` at compile time on top of the same handle.
//!
//! Two flavours exist:
//!
//! - **type-safe**: the signature carries a [`TypeTag`]. Created through a
//!   [`PropertyRegistry`](crate::registry::PropertyRegistry), which rejects
//!   conflicting redefinitions. Writes are type-checked while runtime type
//!   safety is on.
//! - **simple**: no value type in the signature, not registered. Writes only
//!   check the permission; serialized values carry an explicit type tag.
//!
//! # Invariants
//!
//! 1. Equality and hashing use the name only.
//! 2. A descriptor never changes after construction.
//! 3. A typed `Property<T, P>` only ever wraps a descriptor whose value type
//!    (if any) is `T` and whose permission kind is `P`.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::BundleError;
use crate::permission::{Permission, PermissionKind, Public};
use crate::type_safety::runtime_type_safety;
use crate::value::{ErasedValue, PropertyValue, TypeTag};

/// The identity-relevant part of a property: name, value type, permission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySignature {
    name: String,
    value_type: Option<TypeTag>,
    permission: PermissionKind,
}

impl PropertySignature {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        value_type: Option<TypeTag>,
        permission: PermissionKind,
    ) -> Self {
        Self {
            name: name.into(),
            value_type,
            permission,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn value_type(&self) -> Option<TypeTag> {
        self.value_type
    }

    #[must_use]
    pub fn permission(&self) -> PermissionKind {
        self.permission
    }
}

impl fmt::Display for PropertySignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value_type {
            Some(ty) => write!(
                f,
                "<property: {}, type: {}, permission: {}>",
                self.name,
                ty,
                self.permission.name()
            ),
            None => write!(
                f,
                "<property: {}, permission: {}>",
                self.name,
                self.permission.name()
            ),
        }
    }
}

struct Descriptor {
    signature: PropertySignature,
    default: Option<ErasedValue>,
}

/// Type-erased handle to a property descriptor.
#[derive(Clone)]
pub struct ErasedProperty {
    descriptor: Arc<Descriptor>,
}

impl ErasedProperty {
    /// Build a descriptor without registering it.
    ///
    /// Use [`PropertyRegistry::register_erased`](crate::registry::PropertyRegistry::register_erased)
    /// for type-safe properties.
    #[must_use]
    pub fn new(signature: PropertySignature, default: Option<ErasedValue>) -> Self {
        Self {
            descriptor: Arc::new(Descriptor { signature, default }),
        }
    }

    /// A simple (untyped, unregistered) property.
    #[must_use]
    pub fn simple(
        name: impl Into<String>,
        permission: PermissionKind,
        default: Option<ErasedValue>,
    ) -> Self {
        Self::new(PropertySignature::new(name, None, permission), default)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.descriptor.signature.name()
    }

    #[must_use]
    pub fn signature(&self) -> &PropertySignature {
        &self.descriptor.signature
    }

    /// Declared value type; `None` for simple properties.
    #[must_use]
    pub fn value_type(&self) -> Option<TypeTag> {
        self.descriptor.signature.value_type()
    }

    #[must_use]
    pub fn permission(&self) -> PermissionKind {
        self.descriptor.signature.permission()
    }

    #[must_use]
    pub fn default_value(&self) -> Option<&ErasedValue> {
        self.descriptor.default.as_ref()
    }

    #[must_use]
    pub fn is_type_safe(&self) -> bool {
        self.value_type().is_some()
    }

    /// Same descriptor carrying a different default.
    #[must_use]
    pub fn with_default(&self, default: Option<ErasedValue>) -> Self {
        Self::new(self.signature().clone(), default)
    }

    /// Validate a write of `value` (`None` for a delete) by `permission`.
    ///
    /// Fails with [`BundleError::PermissionDenied`] when `permission` does not
    /// grant this property's kind, and with [`BundleError::TypeMismatch`] when
    /// the property declares a value type, runtime type safety is on, and
    /// `value` has a different type.
    pub fn check_write_access(
        &self,
        permission: &dyn Permission,
        value: Option<&ErasedValue>,
    ) -> Result<(), BundleError> {
        let required = self.permission();
        if !permission.grants(required) {
            return Err(BundleError::PermissionDenied {
                property: self.name().to_owned(),
                required,
                found: permission.kind(),
            });
        }
        if let (Some(expected), Some(value)) = (self.value_type(), value) {
            let found = value.type_tag();
            if found != expected && runtime_type_safety() {
                return Err(BundleError::TypeMismatch {
                    property: self.name().to_owned(),
                    expected,
                    found,
                });
            }
        }
        Ok(())
    }
}

impl AsRef<ErasedProperty> for ErasedProperty {
    fn as_ref(&self) -> &ErasedProperty {
        self
    }
}

impl PartialEq for ErasedProperty {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

impl Eq for ErasedProperty {}

impl Hash for ErasedProperty {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name().hash(state);
    }
}

impl fmt::Debug for ErasedProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name())
            .field("value_type", &self.value_type())
            .field("permission", &self.permission())
            .field("default", &self.default_value())
            .finish()
    }
}

impl fmt::Display for ErasedProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.signature(), f)
    }
}

/// A property holding values of type `T`, writable with permission `P`.
pub struct Property<T, P = Public> {
    erased: ErasedProperty,
    _marker: PhantomData<fn() -> (T, P)>,
}

impl<T, P> Clone for Property<T, P> {
    fn clone(&self) -> Self {
        Self {
            erased: self.erased.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: PropertyValue, P: Permission> Property<T, P> {
    /// A simple property named `name` with no default.
    #[must_use]
    pub fn simple(name: impl Into<String>) -> Self {
        Self::wrap(ErasedProperty::simple(name, PermissionKind::of::<P>(), None))
    }

    /// A simple property named `name` falling back to `default`.
    #[must_use]
    pub fn simple_with_default(name: impl Into<String>, default: T) -> Self {
        Self::wrap(ErasedProperty::simple(
            name,
            PermissionKind::of::<P>(),
            Some(ErasedValue::new(default)),
        ))
    }

    /// Recover a typed handle from an erased one.
    ///
    /// Fails with [`BundleError::ConflictingPropertyDefinition`] when the
    /// descriptor declares another value type or permission kind.
    pub fn from_erased(erased: ErasedProperty) -> Result<Self, BundleError> {
        let value_matches = erased.value_type().is_none_or(|ty| ty.is::<T>());
        if value_matches && erased.permission() == PermissionKind::of::<P>() {
            return Ok(Self::wrap(erased));
        }
        let attempted = PropertySignature::new(
            erased.name(),
            erased.value_type().map(|_| TypeTag::of::<T>()),
            PermissionKind::of::<P>(),
        );
        Err(BundleError::ConflictingPropertyDefinition {
            existing: erased.signature().clone(),
            attempted,
        })
    }

    pub(crate) fn wrap(erased: ErasedProperty) -> Self {
        Self {
            erased,
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.erased.name()
    }

    /// Typed default value.
    #[must_use]
    pub fn default_value(&self) -> Option<&T> {
        self.erased
            .default_value()
            .and_then(ErasedValue::downcast_ref::<T>)
    }

    #[must_use]
    pub fn erased(&self) -> &ErasedProperty {
        &self.erased
    }

    #[must_use]
    pub fn into_erased(self) -> ErasedProperty {
        self.erased
    }
}

impl<T, P> AsRef<ErasedProperty> for Property<T, P> {
    fn as_ref(&self) -> &ErasedProperty {
        &self.erased
    }
}

impl<T, P> PartialEq for Property<T, P> {
    fn eq(&self, other: &Self) -> bool {
        self.erased == other.erased
    }
}

impl<T, P> Eq for Property<T, P> {}

impl<T, P> Hash for Property<T, P> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.erased.hash(state);
    }
}

impl<T, P> fmt::Debug for Property<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.erased, f)
    }
}

impl<T, P> fmt::Display for Property<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.erased, f)
    }
}
