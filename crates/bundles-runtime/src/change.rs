#![forbid(unsafe_code)]

//! Bundle identity and change events.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use bundles_core::{ErasedProperty, ErasedValue, Permission, Property, PropertyValue};

/// Process-unique bundle identifier, assigned at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BundleId(u64);

impl BundleId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for BundleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bundle#{}", self.0)
    }
}

/// An effective mutation of one property of one bundle.
///
/// - `old_value` is the value that was explicitly stored before the change
///   (`None` if the property was absent; defaults are not reported here).
/// - `new_value` is the value now observable through `get`: the written value
///   for a set, the property default (if any) for a delete.
#[derive(Debug, Clone, PartialEq)]
pub struct BundleChange {
    bundle: BundleId,
    property: ErasedProperty,
    old_value: Option<ErasedValue>,
    new_value: Option<ErasedValue>,
}

impl BundleChange {
    pub(crate) fn new(
        bundle: BundleId,
        property: ErasedProperty,
        old_value: Option<ErasedValue>,
        new_value: Option<ErasedValue>,
    ) -> Self {
        Self {
            bundle,
            property,
            old_value,
            new_value,
        }
    }

    #[must_use]
    pub fn bundle(&self) -> BundleId {
        self.bundle
    }

    #[must_use]
    pub fn property(&self) -> &ErasedProperty {
        &self.property
    }

    #[must_use]
    pub fn old_value(&self) -> Option<&ErasedValue> {
        self.old_value.as_ref()
    }

    #[must_use]
    pub fn new_value(&self) -> Option<&ErasedValue> {
        self.new_value.as_ref()
    }

    /// Whether this change concerns `property` (compared by name).
    #[must_use]
    pub fn concerns<T: PropertyValue, P: Permission>(&self, property: &Property<T, P>) -> bool {
        self.property == *property.erased()
    }

    #[must_use]
    pub fn old_as<T: 'static>(&self) -> Option<&T> {
        self.old_value.as_ref().and_then(ErasedValue::downcast_ref::<T>)
    }

    #[must_use]
    pub fn new_as<T: 'static>(&self) -> Option<&T> {
        self.new_value.as_ref().and_then(ErasedValue::downcast_ref::<T>)
    }
}

impl fmt::Display for BundleChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} {:?} -> {:?}",
            self.bundle,
            self.property.name(),
            self.old_value,
            self.new_value
        )
    }
}
